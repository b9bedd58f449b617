use super::*;

mod authorize;
mod client;
mod difficulty;
mod error;
mod event;
mod extranonce;
mod job_id;
mod merkle;
mod message;
mod nbits;
mod nonce;
mod notify;
mod ntime;
mod prevhash;
mod set_difficulty;
mod submit;
mod subscribe;
mod version;

pub use {
    authorize::Authorize,
    client::{Client, ClientConfig, ClientError, EventReceiver},
    difficulty::Difficulty,
    error::JsonRpcError,
    event::Event,
    extranonce::{Extranonce, ExtranonceCounter},
    job_id::JobId,
    merkle::{MerkleNode, merkle_root},
    message::{Id, Message},
    nbits::Nbits,
    nonce::Nonce,
    notify::Notify,
    ntime::Ntime,
    prevhash::PrevHash,
    set_difficulty::SetDifficulty,
    submit::Submit,
    subscribe::{Subscribe, SubscribeResult},
    version::Version,
};
