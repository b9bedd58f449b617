use {
    anyhow::{Context, Error, anyhow, bail, ensure},
    arguments::Arguments,
    bitcoin::{
        BlockHash, CompactTarget, Target, TxMerkleNode,
        block::{self, Header},
        hashes::{Hash, sha256d},
    },
    byteorder::{BigEndian, ByteOrder, LittleEndian},
    clap::Parser,
    derive_more::Display,
    hash_rate::HashRate,
    hex::FromHex,
    miner::Miner,
    options::Options,
    serde::{
        Deserialize, Serialize, Serializer,
        de::{self, Deserializer},
        ser::SerializeSeq,
    },
    serde_json::Value,
    serde_with::{DeserializeFromStr, SerializeDisplay},
    std::{
        collections::BTreeMap,
        env,
        fmt::{self, Formatter},
        io::{self, Write},
        process,
        str::FromStr,
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::{Duration, Instant},
    },
    sysinfo::System,
    tokio::{
        io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter},
        net::TcpStream,
        runtime::Runtime,
        signal::ctrl_c,
        sync::{broadcast, mpsc, oneshot, watch},
        task::{self, JoinSet},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
    tracing_subscriber::EnvFilter,
};

mod arguments;
pub mod hash_rate;
pub mod miner;
mod options;
pub mod stratum;

pub const USER_AGENT: &str = concat!("pyrite/", env!("CARGO_PKG_VERSION"));

type Result<T = (), E = Error> = std::result::Result<T, E>;

fn integration_test() -> bool {
    env::var_os("PYRITE_INTEGRATION_TEST")
        .map(|val| val == "1")
        .unwrap_or_default()
}

fn logs_enabled() -> bool {
    env::var_os("RUST_LOG").is_some()
}

pub fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Arguments::parse();

    match args.run() {
        Err(err) => {
            eprintln!("error: {err}");

            if env::var_os("RUST_BACKTRACE")
                .map(|val| val == "1")
                .unwrap_or_default()
            {
                eprintln!("{}", err.backtrace());
            }
            process::exit(1);
        }
        Ok(_) => {
            process::exit(0);
        }
    }
}
