use {
    super::*,
    controller::Controller,
    hasher::Hasher,
    metrics::Metrics,
    stratum::{
        Client, ClientConfig, Difficulty, Event, EventReceiver, Extranonce, ExtranonceCounter,
        JobId, Nonce, Notify, Ntime,
    },
};

mod controller;
mod hasher;
mod metrics;

/// A header candidate found by a worker, on its way from the hash loop to
/// the session for submission.
#[derive(Debug)]
pub(crate) struct Solution {
    pub(crate) worker: usize,
    pub(crate) job_id: JobId,
    pub(crate) extranonce2: Extranonce,
    pub(crate) header: Header,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Share {
    pub extranonce1: Extranonce,
    pub extranonce2: Extranonce,
    pub job_id: JobId,
    pub nonce: Nonce,
    pub ntime: Ntime,
    pub username: String,
}

pub(crate) struct Miner;

impl Miner {
    pub(crate) async fn run(options: Options, cancel: CancellationToken) -> Result {
        let mut system = System::new();
        system.refresh_cpu_all();
        let available_cpu_cores = system.cpus().len().max(1);

        let cpu_cores = options
            .cpu_cores
            .map(|cores| cores.clamp(1, available_cpu_cores))
            .unwrap_or(available_cpu_cores);

        if !integration_test() && !logs_enabled() {
            println!(
                "{USER_AGENT} mining to {} as {} on {cpu_cores} cores",
                options.endpoint, options.username
            );
        }

        info!(
            "{USER_AGENT} connecting to {} as {}",
            options.endpoint, options.username
        );
        info!("Available CPU cores: {available_cpu_cores}");
        info!("CPU cores to use: {cpu_cores}");

        let config = ClientConfig {
            address: options.endpoint,
            username: options.username,
            password: Some(options.password),
            timeout: Duration::from_secs(10),
        };

        let client = Client::new(config);

        let shares = Controller::run(client, cpu_cores, options.once, cancel).await?;

        println!("{}", serde_json::to_string_pretty(&shares)?);

        Ok(())
    }
}
