use super::*;

pub(crate) const DEFAULT_ENDPOINT: &str = "solo.ckpool.org:3333";
pub(crate) const DEFAULT_USERNAME: &str = "bc1qhl452zcq3ng5kzajzkx9jnzncml9tnsk3w96s6.pyrite";
pub(crate) const DEFAULT_PASSWORD: &str = "x";

#[derive(Clone, Debug, Parser)]
pub struct Options {
    #[arg(help = "Connect to Stratum pool at <ENDPOINT>.", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    #[arg(long, help = "Authorize as <USERNAME>.", default_value = DEFAULT_USERNAME)]
    pub username: String,

    #[arg(long, help = "Authorize with <PASSWORD>.", default_value = DEFAULT_PASSWORD)]
    pub password: String,

    #[arg(long, help = "Number of <CPU_CORES> to hash on. [default: all]")]
    pub cpu_cores: Option<usize>,

    #[arg(long, help = "Exit after the first submitted share.")]
    pub once: bool,
}
