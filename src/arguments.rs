use {
    super::*,
    clap::builder::styling::{AnsiColor, Effects, Styles},
};

#[derive(Debug, Parser)]
#[command(
  version,
  about = "Solo CPU Stratum v1 Bitcoin miner",
  styles = Styles::styled()
    .error(AnsiColor::Red.on_default() | Effects::BOLD)
    .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
    .invalid(AnsiColor::Red.on_default())
    .literal(AnsiColor::Blue.on_default())
    .placeholder(AnsiColor::Cyan.on_default())
    .usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
    .valid(AnsiColor::Green.on_default()),
)]
pub(crate) struct Arguments {
    #[command(flatten)]
    pub(crate) options: Options,
}

impl Arguments {
    pub(crate) fn run(self) -> Result {
        Runtime::new()?.block_on(async {
            let cancel = CancellationToken::new();

            let signal_cancel = cancel.clone();
            tokio::spawn(async move {
                if ctrl_c().await.is_ok() {
                    info!("Received interrupt, shutting down");
                    signal_cancel.cancel();
                }
            });

            Miner::run(self.options, cancel).await
        })
    }
}
