use anyhow::Context as _;
use beach_tail::app;
use beach_tail::cli::Cli;
use beach_tail::telemetry::logging;
use beach_tail::transport::SseTransport;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    logging::init(&cli.logging.to_config(cli.plain)).context("logging initialization failed")?;
    let config = cli.stream_config()?;
    let transport = SseTransport::new(Some(cli.origin.clone()), cli.retry());

    if cli.plain {
        app::run_plain(transport, config).await?;
    } else {
        app::run_tui(transport, config).await?;
    }
    Ok(())
}
