use appkit::setup::{setup_sentry, setup_tracing};
use clap::Parser;
use commands::Command;

pub use appkit::Result;

mod commands;

mod http_server;

pub mod shopping_list;
pub mod state;
pub(crate) use state::{AppConfig, AppState};

#[derive(Parser)]
#[command(author, version, about)]
struct CliArgs {
    #[clap(subcommand)]
    command: Option<Command>,
}

fn main() -> Result<()> {
    let _sentry_guard = setup_sentry();

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()?
        .block_on(async { _main().await })
}

async fn _main() -> Result<()> {
    setup_tracing("server")?;

    let cli = CliArgs::parse();
    let command = cli.command.unwrap_or_default();

    command.run().await
}
