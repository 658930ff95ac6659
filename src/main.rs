use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nft_market::cli::{Cli, Command};
use nft_market::commands;

#[tokio::main]
async fn main() -> ExitCode {
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "nft_market=info".into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	let cli = Cli::parse();

	let result = match &cli.command {
		Command::Buy {
			item_id,
			marketplace,
			item_contract,
		} => commands::buy::run(&cli, marketplace, item_contract, *item_id).await,
		Command::Mine { blocks, sleep_ms } => commands::mine::run(&cli, *blocks, *sleep_ms).await,
		Command::Network { command } => commands::network::run(&cli, command).await,
	};

	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			tracing::error!("{e:#}");
			ExitCode::from(1)
		}
	}
}
