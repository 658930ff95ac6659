use std::time::Duration;

use anyhow::Result;

use crate::cli::Cli;
use crate::commands::connect;
use crate::mining::BlockAdvancer;

pub async fn run(cli: &Cli, blocks: u64, sleep_ms: u64) -> Result<()> {
	let session = connect(cli).await?;
	if !session.registry.is_development_network(&session.network.name) {
		anyhow::bail!(
			"{} is not a development network; refusing to mine blocks",
			session.network.name
		);
	}

	session
		.client
		.advance(blocks, Duration::from_millis(sleep_ms))
		.await?;
	println!("Mined {blocks} block(s) on {}", session.network.name);
	Ok(())
}
