use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::contracts::{ITEM_CONTRACT, MARKETPLACE_CONTRACT};

#[derive(Parser)]
#[command(
	name = "nft-market",
	about = "Operator scripts for the NFT marketplace contracts.",
	version
)]
pub struct Cli {
	/// Network name (e.g. localhost, goerli). Defaults to the name
	/// configured for the node's chain id.
	#[arg(long, global = true)]
	pub network: Option<String>,

	/// Chain id of the active network. Asked from the node when omitted.
	#[arg(long, global = true)]
	pub chain_id: Option<u64>,

	/// Override RPC endpoint URL.
	#[arg(long, global = true)]
	pub rpc_url: Option<String>,

	/// Override the hardhat-deploy deployments directory.
	#[arg(long, global = true)]
	pub deployments: Option<PathBuf>,

	/// TOML network table to use instead of the built-in one.
	#[arg(long, global = true)]
	pub networks: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
	/// Buy a listed item from the marketplace at its listing price.
	Buy {
		/// Token id of the item to buy.
		#[arg(long, default_value_t = crate::commands::buy::DEFAULT_ITEM_ID)]
		item_id: u64,

		/// Deployment name of the marketplace contract.
		#[arg(long, default_value = MARKETPLACE_CONTRACT)]
		marketplace: String,

		/// Deployment name of the item (NFT) contract.
		#[arg(long, default_value = ITEM_CONTRACT)]
		item_contract: String,
	},

	/// Mine blocks on a local development node.
	Mine {
		/// Number of blocks to mine.
		#[arg(long, default_value_t = 2)]
		blocks: u64,

		/// Pause between blocks, in milliseconds.
		#[arg(long, default_value_t = 1000)]
		sleep_ms: u64,
	},

	/// Inspect network parameters.
	Network {
		#[command(subcommand)]
		command: NetworkCommand,
	},
}

// -- Network subcommands --

#[derive(Subcommand)]
pub enum NetworkCommand {
	/// Show the parameters resolved for the active chain id.
	Show,

	/// List every chain id with an explicit entry.
	List,
}
