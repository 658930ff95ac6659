use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const LOCALHOST_RPC: &str = "http://127.0.0.1:8545";

/// Environment variable holding the signing key, if any.
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub network: NetworkConfig,
	#[serde(default)]
	pub deployments: DeploymentsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
	/// Network name used when `--network` is not given and the node's
	/// chain id has no better name.
	pub default: Option<String>,
	/// RPC endpoint per network name.
	#[serde(default)]
	pub rpc: BTreeMap<String, String>,
	/// Optional TOML network table replacing the built-in one.
	#[serde(default)]
	pub table: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentsConfig {
	/// Root of the hardhat-deploy `deployments/` directory.
	pub dir: PathBuf,
}

impl Default for NetworkConfig {
	fn default() -> Self {
		let mut rpc = BTreeMap::new();
		rpc.insert("hardhat".to_owned(), LOCALHOST_RPC.to_owned());
		rpc.insert("localhost".to_owned(), LOCALHOST_RPC.to_owned());

		Self {
			default: None,
			rpc,
			table: None,
		}
	}
}

impl Default for DeploymentsConfig {
	fn default() -> Self {
		Self {
			dir: PathBuf::from("deployments"),
		}
	}
}

impl Config {
	/// Directory where CLI state is stored (~/.nft-market/).
	pub fn dir() -> anyhow::Result<PathBuf> {
		let home = dirs::home_dir().context("could not determine home directory")?;
		Ok(home.join(".nft-market"))
	}

	/// Path to the config file.
	pub fn path() -> anyhow::Result<PathBuf> {
		Ok(Self::dir()?.join("config.toml"))
	}

	/// Load config from disk, falling back to defaults if no file exists.
	pub fn load() -> anyhow::Result<Self> {
		let path = Self::path()?;
		if path.exists() {
			let content = std::fs::read_to_string(&path)
				.with_context(|| format!("reading {}", path.display()))?;
			Ok(toml::from_str(&content)?)
		} else {
			Ok(Self::default())
		}
	}

	/// Return the RPC URL for the given network name.
	pub fn rpc_url(&self, network: &str) -> &str {
		self.network
			.rpc
			.get(network)
			.map(String::as_str)
			.unwrap_or(LOCALHOST_RPC)
	}

	/// Signing key from the environment (or `.env`), if one is set.
	pub fn private_key() -> Option<String> {
		dotenvy::dotenv().ok();
		std::env::var(PRIVATE_KEY_ENV)
			.ok()
			.filter(|k| !k.trim().is_empty())
	}
}
