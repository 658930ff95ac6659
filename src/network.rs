//! Per-network parameters for the marketplace and raffle contracts.
//!
//! A [`NetworkRegistry`] is built once at start-up (either the built-in
//! project table or one loaded from TOML) and handed to whatever needs it.
//! Lookups by chain id never fail: ids without an explicit entry resolve to
//! the `default` record.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Confirmations to await before a contract verification step is safe.
pub const VERIFICATION_BLOCK_CONFIRMATIONS: usize = 6;

/// Where generated address maps and ABIs are written for the front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactExportPaths {
	pub contracts_file: &'static str,
	pub contracts_file_graph: &'static str,
	pub abi_location: &'static str,
	pub abi_location_graph: &'static str,
}

pub const FRONT_END_EXPORT_PATHS: ArtifactExportPaths = ArtifactExportPaths {
	contracts_file: "../nextjs-nft-marketplace-moralis-fcc/constants/networkMapping.json",
	contracts_file_graph: "../graph-nft-marketplace-fcc/constants/networkMapping.json",
	abi_location: "../nextjs-nft-marketplace-moralis-fcc/constants/",
	abi_location_graph: "../graph-nft-marketplace-fcc/constants/",
};

/// Parameters for one network. Optional fields are left out entirely for
/// networks that do not use them; read them through the typed accessors,
/// which distinguish "absent" from "present but unparsable".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParameters {
	pub name: String,
	/// Seconds, string-encoded.
	pub keepers_update_interval: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subscription_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub eth_usd_price_feed: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub gas_lane: Option<String>,
	/// Smallest currency unit, string-encoded to keep full precision.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub raffle_entrance_fee: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub callback_gas_limit: Option<String>,
}

impl NetworkParameters {
	fn minimal(name: &str, interval: &str) -> Self {
		Self {
			name: name.into(),
			keepers_update_interval: interval.into(),
			subscription_id: None,
			eth_usd_price_feed: None,
			gas_lane: None,
			raffle_entrance_fee: None,
			callback_gas_limit: None,
		}
	}

	pub fn keepers_update_interval(&self) -> Result<Duration, ConfigError> {
		let secs: u64 = self.parse("keepers_update_interval", &self.keepers_update_interval)?;
		Ok(Duration::from_secs(secs))
	}

	pub fn subscription_id(&self) -> Result<u64, ConfigError> {
		let raw = self.require("subscription_id", &self.subscription_id)?;
		self.parse("subscription_id", raw)
	}

	pub fn eth_usd_price_feed(&self) -> Result<Address, ConfigError> {
		let raw = self.require("eth_usd_price_feed", &self.eth_usd_price_feed)?;
		self.parse("eth_usd_price_feed", raw)
	}

	pub fn gas_lane(&self) -> Result<H256, ConfigError> {
		let raw = self.require("gas_lane", &self.gas_lane)?;
		self.parse("gas_lane", raw)
	}

	/// Entrance fee in wei. Parsed as a 256-bit decimal, so values beyond
	/// `u64` survive intact.
	pub fn entrance_fee(&self) -> Result<U256, ConfigError> {
		let raw = self.require("raffle_entrance_fee", &self.raffle_entrance_fee)?;
		U256::from_dec_str(raw).map_err(|_| self.invalid("raffle_entrance_fee", raw))
	}

	pub fn callback_gas_limit(&self) -> Result<u64, ConfigError> {
		let raw = self.require("callback_gas_limit", &self.callback_gas_limit)?;
		self.parse("callback_gas_limit", raw)
	}

	fn require<'a>(
		&self,
		field: &'static str,
		value: &'a Option<String>,
	) -> Result<&'a str, ConfigError> {
		value.as_deref().ok_or_else(|| ConfigError::MissingField {
			network: self.name.clone(),
			field,
		})
	}

	fn parse<T: std::str::FromStr>(&self, field: &'static str, raw: &str) -> Result<T, ConfigError> {
		raw.parse().map_err(|_| self.invalid(field, raw))
	}

	fn invalid(&self, field: &'static str, raw: &str) -> ConfigError {
		ConfigError::InvalidField {
			network: self.name.clone(),
			field,
			value: raw.to_owned(),
		}
	}
}

/// Network names treated as local, ephemeral chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevelopmentChains(BTreeSet<String>);

impl DevelopmentChains {
	pub fn new<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self(names.into_iter().map(Into::into).collect())
	}

	pub fn contains(&self, name: &str) -> bool {
		self.0.contains(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}
}

impl Default for DevelopmentChains {
	fn default() -> Self {
		Self::new(["hardhat", "localhost"])
	}
}

/// Immutable chain-id → parameters table with a mandatory default record.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
	default: NetworkParameters,
	networks: BTreeMap<u64, NetworkParameters>,
	development_chains: DevelopmentChains,
}

/// On-disk shape of a network table.
#[derive(Debug, Deserialize)]
struct NetworkTable {
	#[serde(default)]
	development_chains: Option<Vec<String>>,
	networks: BTreeMap<String, NetworkParameters>,
}

impl NetworkRegistry {
	pub fn new(
		default: NetworkParameters,
		networks: BTreeMap<u64, NetworkParameters>,
		development_chains: DevelopmentChains,
	) -> Self {
		Self {
			default,
			networks,
			development_chains,
		}
	}

	/// The marketplace project's own table.
	pub fn builtin() -> Self {
		let gas_lane_30_gwei = "0x79d3d8832d904592c0bf9818b621522c988bb8b0c05cdc3b15aea1b6e8db0c15";

		let mut networks = BTreeMap::new();
		networks.insert(
			31337,
			NetworkParameters {
				name: "localhost".into(),
				keepers_update_interval: "30".into(),
				subscription_id: Some("588".into()),
				eth_usd_price_feed: Some("0x9326BFA02ADD2366b30bacB125260Af641031331".into()),
				gas_lane: Some(gas_lane_30_gwei.into()),
				raffle_entrance_fee: Some("100000000000000000".into()),
				callback_gas_limit: Some("500000000".into()),
			},
		);
		networks.insert(
			5,
			NetworkParameters {
				name: "goerli".into(),
				keepers_update_interval: "30".into(),
				subscription_id: Some("9518".into()),
				eth_usd_price_feed: None,
				gas_lane: Some(gas_lane_30_gwei.into()),
				raffle_entrance_fee: Some("100000000000000000".into()),
				callback_gas_limit: Some("500000".into()),
			},
		);
		networks.insert(1, NetworkParameters::minimal("mainnet", "30"));

		Self::new(
			NetworkParameters::minimal("hardhat", "30"),
			networks,
			DevelopmentChains::default(),
		)
	}

	/// Parse a table such as:
	///
	/// ```toml
	/// development_chains = ["hardhat", "localhost"]
	///
	/// [networks.default]
	/// name = "hardhat"
	/// keepers_update_interval = "30"
	///
	/// [networks.31337]
	/// name = "localhost"
	/// keepers_update_interval = "30"
	/// raffle_entrance_fee = "100000000000000000"
	/// ```
	///
	/// When `development_chains` is omitted the standard set is used.
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		let table: NetworkTable = toml::from_str(content)?;

		let mut default = None;
		let mut networks = BTreeMap::new();
		for (key, params) in table.networks {
			if key == "default" {
				default = Some(params);
				continue;
			}
			let chain_id = key
				.parse::<u64>()
				.map_err(|_| ConfigError::InvalidNetworkKey(key.clone()))?;
			networks.insert(chain_id, params);
		}

		let development_chains = table
			.development_chains
			.map(DevelopmentChains::new)
			.unwrap_or_default();

		Ok(Self::new(
			default.ok_or(ConfigError::MissingDefault)?,
			networks,
			development_chains,
		))
	}

	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)?;
		Self::from_toml_str(&content)
	}

	/// Record for `chain_id`, or the default record when there is none.
	pub fn resolve(&self, chain_id: u64) -> &NetworkParameters {
		self.networks.get(&chain_id).unwrap_or(&self.default)
	}

	pub fn default_parameters(&self) -> &NetworkParameters {
		&self.default
	}

	/// Exact, case-sensitive membership test.
	pub fn is_development_network(&self, name: &str) -> bool {
		self.development_chains.contains(name)
	}

	pub fn development_chains(&self) -> &DevelopmentChains {
		&self.development_chains
	}

	pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
		self.networks.keys().copied()
	}
}

/// The network a script is running against, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveNetwork {
	pub chain_id: u64,
	pub name: String,
}

impl ActiveNetwork {
	pub fn new(chain_id: u64, name: impl Into<String>) -> Self {
		Self {
			chain_id,
			name: name.into(),
		}
	}

	/// Name the network after its resolved record.
	pub fn from_registry(registry: &NetworkRegistry, chain_id: u64) -> Self {
		Self::new(chain_id, registry.resolve(chain_id).name.clone())
	}
}
