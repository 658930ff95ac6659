use thiserror::Error;

/// Problems with the network parameter table or a field read from it.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("network {network} has no {field} configured")]
	MissingField {
		network: String,
		field: &'static str,
	},

	#[error("network {network} has an invalid {field}: {value}")]
	InvalidField {
		network: String,
		field: &'static str,
		value: String,
	},

	#[error("network table has no `default` entry")]
	MissingDefault,

	#[error("network key `{0}` is neither `default` nor a chain id")]
	InvalidNetworkKey(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),
}

/// Failures surfaced by the chain client and its collaborators.
#[derive(Debug, Error)]
pub enum ChainError {
	#[error("contract {name} is not deployed on network {network}")]
	ContractNotFound { name: String, network: String },

	#[error("deployment artifact for {name} is unusable: {reason}")]
	InvalidDeployment { name: String, reason: String },

	#[error("transaction reverted: {0}")]
	TransactionReverted(String),

	#[error("block advancement failed: {0}")]
	CollaboratorFailure(String),

	#[error("call to {method} failed: {reason}")]
	Call { method: String, reason: String },

	#[error("unexpected return value from {method}: {reason}")]
	Decode { method: String, reason: String },
}
