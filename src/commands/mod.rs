pub mod buy;
pub mod mine;
pub mod network;

use std::time::Duration;

use anyhow::{Context, Result};

use crate::cli::Cli;
use crate::config::Config;
use crate::contracts::Deployments;
use crate::network::{ActiveNetwork, NetworkRegistry};
use crate::rpc::EthersClient;

/// Receipt polling interval; the provider's default suits public chains
/// but makes local nodes feel stalled.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Everything a chain-facing command needs, resolved once per run.
pub struct Session {
	pub registry: NetworkRegistry,
	pub network: ActiveNetwork,
	pub client: EthersClient,
}

/// Load the network table from `--networks`, the config file, or the
/// built-in project table, in that order.
pub fn resolve_registry(cli: &Cli, config: &Config) -> Result<NetworkRegistry> {
	match cli.networks.as_ref().or(config.network.table.as_ref()) {
		Some(path) => NetworkRegistry::load(path)
			.with_context(|| format!("loading network table {}", path.display())),
		None => Ok(NetworkRegistry::builtin()),
	}
}

/// Network name given on the command line or in config, if any.
pub(crate) fn requested_network(cli: &Cli, config: &Config) -> Option<String> {
	cli.network.clone().or_else(|| config.network.default.clone())
}

/// Resolve the RPC URL from CLI flag or config.
pub fn resolve_rpc(cli: &Cli, config: &Config, network: Option<&str>) -> String {
	cli.rpc_url
		.clone()
		.unwrap_or_else(|| config.rpc_url(network.unwrap_or("localhost")).to_owned())
}

/// Resolve the active network without talking to a node when possible.
pub async fn resolve_network(
	cli: &Cli,
	config: &Config,
	registry: &NetworkRegistry,
	client: &EthersClient,
) -> Result<ActiveNetwork> {
	let chain_id = match cli.chain_id {
		Some(id) => id,
		None => client.chain_id().await.context("asking the node for its chain id")?,
	};
	Ok(match requested_network(cli, config) {
		Some(name) => ActiveNetwork::new(chain_id, name),
		None => ActiveNetwork::from_registry(registry, chain_id),
	})
}

/// Connect to the node and work out which network it is.
pub async fn connect(cli: &Cli) -> Result<Session> {
	let config = Config::load()?;
	let registry = resolve_registry(cli, &config)?;
	let requested = requested_network(cli, &config);

	let rpc_url = resolve_rpc(cli, &config, requested.as_deref());
	let deployments = Deployments::new(
		cli.deployments
			.clone()
			.unwrap_or_else(|| config.deployments.dir.clone()),
	);
	let client = EthersClient::new(&rpc_url, deployments, requested.as_deref().unwrap_or_default())
		.with_context(|| format!("invalid RPC URL {rpc_url}"))?;

	let network = resolve_network(cli, &config, &registry, &client).await?;
	let mut client = client
		.with_network(&network.name)
		.with_poll_interval(POLL_INTERVAL);
	if let Some(key) = Config::private_key() {
		client = client.with_private_key(&key, network.chain_id)?;
	}

	tracing::info!(
		network = %network.name,
		chain_id = network.chain_id,
		rpc = %rpc_url,
		"connected"
	);

	Ok(Session {
		registry,
		network,
		client,
	})
}
