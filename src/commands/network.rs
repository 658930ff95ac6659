use anyhow::Result;

use crate::cli::{Cli, NetworkCommand};
use crate::commands::{connect, requested_network, resolve_registry};
use crate::config::Config;
use crate::network::{
	ActiveNetwork, NetworkParameters, NetworkRegistry, FRONT_END_EXPORT_PATHS,
	VERIFICATION_BLOCK_CONFIRMATIONS,
};

pub async fn run(cli: &Cli, cmd: &NetworkCommand) -> Result<()> {
	match cmd {
		NetworkCommand::Show => show(cli).await,
		NetworkCommand::List => {
			let config = Config::load()?;
			list(&resolve_registry(cli, &config)?);
			Ok(())
		}
	}
}

/// Print the record for the active chain id. Only contacts the node when
/// `--chain-id` is not given.
async fn show(cli: &Cli) -> Result<()> {
	let (registry, network) = match cli.chain_id {
		Some(chain_id) => {
			let config = Config::load()?;
			let registry = resolve_registry(cli, &config)?;
			let network = match requested_network(cli, &config) {
				Some(name) => ActiveNetwork::new(chain_id, name),
				None => ActiveNetwork::from_registry(&registry, chain_id),
			};
			(registry, network)
		}
		None => {
			let session = connect(cli).await?;
			(session.registry, session.network)
		}
	};

	let params = registry.resolve(network.chain_id);
	println!("Network:            {} (chain id {})", network.name, network.chain_id);
	println!(
		"Development chain:  {}",
		if registry.is_development_network(&network.name) { "yes" } else { "no" }
	);
	print_parameters(params);
	println!("Verification confs: {VERIFICATION_BLOCK_CONFIRMATIONS}");
	println!("Front-end exports:");
	for path in [
		FRONT_END_EXPORT_PATHS.contracts_file,
		FRONT_END_EXPORT_PATHS.contracts_file_graph,
		FRONT_END_EXPORT_PATHS.abi_location,
		FRONT_END_EXPORT_PATHS.abi_location_graph,
	] {
		println!("  {path}");
	}
	Ok(())
}

fn list(registry: &NetworkRegistry) {
	for chain_id in registry.chain_ids() {
		println!("{chain_id:>10}  {}", registry.resolve(chain_id).name);
	}
	println!("{:>10}  {}", "default", registry.default_parameters().name);

	let dev: Vec<&str> = registry.development_chains().iter().collect();
	println!("\nDevelopment chains: {}", dev.join(", "));
}

fn print_parameters(params: &NetworkParameters) {
	let optional = |v: &Option<String>| v.clone().unwrap_or_else(|| "(not configured)".into());

	println!("Parameters:         {}", params.name);
	println!("  Keepers interval: {}s", params.keepers_update_interval);
	println!("  Subscription id:  {}", optional(&params.subscription_id));
	println!("  ETH/USD feed:     {}", optional(&params.eth_usd_price_feed));
	println!("  Gas lane:         {}", optional(&params.gas_lane));
	println!("  Entrance fee:     {}", optional(&params.raffle_entrance_fee));
	println!("  Callback gas:     {}", optional(&params.callback_gas_limit));
}
