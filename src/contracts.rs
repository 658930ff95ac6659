use std::path::PathBuf;

use ethers::abi::Abi;
use ethers::types::Address;
use serde::Deserialize;

use crate::error::ChainError;

/// Contract names used by the marketplace deploy scripts.
pub const MARKETPLACE_CONTRACT: &str = "NftMarketplace";
pub const ITEM_CONTRACT: &str = "BasicNft";

/// A deployed contract on the active network.
#[derive(Debug, Clone)]
pub struct ContractHandle {
	pub name: String,
	pub address: Address,
	pub abi: Abi,
}

/// The subset of a hardhat-deploy artifact we need.
#[derive(Deserialize)]
struct DeploymentArtifact {
	address: Address,
	abi: Abi,
}

/// Deployment records written by `hardhat deploy`, laid out as
/// `<root>/<network>/<ContractName>.json`.
#[derive(Debug, Clone)]
pub struct Deployments {
	root: PathBuf,
}

impl Deployments {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn artifact_path(&self, network: &str, name: &str) -> PathBuf {
		self.root.join(network).join(format!("{name}.json"))
	}

	/// Load the handle for `name` as deployed on `network`.
	pub fn get(&self, network: &str, name: &str) -> Result<ContractHandle, ChainError> {
		let path = self.artifact_path(network, name);
		if !path.exists() {
			return Err(ChainError::ContractNotFound {
				name: name.to_owned(),
				network: network.to_owned(),
			});
		}

		let invalid = |reason: String| ChainError::InvalidDeployment {
			name: name.to_owned(),
			reason,
		};
		let content = std::fs::read_to_string(&path)
			.map_err(|e| invalid(format!("{}: {e}", path.display())))?;
		let artifact: DeploymentArtifact =
			serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;

		Ok(ContractHandle {
			name: name.to_owned(),
			address: artifact.address,
			abi: artifact.abi,
		})
	}
}
