use std::time::Duration;

use ethers::abi::{Function, Token};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, PendingTransaction, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionRequest, TxHash, U256, U64};

use crate::contracts::{ContractHandle, Deployments};
use crate::error::ChainError;

/// Outcome of a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
	pub tx_hash: TxHash,
	pub block_number: Option<u64>,
}

/// Everything a script needs from the chain, scoped to the active network.
///
/// Arguments and return values are ABI tokens so scripts stay independent
/// of how a particular client encodes calls.
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
	/// Look up a deployed contract by name.
	async fn get_contract(&self, name: &str) -> Result<ContractHandle, ChainError>;

	/// Read-only call; no state change and nothing to confirm.
	async fn call(
		&self,
		contract: &ContractHandle,
		method: &str,
		args: Vec<Token>,
	) -> Result<Vec<Token>, ChainError>;

	/// Broadcast a state-changing call with `value` attached.
	async fn submit(
		&self,
		contract: &ContractHandle,
		method: &str,
		args: Vec<Token>,
		value: U256,
	) -> Result<TxHash, ChainError>;

	/// Wait until `tx` is `confirmations` blocks deep.
	async fn wait_for_confirmations(
		&self,
		tx: TxHash,
		confirmations: usize,
	) -> Result<Receipt, ChainError>;
}

/// Provider wrapped with a local wallet; fills nonce and chain id itself.
pub type WalletClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// JSON-RPC client backed by an ethers HTTP provider.
///
/// Transactions are signed locally when a wallet is configured; otherwise
/// they are sent from the node's first unlocked account, which is how
/// hardhat and anvil nodes are normally driven.
pub struct EthersClient {
	provider: Provider<Http>,
	signer: Option<WalletClient>,
	deployments: Deployments,
	network: String,
}

impl EthersClient {
	pub fn new(url: &str, deployments: Deployments, network: &str) -> anyhow::Result<Self> {
		Ok(Self {
			provider: Provider::<Http>::try_from(url)?,
			signer: None,
			deployments,
			network: network.to_owned(),
		})
	}

	/// Sign submissions with `private_key` for the given chain.
	pub fn with_private_key(mut self, private_key: &str, chain_id: u64) -> anyhow::Result<Self> {
		let wallet: LocalWallet = private_key.trim().parse()?;
		self.signer = Some(SignerMiddleware::new(
			self.provider.clone(),
			wallet.with_chain_id(chain_id),
		));
		Ok(self)
	}

	/// How often pending transactions are polled for a receipt.
	pub fn with_poll_interval(mut self, interval: Duration) -> Self {
		self.provider = self.provider.interval(interval);
		if let Some(signer) = self.signer.take() {
			self.signer = Some(SignerMiddleware::new(
				self.provider.clone(),
				signer.signer().clone(),
			));
		}
		self
	}

	/// Point deployment lookups at another network name.
	pub fn with_network(mut self, network: &str) -> Self {
		self.network = network.to_owned();
		self
	}

	pub fn provider(&self) -> &Provider<Http> {
		&self.provider
	}

	/// Chain id reported by the node.
	pub async fn chain_id(&self) -> Result<u64, ChainError> {
		let id = self.provider.get_chainid().await.map_err(|e| ChainError::Call {
			method: "eth_chainId".into(),
			reason: e.to_string(),
		})?;
		Ok(id.as_u64())
	}

	async fn sender(&self) -> Result<Address, ChainError> {
		if let Some(signer) = &self.signer {
			return Ok(signer.address());
		}
		let accounts = self.provider.get_accounts().await.map_err(|e| ChainError::Call {
			method: "eth_accounts".into(),
			reason: e.to_string(),
		})?;
		accounts.first().copied().ok_or_else(|| ChainError::Call {
			method: "eth_accounts".into(),
			reason: "node has no unlocked accounts and no private key is configured".into(),
		})
	}
}

fn function<'a>(contract: &'a ContractHandle, method: &str) -> Result<&'a Function, ChainError> {
	contract.abi.function(method).map_err(|e| ChainError::Call {
		method: format!("{}.{method}", contract.name),
		reason: e.to_string(),
	})
}

fn encode(contract: &ContractHandle, method: &str, args: &[Token]) -> Result<Vec<u8>, ChainError> {
	function(contract, method)?
		.encode_input(args)
		.map_err(|e| ChainError::Call {
			method: format!("{}.{method}", contract.name),
			reason: e.to_string(),
		})
}

#[async_trait::async_trait]
impl ChainClient for EthersClient {
	async fn get_contract(&self, name: &str) -> Result<ContractHandle, ChainError> {
		self.deployments.get(&self.network, name)
	}

	async fn call(
		&self,
		contract: &ContractHandle,
		method: &str,
		args: Vec<Token>,
	) -> Result<Vec<Token>, ChainError> {
		let data = encode(contract, method, &args)?;
		let tx: TypedTransaction = TransactionRequest::new()
			.to(contract.address)
			.data(data)
			.into();

		let output = self.provider.call(&tx, None).await.map_err(|e| ChainError::Call {
			method: format!("{}.{method}", contract.name),
			reason: e.to_string(),
		})?;

		function(contract, method)?
			.decode_output(&output)
			.map_err(|e| ChainError::Decode {
				method: format!("{}.{method}", contract.name),
				reason: e.to_string(),
			})
	}

	async fn submit(
		&self,
		contract: &ContractHandle,
		method: &str,
		args: Vec<Token>,
		value: U256,
	) -> Result<TxHash, ChainError> {
		let data = encode(contract, method, &args)?;
		let from = self.sender().await?;
		let tx: TypedTransaction = TransactionRequest::new()
			.from(from)
			.to(contract.address)
			.data(data)
			.value(value)
			.into();

		// Both paths estimate gas before broadcasting, so contract-side
		// rejections surface here.
		let hash = match &self.signer {
			Some(signer) => {
				*signer
					.send_transaction(tx, None)
					.await
					.map_err(|e| ChainError::TransactionReverted(e.to_string()))?
			}
			None => {
				*self
					.provider
					.send_transaction(tx, None)
					.await
					.map_err(|e| ChainError::TransactionReverted(e.to_string()))?
			}
		};

		tracing::debug!(contract = %contract.name, method, tx = ?hash, "transaction broadcast");
		Ok(hash)
	}

	async fn wait_for_confirmations(
		&self,
		tx: TxHash,
		confirmations: usize,
	) -> Result<Receipt, ChainError> {
		let receipt = PendingTransaction::new(tx, &self.provider)
			.confirmations(confirmations)
			.await
			.map_err(|e| ChainError::TransactionReverted(e.to_string()))?
			.ok_or_else(|| {
				ChainError::TransactionReverted(format!("transaction {tx:?} was dropped"))
			})?;

		if receipt.status != Some(U64::from(1)) {
			return Err(ChainError::TransactionReverted(format!(
				"transaction {tx:?} reverted in block {:?}",
				receipt.block_number
			)));
		}

		Ok(Receipt {
			tx_hash: receipt.transaction_hash,
			block_number: receipt.block_number.map(|n| n.as_u64()),
		})
	}
}
