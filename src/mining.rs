use std::time::Duration;

use crate::error::ChainError;
use crate::rpc::EthersClient;

/// Simulates chain progress on local nodes that do not mine on their own.
#[async_trait::async_trait]
pub trait BlockAdvancer: Send + Sync {
	/// Mine `blocks` blocks, pausing `delay` between each one.
	async fn advance(&self, blocks: u64, delay: Duration) -> Result<(), ChainError>;
}

#[async_trait::async_trait]
impl BlockAdvancer for EthersClient {
	async fn advance(&self, blocks: u64, delay: Duration) -> Result<(), ChainError> {
		tracing::info!(blocks, "moving blocks");
		for mined in 1..=blocks {
			self.provider()
				.request::<_, serde_json::Value>("evm_mine", ())
				.await
				.map_err(|e| ChainError::CollaboratorFailure(e.to_string()))?;

			if !delay.is_zero() {
				tracing::debug!(mined, delay_ms = delay.as_millis() as u64, "sleeping");
				tokio::time::sleep(delay).await;
			}
		}
		tracing::info!(blocks, "moved blocks");
		Ok(())
	}
}
