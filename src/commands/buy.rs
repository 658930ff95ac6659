use std::time::Duration;

use anyhow::Result;
use ethers::abi::Token;
use ethers::types::{Address, TxHash, U256};

use crate::cli::Cli;
use crate::commands::connect;
use crate::contracts::{ITEM_CONTRACT, MARKETPLACE_CONTRACT};
use crate::error::ChainError;
use crate::mining::BlockAdvancer;
use crate::network::{ActiveNetwork, NetworkRegistry};
use crate::rpc::ChainClient;

/// Token id bought when none is given.
pub const DEFAULT_ITEM_ID: u64 = 3;

/// Confirmations to await on the purchase.
pub const PURCHASE_CONFIRMATIONS: usize = 1;

/// Blocks mined after a purchase on a development chain, and the pause
/// between them.
pub const DEV_BLOCKS_TO_MINE: u64 = 2;
pub const DEV_BLOCK_DELAY: Duration = Duration::from_millis(1000);

/// What to buy and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyRequest {
	pub marketplace: String,
	pub item_contract: String,
	pub item_id: u64,
}

impl Default for BuyRequest {
	fn default() -> Self {
		Self {
			marketplace: MARKETPLACE_CONTRACT.into(),
			item_contract: ITEM_CONTRACT.into(),
			item_id: DEFAULT_ITEM_ID,
		}
	}
}

/// Summary of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReport {
	pub tx_hash: TxHash,
	pub block_number: Option<u64>,
	/// Value attached to the purchase, taken from the listing.
	pub price: U256,
	/// Owner read before buying; `None` when the item did not exist.
	pub previous_owner: Option<Address>,
	pub blocks_advanced: bool,
}

pub async fn run(
	cli: &Cli,
	marketplace: &str,
	item_contract: &str,
	item_id: u64,
) -> Result<()> {
	let session = connect(cli).await?;
	let request = BuyRequest {
		marketplace: marketplace.to_owned(),
		item_contract: item_contract.to_owned(),
		item_id,
	};

	let report = buy_item(
		&session.client,
		&session.client,
		&session.registry,
		&session.network,
		&request,
	)
	.await?;

	println!("NFT bought!");
	println!("  Item:    {} #{}", request.item_contract, request.item_id);
	println!("  Price:   {} wei", report.price);
	println!("  Tx:      {:?}", report.tx_hash);
	if let Some(block) = report.block_number {
		println!("  Block:   {block}");
	}
	if report.blocks_advanced {
		println!("  Mined {DEV_BLOCKS_TO_MINE} extra block(s) on {}", session.network.name);
	}
	Ok(())
}

/// Buy `request.item_id` at its listed price.
///
/// Each chain interaction is issued only after the previous one has
/// answered, and the first failure ends the run. Nothing is retried, so a
/// run interrupted after broadcast may buy twice if started again.
///
/// The listing is not checked before buying: a missing listing reads back
/// with a zero price and is left for the marketplace to reject. The owner
/// lookup is informational only.
pub async fn buy_item<C, M>(
	client: &C,
	miner: &M,
	registry: &NetworkRegistry,
	network: &ActiveNetwork,
	request: &BuyRequest,
) -> Result<PurchaseReport, ChainError>
where
	C: ChainClient + ?Sized,
	M: BlockAdvancer + ?Sized,
{
	let marketplace = client.get_contract(&request.marketplace).await?;
	let item = client.get_contract(&request.item_contract).await?;
	let item_id = Token::Uint(U256::from(request.item_id));

	let listing = client
		.call(
			&marketplace,
			"getListing",
			vec![Token::Address(item.address), item_id.clone()],
		)
		.await?;
	let price = listing_price(listing).ok_or_else(|| ChainError::Decode {
		method: format!("{}.getListing", marketplace.name),
		reason: "listing has no price".into(),
	})?;
	tracing::info!(item_id = request.item_id, %price, "read listing");

	let previous_owner = read_owner(client, &item, item_id.clone()).await;
	match previous_owner {
		Some(owner) => tracing::info!(
			item_id = request.item_id,
			owner = ?owner,
			"NFT with ID {} exists and is owned by {owner:?}",
			request.item_id
		),
		None => tracing::info!(
			item_id = request.item_id,
			"NFT with ID {} does not exist",
			request.item_id
		),
	}

	let tx_hash = client
		.submit(
			&marketplace,
			"buyItem",
			vec![Token::Address(item.address), item_id],
			price,
		)
		.await?;
	let receipt = client
		.wait_for_confirmations(tx_hash, PURCHASE_CONFIRMATIONS)
		.await?;
	tracing::info!(tx = ?receipt.tx_hash, block = ?receipt.block_number, "NFT bought");

	let blocks_advanced = registry.is_development_network(&network.name);
	if blocks_advanced {
		miner.advance(DEV_BLOCKS_TO_MINE, DEV_BLOCK_DELAY).await?;
	}

	Ok(PurchaseReport {
		tx_hash: receipt.tx_hash,
		block_number: receipt.block_number,
		price,
		previous_owner,
		blocks_advanced,
	})
}

/// Pull the price out of a `getListing` return value, which is either the
/// `(price, seller)` struct or a bare price.
fn listing_price(tokens: Vec<Token>) -> Option<U256> {
	match tokens.into_iter().next()? {
		Token::Tuple(fields) => fields.into_iter().next()?.into_uint(),
		Token::Uint(price) => Some(price),
		_ => None,
	}
}

/// Current owner of the item, or `None` for the zero address. ERC-721
/// contracts revert `ownerOf` for unminted tokens, which reads the same.
async fn read_owner<C>(
	client: &C,
	item: &crate::contracts::ContractHandle,
	item_id: Token,
) -> Option<Address>
where
	C: ChainClient + ?Sized,
{
	match client.call(item, "ownerOf", vec![item_id]).await {
		Ok(tokens) => tokens
			.into_iter()
			.next()
			.and_then(Token::into_address)
			.filter(|owner| !owner.is_zero()),
		Err(e) => {
			tracing::warn!(error = %e, "ownerOf failed");
			None
		}
	}
}
