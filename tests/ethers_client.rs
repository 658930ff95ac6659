//! `EthersClient` against a scripted JSON-RPC node on a local port.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ethers::abi::{Abi, Token};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TxHash, U256};
use ethers::utils::rlp::Rlp;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use nft_market::contracts::{ContractHandle, Deployments, MARKETPLACE_CONTRACT};
use nft_market::error::ChainError;
use nft_market::rpc::{ChainClient, EthersClient};

/// First hardhat/anvil development account.
const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const DEV_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

const BUY_ITEM_ABI: &str = r#"[{
	"type": "function",
	"name": "buyItem",
	"stateMutability": "payable",
	"inputs": [
		{"name": "nftAddress", "type": "address"},
		{"name": "tokenId", "type": "uint256"}
	],
	"outputs": []
}]"#;

type Calls = Arc<Mutex<Vec<(String, Value)>>>;

/// Answers each JSON-RPC request with whatever `handler` returns for its
/// method, and records every request it sees.
struct ScriptedNode {
	url: String,
	calls: Calls,
}

impl ScriptedNode {
	async fn start<H>(handler: H) -> Self
	where
		H: Fn(&str, &Value) -> Result<Value, String> + Send + Sync + 'static,
	{
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let url = format!("http://{}", listener.local_addr().unwrap());
		let calls: Calls = Arc::new(Mutex::new(Vec::new()));
		let handler = Arc::new(handler);

		let log = calls.clone();
		tokio::spawn(async move {
			while let Ok((stream, _)) = listener.accept().await {
				let handler = handler.clone();
				let log = log.clone();
				tokio::spawn(async move {
					let _ = answer(stream, &*handler, &log).await;
				});
			}
		});

		Self { url, calls }
	}

	fn methods(&self) -> Vec<String> {
		self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
	}

	fn params_of(&self, method: &str) -> Option<Value> {
		self.calls
			.lock()
			.unwrap()
			.iter()
			.find(|(m, _)| m == method)
			.map(|(_, p)| p.clone())
	}

	fn client(&self) -> EthersClient {
		EthersClient::new(&self.url, Deployments::new("deployments"), "localhost")
			.unwrap()
			.with_poll_interval(Duration::from_millis(10))
	}
}

async fn answer<H>(mut stream: TcpStream, handler: &H, log: &Mutex<Vec<(String, Value)>>) -> std::io::Result<()>
where
	H: Fn(&str, &Value) -> Result<Value, String>,
{
	let mut buf = Vec::new();
	let mut chunk = [0u8; 4096];
	let body_start = loop {
		let n = stream.read(&mut chunk).await?;
		if n == 0 {
			return Ok(());
		}
		buf.extend_from_slice(&chunk[..n]);
		if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
			break pos + 4;
		}
	};

	let head = String::from_utf8_lossy(&buf[..body_start]).to_lowercase();
	let len = head
		.lines()
		.find_map(|l| l.strip_prefix("content-length:"))
		.and_then(|v| v.trim().parse::<usize>().ok())
		.unwrap_or(0);
	while buf.len() < body_start + len {
		let n = stream.read(&mut chunk).await?;
		if n == 0 {
			break;
		}
		buf.extend_from_slice(&chunk[..n]);
	}

	let end = buf.len().min(body_start + len);
	let request: Value = serde_json::from_slice(&buf[body_start..end]).unwrap_or(Value::Null);
	let method = request["method"].as_str().unwrap_or_default().to_owned();
	let params = request["params"].clone();
	log.lock().unwrap().push((method.clone(), params.clone()));

	let body = match handler(&method, &params) {
		Ok(result) => json!({"jsonrpc": "2.0", "id": request["id"], "result": result}),
		Err(message) => json!({
			"jsonrpc": "2.0",
			"id": request["id"],
			"error": {"code": 3, "message": message}
		}),
	}
	.to_string();

	let response = format!(
		"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
		body.len(),
		body
	);
	stream.write_all(response.as_bytes()).await?;
	stream.shutdown().await
}

fn marketplace() -> ContractHandle {
	let abi: Abi = serde_json::from_str(BUY_ITEM_ABI).unwrap();
	ContractHandle {
		name: MARKETPLACE_CONTRACT.into(),
		address: Address::repeat_byte(0x01),
		abi,
	}
}

fn buy_args() -> Vec<Token> {
	vec![Token::Address(Address::repeat_byte(0x02)), Token::Uint(U256::from(3))]
}

fn tx_hash_hex() -> String {
	format!("{:?}", TxHash::repeat_byte(0x77))
}

fn mined_transaction() -> Value {
	json!({
		"hash": tx_hash_hex(),
		"nonce": "0x0",
		"blockHash": format!("{:?}", TxHash::repeat_byte(0x11)),
		"blockNumber": "0x1",
		"transactionIndex": "0x0",
		"from": DEV_ADDRESS,
		"to": format!("{:?}", Address::repeat_byte(0x01)),
		"value": "0x0",
		"gasPrice": "0x1",
		"gas": "0x5208",
		"input": "0x",
		"v": "0x1b",
		"r": "0x1",
		"s": "0x1"
	})
}

fn receipt_with_status(status: &str) -> Value {
	json!({
		"transactionHash": tx_hash_hex(),
		"transactionIndex": "0x0",
		"blockHash": format!("{:?}", TxHash::repeat_byte(0x11)),
		"blockNumber": "0x1",
		"from": DEV_ADDRESS,
		"to": format!("{:?}", Address::repeat_byte(0x01)),
		"cumulativeGasUsed": "0x5208",
		"gasUsed": "0x5208",
		"contractAddress": null,
		"logs": [],
		"logsBloom": format!("0x{}", "00".repeat(256)),
		"status": status,
		"type": "0x0",
		"effectiveGasPrice": "0x1"
	})
}

#[tokio::test]
async fn signed_purchase_uses_the_account_nonce() {
	let node = ScriptedNode::start(|method, _| match method {
		"eth_getTransactionCount" => Ok(json!("0x5")),
		"eth_gasPrice" => Ok(json!("0x3b9aca00")),
		"eth_estimateGas" => Ok(json!("0x30d40")),
		"eth_chainId" => Ok(json!("0x7a69")),
		"eth_sendRawTransaction" => Ok(json!(tx_hash_hex())),
		other => Err(format!("unexpected method {other}")),
	})
	.await;
	let client = node.client().with_private_key(DEV_KEY, 31337).unwrap();

	let hash = client
		.submit(&marketplace(), "buyItem", buy_args(), U256::from(100))
		.await
		.unwrap();
	assert_eq!(hash, TxHash::repeat_byte(0x77));

	let methods = node.methods();
	assert!(methods.iter().any(|m| m == "eth_getTransactionCount"), "{methods:?}");
	assert!(!methods.iter().any(|m| m == "eth_sendTransaction"), "{methods:?}");

	let params = node.params_of("eth_sendRawTransaction").unwrap();
	let raw: Bytes = params[0].as_str().unwrap().parse().unwrap();
	let (tx, _signature) = TypedTransaction::decode_signed(&Rlp::new(&raw)).unwrap();
	assert_eq!(tx.nonce(), Some(&U256::from(5)));
	assert_eq!(tx.value(), Some(&U256::from(100)));
}

#[tokio::test]
async fn unlocked_purchase_goes_through_the_node_account() {
	let node = ScriptedNode::start(|method, _| match method {
		"eth_accounts" => Ok(json!([DEV_ADDRESS])),
		"eth_gasPrice" => Ok(json!("0x3b9aca00")),
		"eth_estimateGas" => Ok(json!("0x30d40")),
		"eth_sendTransaction" => Ok(json!(tx_hash_hex())),
		other => Err(format!("unexpected method {other}")),
	})
	.await;

	node.client()
		.submit(&marketplace(), "buyItem", buy_args(), U256::from(100))
		.await
		.unwrap();

	let params = node.params_of("eth_sendTransaction").unwrap();
	assert_eq!(params[0]["from"].as_str(), Some(DEV_ADDRESS));
	assert_eq!(params[0]["value"].as_str(), Some("0x64"));
	assert!(node.params_of("eth_sendRawTransaction").is_none());
}

#[tokio::test]
async fn rejected_estimate_is_a_revert_with_the_node_message() {
	let node = ScriptedNode::start(|method, _| match method {
		"eth_getTransactionCount" => Ok(json!("0x0")),
		"eth_gasPrice" => Ok(json!("0x3b9aca00")),
		"eth_estimateGas" => Err("execution reverted: NftMarketplace__PriceNotMet".into()),
		other => Err(format!("unexpected method {other}")),
	})
	.await;
	let client = node.client().with_private_key(DEV_KEY, 31337).unwrap();

	let err = client
		.submit(&marketplace(), "buyItem", buy_args(), U256::zero())
		.await
		.unwrap_err();

	match err {
		ChainError::TransactionReverted(reason) => {
			assert!(reason.contains("NftMarketplace__PriceNotMet"), "{reason}")
		}
		other => panic!("expected a revert, got {other:?}"),
	}
	assert!(node.params_of("eth_sendRawTransaction").is_none());
}

#[tokio::test]
async fn successful_receipt_is_returned() {
	let node = ScriptedNode::start(|method, _| match method {
		"eth_getTransactionByHash" => Ok(mined_transaction()),
		"eth_getTransactionReceipt" => Ok(receipt_with_status("0x1")),
		"eth_blockNumber" => Ok(json!("0x1")),
		other => Err(format!("unexpected method {other}")),
	})
	.await;

	let receipt = node
		.client()
		.wait_for_confirmations(TxHash::repeat_byte(0x77), 1)
		.await
		.unwrap();
	assert_eq!(receipt.tx_hash, TxHash::repeat_byte(0x77));
	assert_eq!(receipt.block_number, Some(1));
}

#[tokio::test]
async fn status_zero_receipt_is_a_revert() {
	let node = ScriptedNode::start(|method, _| match method {
		"eth_getTransactionByHash" => Ok(mined_transaction()),
		"eth_getTransactionReceipt" => Ok(receipt_with_status("0x0")),
		"eth_blockNumber" => Ok(json!("0x1")),
		other => Err(format!("unexpected method {other}")),
	})
	.await;

	let err = node
		.client()
		.wait_for_confirmations(TxHash::repeat_byte(0x77), 1)
		.await
		.unwrap_err();
	assert!(matches!(err, ChainError::TransactionReverted(ref r) if r.contains("reverted")), "{err:?}");
}

#[tokio::test]
async fn dropped_transaction_is_a_revert() {
	let node = ScriptedNode::start(|method, _| match method {
		"eth_getTransactionByHash" => Ok(Value::Null),
		other => Err(format!("unexpected method {other}")),
	})
	.await;

	let err = tokio::time::timeout(
		Duration::from_secs(10),
		node.client().wait_for_confirmations(TxHash::repeat_byte(0x77), 1),
	)
	.await
	.expect("pending transaction never gave up")
	.unwrap_err();
	assert!(matches!(err, ChainError::TransactionReverted(ref r) if r.contains("dropped")), "{err:?}");
	assert!(node.methods().iter().all(|m| m == "eth_getTransactionByHash"));
}
