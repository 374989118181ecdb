use alloy::primitives::{address, b256, Bytes, U256};
use mockito::Matcher;
use serde_json::json;
use std::{
	sync::atomic::{AtomicUsize, Ordering},
	time::Duration,
};

use chain_triggers::{
	models::LogDirection,
	services::{
		blockchain::{ChainConnection, EvmClient, HttpTransportClient},
		filter::{
			build_filter,
			evm_helpers::{b256_to_string, pad_address},
		},
	},
};

use crate::integration::mocks::{fast_settings, mock_readiness, mock_rpc_result, MockRpcTransport};

async fn http_client(server: &mockito::ServerGuard) -> EvmClient<HttpTransportClient> {
	let transport = HttpTransportClient::new(&[server.url()], None, &fast_settings())
		.await
		.unwrap();
	EvmClient::new_with_transport(transport, Duration::from_millis(50))
}

#[tokio::test]
async fn test_get_balance() {
	let mut server = mockito::Server::new_async().await;
	let _probe = mock_readiness(&mut server);
	let balance = mock_rpc_result(&mut server, "eth_getBalance", json!("0x64"))
		.match_body(Matcher::PartialJson(json!({
			"method": "eth_getBalance",
			"params": ["0x000000000000000000000000000000000000dead", "latest"]
		})))
		.create_async()
		.await;

	let client = http_client(&server).await;
	let value = client
		.get_balance(address!("000000000000000000000000000000000000dead"))
		.await
		.unwrap();

	assert_eq!(value, U256::from(100u64));
	balance.assert_async().await;
}

#[tokio::test]
async fn test_rpc_error_is_surfaced() {
	let mut server = mockito::Server::new_async().await;
	let _probe = mock_readiness(&mut server);
	let _call = server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({ "method": "eth_call" })))
		.with_header("content-type", "application/json")
		.with_body(
			json!({
				"jsonrpc": "2.0",
				"id": 1,
				"error": { "code": 3, "message": "execution reverted" }
			})
			.to_string(),
		)
		.create_async()
		.await;

	let client = http_client(&server).await;
	let result = client
		.call(
			address!("1f9840a85d5af5bf1d1762f925bdaddc4201f984"),
			Bytes::from_static(&[0x18, 0x16, 0x0d, 0xdd]),
		)
		.await;

	assert!(result.is_err());
	assert!(result
		.unwrap_err()
		.to_string()
		.contains("eth_call returned an error"));
}

#[tokio::test]
async fn test_call_returns_raw_output() {
	let mut mock_transport = MockRpcTransport::new();
	mock_transport
		.expect_send_raw_request()
		.withf(|method, _| method == "eth_call")
		.times(1)
		.returning(|_, _| {
			Ok(json!({
				"jsonrpc": "2.0",
				"id": 1,
				"result": "0x000000000000000000000000000000000000000000000000000000000000002a"
			}))
		});
	mock_transport
		.expect_clone()
		.returning(MockRpcTransport::new);

	let client = EvmClient::new_with_transport(mock_transport, Duration::from_secs(1));
	let output = client
		.call(
			address!("1f9840a85d5af5bf1d1762f925bdaddc4201f984"),
			Bytes::from_static(&[0x18, 0x16, 0x0d, 0xdd]),
		)
		.await
		.unwrap();

	assert_eq!(U256::from_be_slice(&output), U256::from(42u64));
}

#[tokio::test]
async fn test_polled_subscription_delivers_new_logs() {
	let mut server = mockito::Server::new_async().await;
	let _probe = mock_readiness(&mut server);

	let polls = AtomicUsize::new(0);
	let _head = server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({ "method": "eth_blockNumber" })))
		.with_header("content-type", "application/json")
		.with_body_from_request(move |_| {
			// The first poll only sets the starting block
			let head = if polls.fetch_add(1, Ordering::SeqCst) == 0 {
				"0x10"
			} else {
				"0x11"
			};
			json!({ "jsonrpc": "2.0", "id": 1, "result": head })
				.to_string()
				.into_bytes()
		})
		.create_async()
		.await;

	let recipient = address!("000000000000000000000000000000000000dead");
	let logs = mock_rpc_result(
		&mut server,
		"eth_getLogs",
		json!([{
			"address": "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984",
			"topics": [
				"0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
				"0x000000000000000000000000000000000000000000000000000000000000beef",
				b256_to_string(pad_address(recipient))
			],
			"data": "0x0000000000000000000000000000000000000000000000000000000000000001",
			"blockNumber": "0x11",
			"logIndex": "0x0"
		}]),
	)
	.match_body(Matcher::AllOf(vec![
		Matcher::PartialJson(json!({ "method": "eth_getLogs" })),
		Matcher::Regex(r#""fromBlock":"0x11""#.to_string()),
		Matcher::Regex(r#""toBlock":"0x11""#.to_string()),
	]))
	.create_async()
	.await;

	let client = http_client(&server).await;
	let filter = build_filter(Some(LogDirection::To), Some(recipient), None)
		.unwrap()
		.with_topic(0, b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"));

	let mut subscription = client.subscribe_logs(&filter).await.unwrap();
	assert!(subscription.id.starts_with("poll-"));
	assert_eq!(client.subscription_count(), 1);

	let log = tokio::time::timeout(Duration::from_secs(5), subscription.receiver.recv())
		.await
		.unwrap()
		.unwrap();
	assert_eq!(log.topics.len(), 3);
	logs.assert_async().await;

	client.unsubscribe(&subscription.id).await.unwrap();
	assert_eq!(client.subscription_count(), 0);
}
