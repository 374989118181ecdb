use mockito::Matcher;
use serde_json::json;

use chain_triggers::{
	models::{ProviderSettings, SecretString},
	services::blockchain::{BlockchainTransport, HttpTransportClient},
};

use crate::integration::mocks::{fast_settings, mock_readiness, mock_rpc_result};

#[tokio::test]
async fn test_connects_to_ready_endpoint() {
	let mut server = mockito::Server::new_async().await;
	let probe = mock_readiness(&mut server);

	let client = HttpTransportClient::new(&[server.url()], None, &fast_settings())
		.await
		.unwrap();

	assert_eq!(client.endpoints().await, vec![format!("{}/", server.url())]);
	assert_eq!(client.get_current_url().await, format!("{}/", server.url()));
	probe.assert();
}

#[tokio::test]
async fn test_unreachable_endpoints_are_left_out() {
	let mut server = mockito::Server::new_async().await;
	let _probe = mock_readiness(&mut server);

	let urls = vec!["http://127.0.0.1:1".to_string(), server.url()];
	let client = HttpTransportClient::new(&urls, None, &fast_settings())
		.await
		.unwrap();

	assert_eq!(client.endpoints().await, vec![format!("{}/", server.url())]);
}

#[tokio::test]
async fn test_no_ready_endpoint_fails() {
	let urls = vec!["http://127.0.0.1:1".to_string(), "not a url".to_string()];
	let result = HttpTransportClient::new(&urls, None, &fast_settings()).await;

	assert!(result.is_err());
	assert!(result
		.err()
		.unwrap()
		.to_string()
		.contains("All RPC URLs failed to connect"));
}

#[tokio::test]
async fn test_project_secret_sent_as_basic_auth() {
	let mut server = mockito::Server::new_async().await;
	let probe = server
		.mock("POST", "/")
		.match_header("authorization", "Basic OnMzY3JldA==")
		.with_header("content-type", "application/json")
		.with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": "1" }).to_string())
		.expect(2)
		.create_async()
		.await;

	let secret = SecretString::new("s3cret".to_string());
	let client = HttpTransportClient::new(&[server.url()], Some(&secret), &fast_settings())
		.await
		.unwrap();
	let response = client
		.send_raw_request("net_version", Some(json!([])))
		.await
		.unwrap();

	assert_eq!(response["result"], "1");
	probe.assert_async().await;
}

#[tokio::test]
async fn test_send_raw_request_returns_payload() {
	let mut server = mockito::Server::new_async().await;
	let _probe = mock_readiness(&mut server);
	let block_number = mock_rpc_result(&mut server, "eth_blockNumber", json!("0x10"))
		.match_body(Matcher::PartialJson(json!({
			"jsonrpc": "2.0",
			"method": "eth_blockNumber",
		})))
		.create_async()
		.await;

	let client = HttpTransportClient::new(&[server.url()], None, &fast_settings())
		.await
		.unwrap();
	let response = client
		.send_raw_request("eth_blockNumber", Some(json!([])))
		.await
		.unwrap();

	assert_eq!(response["result"], "0x10");
	block_number.assert_async().await;
}

#[tokio::test]
async fn test_http_error_is_reported() {
	let mut server = mockito::Server::new_async().await;
	let _probe = mock_readiness(&mut server);
	let _failing = server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({ "method": "eth_getBalance" })))
		.with_status(400)
		.with_body("bad request")
		.create_async()
		.await;

	let client = HttpTransportClient::new(&[server.url()], None, &ProviderSettings::default())
		.await
		.unwrap();
	let result = client
		.send_raw_request("eth_getBalance", Some(json!(["0x0", "latest"])))
		.await;

	assert!(result.is_err());
}
