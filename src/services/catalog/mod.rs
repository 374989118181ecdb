//! Static endpoint catalog.
//!
//! Maps a network identifier and a provider kind to the RPC endpoints, chain id,
//! block explorer and native currency of that network. Vendor URL templates carry
//! the `{apiKey}` placeholder, which the provider factory substitutes.
//!
//! Custom provider kinds have no catalog URLs; for them [`endpoint_spec`] returns
//! the network metadata with empty URL lists so links can still be built.

use crate::models::{NetworkEndpointSpec, ProviderKind};

struct NetworkEntry {
	id: &'static str,
	chain_id: u64,
	explorer: &'static str,
	currency: &'static str,
	marketplace: Option<&'static str>,
	infura: Option<(&'static str, &'static str)>,
	alchemy: Option<(&'static str, &'static str)>,
	public: &'static [&'static str],
}

const NETWORKS: &[NetworkEntry] = &[
	NetworkEntry {
		id: "mainnet",
		chain_id: 1,
		explorer: "https://etherscan.io",
		currency: "ETH",
		marketplace: Some("https://opensea.io/assets/ethereum"),
		infura: Some((
			"https://mainnet.infura.io/v3/{apiKey}",
			"wss://mainnet.infura.io/ws/v3/{apiKey}",
		)),
		alchemy: Some((
			"https://eth-mainnet.g.alchemy.com/v2/{apiKey}",
			"wss://eth-mainnet.g.alchemy.com/v2/{apiKey}",
		)),
		public: &[
			"https://ethereum-rpc.publicnode.com",
			"https://eth.llamarpc.com",
			"https://cloudflare-eth.com",
		],
	},
	NetworkEntry {
		id: "sepolia",
		chain_id: 11155111,
		explorer: "https://sepolia.etherscan.io",
		currency: "ETH",
		marketplace: Some("https://testnets.opensea.io/assets/sepolia"),
		infura: Some((
			"https://sepolia.infura.io/v3/{apiKey}",
			"wss://sepolia.infura.io/ws/v3/{apiKey}",
		)),
		alchemy: Some((
			"https://eth-sepolia.g.alchemy.com/v2/{apiKey}",
			"wss://eth-sepolia.g.alchemy.com/v2/{apiKey}",
		)),
		public: &[
			"https://ethereum-sepolia-rpc.publicnode.com",
			"https://rpc.sepolia.org",
		],
	},
	NetworkEntry {
		id: "polygon",
		chain_id: 137,
		explorer: "https://polygonscan.com",
		currency: "POL",
		marketplace: Some("https://opensea.io/assets/matic"),
		infura: Some((
			"https://polygon-mainnet.infura.io/v3/{apiKey}",
			"wss://polygon-mainnet.infura.io/ws/v3/{apiKey}",
		)),
		alchemy: Some((
			"https://polygon-mainnet.g.alchemy.com/v2/{apiKey}",
			"wss://polygon-mainnet.g.alchemy.com/v2/{apiKey}",
		)),
		public: &[
			"https://polygon-bor-rpc.publicnode.com",
			"https://polygon-rpc.com",
		],
	},
	NetworkEntry {
		id: "polygon-amoy",
		chain_id: 80002,
		explorer: "https://amoy.polygonscan.com",
		currency: "POL",
		marketplace: Some("https://testnets.opensea.io/assets/amoy"),
		infura: Some((
			"https://polygon-amoy.infura.io/v3/{apiKey}",
			"wss://polygon-amoy.infura.io/ws/v3/{apiKey}",
		)),
		alchemy: Some((
			"https://polygon-amoy.g.alchemy.com/v2/{apiKey}",
			"wss://polygon-amoy.g.alchemy.com/v2/{apiKey}",
		)),
		public: &["https://rpc-amoy.polygon.technology"],
	},
	NetworkEntry {
		id: "arbitrum",
		chain_id: 42161,
		explorer: "https://arbiscan.io",
		currency: "ETH",
		marketplace: Some("https://opensea.io/assets/arbitrum"),
		infura: Some((
			"https://arbitrum-mainnet.infura.io/v3/{apiKey}",
			"wss://arbitrum-mainnet.infura.io/ws/v3/{apiKey}",
		)),
		alchemy: Some((
			"https://arb-mainnet.g.alchemy.com/v2/{apiKey}",
			"wss://arb-mainnet.g.alchemy.com/v2/{apiKey}",
		)),
		public: &[
			"https://arb1.arbitrum.io/rpc",
			"https://arbitrum-one-rpc.publicnode.com",
		],
	},
	NetworkEntry {
		id: "optimism",
		chain_id: 10,
		explorer: "https://optimistic.etherscan.io",
		currency: "ETH",
		marketplace: Some("https://opensea.io/assets/optimism"),
		infura: Some((
			"https://optimism-mainnet.infura.io/v3/{apiKey}",
			"wss://optimism-mainnet.infura.io/ws/v3/{apiKey}",
		)),
		alchemy: Some((
			"https://opt-mainnet.g.alchemy.com/v2/{apiKey}",
			"wss://opt-mainnet.g.alchemy.com/v2/{apiKey}",
		)),
		public: &[
			"https://mainnet.optimism.io",
			"https://optimism-rpc.publicnode.com",
		],
	},
	NetworkEntry {
		id: "base",
		chain_id: 8453,
		explorer: "https://basescan.org",
		currency: "ETH",
		marketplace: Some("https://opensea.io/assets/base"),
		infura: Some((
			"https://base-mainnet.infura.io/v3/{apiKey}",
			"wss://base-mainnet.infura.io/ws/v3/{apiKey}",
		)),
		alchemy: Some((
			"https://base-mainnet.g.alchemy.com/v2/{apiKey}",
			"wss://base-mainnet.g.alchemy.com/v2/{apiKey}",
		)),
		public: &["https://mainnet.base.org", "https://base-rpc.publicnode.com"],
	},
	NetworkEntry {
		id: "base-sepolia",
		chain_id: 84532,
		explorer: "https://sepolia.basescan.org",
		currency: "ETH",
		marketplace: Some("https://testnets.opensea.io/assets/base_sepolia"),
		infura: Some((
			"https://base-sepolia.infura.io/v3/{apiKey}",
			"wss://base-sepolia.infura.io/ws/v3/{apiKey}",
		)),
		alchemy: Some((
			"https://base-sepolia.g.alchemy.com/v2/{apiKey}",
			"wss://base-sepolia.g.alchemy.com/v2/{apiKey}",
		)),
		public: &["https://sepolia.base.org"],
	},
];

fn find(network: &str) -> Option<&'static NetworkEntry> {
	NETWORKS.iter().find(|entry| entry.id == network)
}

/// Identifiers of every network in the catalog
pub fn networks() -> impl Iterator<Item = &'static str> {
	NETWORKS.iter().map(|entry| entry.id)
}

/// Returns true when the catalog knows the network
pub fn is_known_network(network: &str) -> bool {
	find(network).is_some()
}

/// Looks up the endpoint spec for a network reached through a provider kind.
///
/// Returns `None` when the network is unknown or the vendor does not serve it.
pub fn endpoint_spec(network: &str, kind: ProviderKind) -> Option<NetworkEndpointSpec> {
	let entry = find(network)?;

	let (rpc_urls, ws_urls) = match kind {
		ProviderKind::Infura => {
			let (http, ws) = entry.infura?;
			(vec![http.to_string()], vec![ws.to_string()])
		}
		ProviderKind::Alchemy => {
			let (http, ws) = entry.alchemy?;
			(vec![http.to_string()], vec![ws.to_string()])
		}
		ProviderKind::Public => (
			entry.public.iter().map(|url| url.to_string()).collect(),
			Vec::new(),
		),
		ProviderKind::CustomHttp | ProviderKind::CustomWs => (Vec::new(), Vec::new()),
	};

	Some(NetworkEndpointSpec {
		network: entry.id.to_string(),
		kind,
		chain_id: entry.chain_id,
		rpc_urls,
		ws_urls,
		explorer_url: entry.explorer.to_string(),
		currency: entry.currency.to_string(),
		marketplace_url: entry.marketplace.map(str::to_string),
	})
}
