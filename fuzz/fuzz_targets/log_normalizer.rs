#![no_main]

use chain_triggers::{
    models::{EVMLog, ProviderKind},
    services::{catalog, filter::normalize},
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(log) = serde_json::from_slice::<EVMLog>(data) else {
        return;
    };
    let Some(network) = catalog::endpoint_spec("mainnet", ProviderKind::Public) else {
        return;
    };
    for expected in 1..=4 {
        let _ = normalize(&log, &network, expected);
    }
});
