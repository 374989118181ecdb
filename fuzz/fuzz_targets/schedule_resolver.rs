#![no_main]

use chain_triggers::{models::ScheduleSpec, services::schedule::resolve};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(spec) = serde_json::from_slice::<ScheduleSpec>(data) {
        let _ = resolve(&spec);
    }
});
