#![no_main]

use handoff::transport::ClientEvent;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(event) = serde_json::from_slice::<ClientEvent>(data) {
        let _ = event.name();
    }
});
