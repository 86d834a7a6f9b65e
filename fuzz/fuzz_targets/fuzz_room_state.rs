#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Raw-byte path: serde_json performs its own UTF-8 validation here, so
    // invalid sequences exercise that error handling too.
    let _ = serde_json::from_slice::<masquerade_client::protocol::RoomStateView>(data);

    // str path for inputs that happen to be valid UTF-8.
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = serde_json::from_str::<masquerade_client::protocol::RoomStateView>(s);
    }
});
