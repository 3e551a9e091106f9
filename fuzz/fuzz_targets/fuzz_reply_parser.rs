#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Whatever comes back over the wire, parsing must not panic, and a
    // result must appear somewhere in the input as a decimal token.
    if let Some(v) = perch_hardware::parse_first_reading(data) {
        let needle = v.to_string();
        assert!(data.windows(needle.len()).any(|w| w == needle.as_bytes()));
    }
});
