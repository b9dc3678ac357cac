#![no_main]

use btcwill_form::parse_percentage;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let value = parse_percentage(s);
        // Unparseable input reads as zero, never NaN
        assert!(!value.is_nan());
    }
});
