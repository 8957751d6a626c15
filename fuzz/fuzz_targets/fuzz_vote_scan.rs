#![no_main]
use karma_core::{scan, Gesture};
use libfuzzer_sys::fuzz_target;

const MEME_PREFIXES: [&str; 2] = ["!ytmnd ", "!ytwnd "];

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let gestures: Vec<Gesture<'_>> = scan(text, &MEME_PREFIXES).collect();
        for gesture in gestures {
            assert!(gesture.offset <= text.len());
            assert!(!gesture.target.contains(' '));
        }
    }
});
