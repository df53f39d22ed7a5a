#![no_main]

use compat_quake::diagnostic::Discard;
use compat_quake::entities::{decode_lump, EntityParser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = decode_lump(data) else {
        return;
    };
    for record in EntityParser::new(text, Discard) {
        match record {
            Ok(record) => assert!(record.classname().is_some()),
            Err(_) => break,
        }
    }
});
