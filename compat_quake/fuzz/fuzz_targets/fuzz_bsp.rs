#![no_main]

use compat_quake::bsp_q3;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(lump) = bsp_q3::entities_lump(data) {
        assert!(lump.len() < data.len());
    }
});
