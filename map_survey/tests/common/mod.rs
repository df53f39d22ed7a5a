#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use compat_quake::bsp_q3::MIN_LUMP_OFFSET;
use zip::write::FileOptions;
use zip::ZipWriter;

/// Minimal IBSP v46 image whose entity lump holds `entities` plus a NUL.
pub fn bsp_image(entities: &str) -> Vec<u8> {
    let mut lump = entities.as_bytes().to_vec();
    lump.push(0);
    let mut data = Vec::new();
    data.extend_from_slice(b"IBSP");
    data.extend_from_slice(&46u32.to_le_bytes());
    data.extend_from_slice(&(MIN_LUMP_OFFSET as i32).to_le_bytes());
    data.extend_from_slice(&(lump.len() as i32).to_le_bytes());
    data.resize(MIN_LUMP_OFFSET, 0);
    data.extend_from_slice(&lump);
    data
}

pub fn entity_text(blocks: &[&[(&str, &str)]]) -> String {
    let mut text = String::new();
    for block in blocks {
        text.push_str("{\n");
        for (key, value) in block.iter() {
            text.push_str(&format!("\"{}\" \"{}\"\n", key, value));
        }
        text.push_str("}\n");
    }
    text
}

pub fn pk3_bytes(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, FileOptions::default())
                .expect("add directory");
            continue;
        }
        writer
            .start_file(*name, FileOptions::default())
            .expect("start file");
        writer.write_all(data).expect("write entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

pub fn write_pk3(dir: &Path, name: &str, entries: &[(&str, Vec<u8>)]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, pk3_bytes(entries)).expect("write pk3");
    path
}

pub fn resource(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("resources")
        .join(name)
}
