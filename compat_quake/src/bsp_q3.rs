use std::fmt;

use thiserror::Error;

// id Tech 3 BSP (IBSP v46) lump directory access. Only lump bytes are sliced
// out here; decoding a lump is up to the caller.

pub const LUMP_COUNT: usize = 17;
pub const Q3_BSP_VERSION: u32 = 46;
const BSP_MAGIC: &[u8; 4] = b"IBSP";
const LUMP_DIR_OFFSET: usize = 8;
const LUMP_DIR_ENTRY_LEN: usize = 8;

/// First byte after the fixed header and the full lump directory (0x90).
pub const MIN_LUMP_OFFSET: usize = LUMP_DIR_OFFSET + LUMP_COUNT * LUMP_DIR_ENTRY_LEN;

#[derive(Debug, Error)]
pub enum BspError {
    #[error("bad header")]
    InvalidHeader,
    #[error("bad version {0}")]
    UnsupportedVersion(u32),
    #[error("bsp directory is truncated before the {0} lump")]
    Truncated(LumpType),
    #[error("invalid directory entry for {lump} lump (offset {offset}, length {length})")]
    InvalidDirEntry {
        lump: LumpType,
        offset: i32,
        length: i32,
    },
}

/// A raw lump descriptor as stored in the directory.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Lump {
    pub offset: i32,
    pub length: i32,
}

impl Lump {
    /// Byte range of the declared lump, or `None` when it violates the
    /// directory invariants for a buffer of `data_len` bytes.
    fn checked_range(self, data_len: usize) -> Option<(usize, usize)> {
        if self.length < 0 || (self.offset as i64) < MIN_LUMP_OFFSET as i64 {
            return None;
        }
        let start = self.offset as usize;
        let end = start.checked_add(self.length as usize)?;
        if end > data_len {
            return None;
        }
        Some((start, end))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LumpType {
    Entities = 0,
    Shaders = 1,
    Planes = 2,
    Nodes = 3,
    Leafs = 4,
    LeafFaces = 5,
    LeafBrushes = 6,
    Models = 7,
    Brushes = 8,
    BrushSides = 9,
    Vertices = 10,
    MeshVerts = 11,
    Effects = 12,
    Faces = 13,
    Lightmaps = 14,
    LightVols = 15,
    VisData = 16,
}

impl LumpType {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            LumpType::Entities => "entities",
            LumpType::Shaders => "shaders",
            LumpType::Planes => "planes",
            LumpType::Nodes => "nodes",
            LumpType::Leafs => "leafs",
            LumpType::LeafFaces => "leaf_faces",
            LumpType::LeafBrushes => "leaf_brushes",
            LumpType::Models => "models",
            LumpType::Brushes => "brushes",
            LumpType::BrushSides => "brush_sides",
            LumpType::Vertices => "vertices",
            LumpType::MeshVerts => "meshverts",
            LumpType::Effects => "effects",
            LumpType::Faces => "faces",
            LumpType::Lightmaps => "lightmaps",
            LumpType::LightVols => "lightvols",
            LumpType::VisData => "visdata",
        }
    }
}

impl fmt::Display for LumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Checks the magic and version fields of a map image.
pub fn check_header(data: &[u8]) -> Result<(), BspError> {
    if data.len() < LUMP_DIR_OFFSET || &data[0..4] != BSP_MAGIC {
        return Err(BspError::InvalidHeader);
    }
    let version = read_u32_le(&data[4..8]);
    if version != Q3_BSP_VERSION {
        return Err(BspError::UnsupportedVersion(version));
    }
    Ok(())
}

/// Reads the directory descriptor for `lump` without validating its bounds.
pub fn read_dir_entry(data: &[u8], lump: LumpType) -> Result<Lump, BspError> {
    let base = LUMP_DIR_OFFSET + lump.index() * LUMP_DIR_ENTRY_LEN;
    let entry = data
        .get(base..base + LUMP_DIR_ENTRY_LEN)
        .ok_or(BspError::Truncated(lump))?;
    Ok(Lump {
        offset: read_i32_le(&entry[0..4]),
        length: read_i32_le(&entry[4..8]),
    })
}

/// Returns the body of `lump`, minus the final byte of its declared length.
///
/// The format counts a trailing NUL terminator as part of the lump, so the
/// returned slice is `[offset, offset + length - 1)`. A zero-length lump
/// yields an empty slice.
pub fn extract_lump(data: &[u8], lump: LumpType) -> Result<&[u8], BspError> {
    check_header(data)?;
    let entry = read_dir_entry(data, lump)?;
    let (start, end) = entry
        .checked_range(data.len())
        .ok_or(BspError::InvalidDirEntry {
            lump,
            offset: entry.offset,
            length: entry.length,
        })?;
    let body_end = if end > start { end - 1 } else { start };
    Ok(&data[start..body_end])
}

pub fn entities_lump(data: &[u8]) -> Result<&[u8], BspError> {
    extract_lump(data, LumpType::Entities)
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_i32_le(bytes: &[u8]) -> i32 {
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
