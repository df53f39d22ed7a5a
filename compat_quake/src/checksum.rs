//! Engine-compatible content checksums.
//!
//! id Tech 3 identifies a pk3 by an MD4 digest over the CRC32 of every
//! non-empty archive member, folded down to 32 bits. Maps use the same fold
//! over an MD4 of the whole file. Values are compared against ones the engine
//! produces, so the byte order of every step matters.

use std::fmt;

use md4::{Digest, Md4};
use serde::{Serialize, Serializer};

pub const FINGERPRINT_LEN: usize = 4;

/// A folded 4-byte checksum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The stored bytes read as a little-endian integer, which is how the
    /// engine reports the value in `sv_currentPak`.
    pub fn engine_value(&self) -> u32 {
        u32::from_le_bytes(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Directory facts about one archive member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArchiveMember {
    pub crc32: u32,
    pub size: u64,
}

/// XORs the four little-endian words of an MD4 digest and stores the result
/// big-endian.
pub fn reduce16to4(digest: &[u8; 16]) -> Fingerprint {
    let folded = digest
        .chunks_exact(4)
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .fold(0u32, |acc, word| acc ^ word);
    Fingerprint(folded.to_be_bytes())
}

pub fn map_fingerprint(data: &[u8]) -> Fingerprint {
    fold_md4(Md4::digest(data).as_slice())
}

/// Checksum of an archive from its central directory, in on-disk order.
/// Members with a decompressed size of zero are skipped entirely.
pub fn archive_fingerprint<I>(members: I) -> Fingerprint
where
    I: IntoIterator<Item = ArchiveMember>,
{
    let mut hasher = Md4::new();
    for member in members {
        if member.size > 0 {
            hasher.update(member.crc32.to_le_bytes());
        }
    }
    fold_md4(hasher.finalize().as_slice())
}

fn fold_md4(digest: &[u8]) -> Fingerprint {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(digest);
    reduce16to4(&bytes)
}
