use compat_quake::checksum::Fingerprint;
use compat_quake::entities::EntityRecord;

use crate::error::SurveyError;

/// One map and the valid entity records read from its entity lump.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapEntities {
    pub map_name: String,
    pub fingerprint: Fingerprint,
    pub entities: Vec<EntityRecord>,
}

/// A map inside an archive that could not be read.
#[derive(Debug)]
pub struct MapFailure {
    pub map_name: String,
    pub error: SurveyError,
}

/// A pk3 archive: its directory checksum and the maps stored under `maps/`,
/// in central directory order.
#[derive(Debug)]
pub struct ArchiveEntities {
    pub archive_name: String,
    pub fingerprint: Fingerprint,
    pub maps: Vec<MapEntities>,
    pub failures: Vec<MapFailure>,
}

/// The result of surveying one input file.
#[derive(Debug)]
pub enum Survey {
    Map(MapEntities),
    Archive(ArchiveEntities),
}

impl Survey {
    pub fn name(&self) -> &str {
        match self {
            Survey::Map(map) => &map.map_name,
            Survey::Archive(archive) => &archive.archive_name,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            Survey::Map(map) => map.fingerprint,
            Survey::Archive(archive) => archive.fingerprint,
        }
    }

    /// Every successfully read map, whether standalone or archived.
    pub fn maps(&self) -> &[MapEntities] {
        match self {
            Survey::Map(map) => std::slice::from_ref(map),
            Survey::Archive(archive) => &archive.maps,
        }
    }
}
