//! Turns command line paths into [`Survey`] values.
//!
//! Directories are walked for archives only. A file argument is read as an
//! archive when its extension says so, or as a standalone `.bsp` map.

use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use compat_quake::bsp_q3::entities_lump;
use compat_quake::checksum::{archive_fingerprint, map_fingerprint, ArchiveMember, Fingerprint};
use compat_quake::diagnostic::DiagnosticSink;
use compat_quake::entities::read_entities;
use walkdir::WalkDir;
use zip::read::ZipArchive;

use crate::config::ScanConfig;
use crate::error::SurveyError;
use crate::model::{ArchiveEntities, MapEntities, MapFailure, Survey};

const PK3_EXTENSION: &str = "pk3";
const BSP_SUFFIX: &str = ".bsp";
const MAPS_PREFIX: &str = "maps/";
/// Upper bound on buffer space reserved from a declared member size.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Archive,
    Map,
}

impl InputKind {
    pub fn of(path: &Path, scan: &ScanConfig) -> Option<Self> {
        let ext = path.extension().and_then(|ext| ext.to_str())?;
        if ext.eq_ignore_ascii_case(PK3_EXTENSION) || scan.matches_extension(path) {
            Some(InputKind::Archive)
        } else if ext.eq_ignore_ascii_case(&BSP_SUFFIX[1..]) {
            Some(InputKind::Map)
        } else {
            None
        }
    }
}

/// Expands directory arguments into the archives below them, keeping
/// argument order. Walk errors are returned in place of the entry.
pub fn collect_inputs<P: AsRef<Path>>(
    paths: &[P],
    scan: &ScanConfig,
) -> Vec<Result<PathBuf, SurveyError>> {
    let mut inputs = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if !path.is_dir() {
            inputs.push(Ok(path.to_path_buf()));
            continue;
        }
        let walker = WalkDir::new(path)
            .follow_links(scan.follow_links)
            .sort_by_file_name();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && scan.matches_extension(entry.path()) {
                        inputs.push(Ok(entry.into_path()));
                    }
                }
                Err(err) => inputs.push(Err(SurveyError::Walk(err))),
            }
        }
    }
    inputs
}

pub fn survey_paths<P, S>(
    paths: &[P],
    scan: &ScanConfig,
    mut sink: S,
) -> Vec<Result<Survey, SurveyError>>
where
    P: AsRef<Path>,
    S: DiagnosticSink,
{
    collect_inputs(paths, scan)
        .into_iter()
        .map(|input| input.and_then(|path| survey_file(&path, scan, &mut sink)))
        .collect()
}

pub fn survey_file<S: DiagnosticSink>(
    path: &Path,
    scan: &ScanConfig,
    sink: S,
) -> Result<Survey, SurveyError> {
    match InputKind::of(path, scan) {
        Some(InputKind::Archive) => {
            tracing::info!(path = %path.display(), "processing pk3");
            read_archive(path, sink).map(Survey::Archive)
        }
        Some(InputKind::Map) => {
            tracing::info!(path = %path.display(), "processing bsp");
            read_map_file(path, sink).map(Survey::Map)
        }
        None => Err(SurveyError::UnknownFileType(path.to_path_buf())),
    }
}

/// Reads a standalone map. Its name is the path without the `.bsp` suffix.
pub fn read_map_file<S: DiagnosticSink>(path: &Path, sink: S) -> Result<MapEntities, SurveyError> {
    let data = fs::read(path).map_err(|err| SurveyError::io(path, err))?;
    let display = path.to_string_lossy();
    let name = strip_suffix_ignore_case(&display, BSP_SUFFIX);
    map_entities(name, &data, sink)
}

/// Fingerprints a map image and parses its entity lump.
pub fn map_entities<S: DiagnosticSink>(
    name: &str,
    data: &[u8],
    sink: S,
) -> Result<MapEntities, SurveyError> {
    let _span = tracing::debug_span!("map", name = %name).entered();
    let fingerprint = map_fingerprint(data);
    let lump = entities_lump(data).map_err(|source| SurveyError::Bsp {
        map: name.to_string(),
        source,
    })?;
    tracing::debug!(bsp_size = data.len(), lump_len = lump.len(), "entities lump located");
    let entities = read_entities(lump, sink).map_err(|source| SurveyError::Entities {
        map: name.to_string(),
        source,
    })?;
    tracing::debug!(records = entities.len(), %fingerprint, "entities parsed");
    Ok(MapEntities {
        map_name: name.to_string(),
        fingerprint,
        entities,
    })
}

pub fn read_archive<S: DiagnosticSink>(
    path: &Path,
    sink: S,
) -> Result<ArchiveEntities, SurveyError> {
    let file = fs::File::open(path).map_err(|err| SurveyError::io(path, err))?;
    survey_archive(path, file, sink)
}

/// Reads every `maps/*.bsp` member of an archive. A map that fails is
/// recorded in `failures` and the remaining maps are still read.
pub fn survey_archive<R, S>(
    path: &Path,
    reader: R,
    mut sink: S,
) -> Result<ArchiveEntities, SurveyError>
where
    R: Read + Seek,
    S: DiagnosticSink,
{
    let mut archive = ZipArchive::new(reader).map_err(|err| SurveyError::archive(path, err))?;
    let members = archive_members(path, &mut archive)?;
    let fingerprint = archive_fingerprint(members.iter().map(|(member, _)| *member));
    let map_entries: Vec<(usize, String)> = members
        .iter()
        .enumerate()
        .filter_map(|(index, (_, name))| {
            archive_map_name(name).map(|map_name| (index, map_name.to_string()))
        })
        .collect();
    tracing::debug!(
        archive = %path.display(),
        maps = ?map_entries.iter().map(|(_, name)| name.as_str()).collect::<Vec<_>>(),
        "archive maps"
    );

    let mut maps = Vec::with_capacity(map_entries.len());
    let mut failures = Vec::new();
    for (index, map_name) in map_entries {
        tracing::info!(archive = %path.display(), map = %map_name, "processing pk3 map");
        match read_archive_map(path, &mut archive, index, &map_name, &mut sink) {
            Ok(map) => maps.push(map),
            Err(error) => {
                tracing::error!(archive = %path.display(), map = %map_name, "{}", error);
                failures.push(MapFailure { map_name, error });
            }
        }
    }
    Ok(ArchiveEntities {
        archive_name: path.display().to_string(),
        fingerprint,
        maps,
        failures,
    })
}

fn read_archive_map<R, S>(
    path: &Path,
    archive: &mut ZipArchive<R>,
    index: usize,
    map_name: &str,
    sink: S,
) -> Result<MapEntities, SurveyError>
where
    R: Read + Seek,
    S: DiagnosticSink,
{
    let mut entry = archive
        .by_index(index)
        .map_err(|err| SurveyError::archive(path, err))?;
    let mut data = Vec::with_capacity(entry.size().min(MAX_PREALLOC) as usize);
    entry
        .read_to_end(&mut data)
        .map_err(|err| SurveyError::io(path, err))?;
    map_entities(map_name, &data, sink)
}

/// Central directory facts and names, in on-disk order. Members are not
/// decompressed, so unsupported methods still contribute to the checksum.
fn archive_members<R: Read + Seek>(
    path: &Path,
    archive: &mut ZipArchive<R>,
) -> Result<Vec<(ArchiveMember, String)>, SurveyError> {
    let mut members = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive
            .by_index_raw(index)
            .map_err(|err| SurveyError::archive(path, err))?;
        members.push((
            ArchiveMember {
                crc32: entry.crc32(),
                size: entry.size(),
            },
            entry.name().to_string(),
        ));
    }
    Ok(members)
}

/// Fingerprint of an input without parsing any entities.
pub fn fingerprint_file(path: &Path, scan: &ScanConfig) -> Result<Fingerprint, SurveyError> {
    match InputKind::of(path, scan) {
        Some(InputKind::Archive) => {
            let file = fs::File::open(path).map_err(|err| SurveyError::io(path, err))?;
            let mut archive =
                ZipArchive::new(file).map_err(|err| SurveyError::archive(path, err))?;
            let members = archive_members(path, &mut archive)?;
            Ok(archive_fingerprint(
                members.into_iter().map(|(member, _)| member),
            ))
        }
        Some(InputKind::Map) => {
            let data = fs::read(path).map_err(|err| SurveyError::io(path, err))?;
            Ok(map_fingerprint(&data))
        }
        None => Err(SurveyError::UnknownFileType(path.to_path_buf())),
    }
}

/// Map name for an archive member stored as `maps/<name>.bsp`.
///
/// Both the directory and the suffix match case-insensitively; `<name>` must
/// be non-empty and must not contain a dot.
pub fn archive_map_name(entry: &str) -> Option<&str> {
    let prefix = entry.get(..MAPS_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(MAPS_PREFIX) {
        return None;
    }
    let rest = &entry[MAPS_PREFIX.len()..];
    let split = rest.len().checked_sub(BSP_SUFFIX.len())?;
    let suffix = rest.get(split..)?;
    if !suffix.eq_ignore_ascii_case(BSP_SUFFIX) {
        return None;
    }
    let name = &rest[..split];
    if name.is_empty() || name.contains('.') {
        return None;
    }
    Some(name)
}

pub fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> &'a str {
    let Some(split) = value.len().checked_sub(suffix.len()) else {
        return value;
    };
    match value.get(split..) {
        Some(tail) if tail.eq_ignore_ascii_case(suffix) => &value[..split],
        _ => value,
    }
}
