use compat_quake::checksum::Fingerprint;
use compat_quake::diagnostic::DiagnosticSink;
use serde::Serialize;

use crate::classify::{classify, ReportedMap};
use crate::error::SurveyError;
use crate::model::{ArchiveEntities, Survey};

/// Renderer input for one surveyed file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    Map(ReportedMap),
    Archive(ArchiveReport),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArchiveReport {
    pub archive_name: String,
    pub fingerprint: Fingerprint,
    pub maps: Vec<ReportedMap>,
    pub failures: Vec<FailureSummary>,
}

impl ArchiveReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A map that was left out of an archive report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailureSummary {
    pub map_name: String,
    pub kind: &'static str,
    pub error: String,
}

impl FailureSummary {
    fn new(map_name: &str, error: &SurveyError) -> Self {
        Self {
            map_name: map_name.to_string(),
            kind: error.kind().as_str(),
            error: error.to_string(),
        }
    }
}

/// Classifies every map of a survey.
///
/// A standalone map that cannot be classified fails the whole report. Inside
/// an archive each map stands alone: failures are listed next to the maps
/// that did classify.
pub fn build_report<S: DiagnosticSink>(
    survey: &Survey,
    mut sink: S,
) -> Result<Report, SurveyError> {
    match survey {
        Survey::Map(map) => classify(map, &mut sink).map(Report::Map),
        Survey::Archive(archive) => Ok(Report::Archive(archive_report(archive, &mut sink))),
    }
}

fn archive_report<S: DiagnosticSink>(archive: &ArchiveEntities, sink: &mut S) -> ArchiveReport {
    let mut failures: Vec<FailureSummary> = archive
        .failures
        .iter()
        .map(|failure| FailureSummary::new(&failure.map_name, &failure.error))
        .collect();
    let mut maps = Vec::with_capacity(archive.maps.len());
    for map in &archive.maps {
        match classify(map, &mut *sink) {
            Ok(reported) => maps.push(reported),
            Err(err) => {
                tracing::error!(archive = %archive.archive_name, map = %map.map_name, "{}", err);
                failures.push(FailureSummary::new(&map.map_name, &err));
            }
        }
    }
    ArchiveReport {
        archive_name: archive.archive_name.clone(),
        fingerprint: archive.fingerprint,
        maps,
        failures,
    }
}
