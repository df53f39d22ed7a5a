use std::path::PathBuf;

use compat_quake::bsp_q3::BspError;
use compat_quake::entities::EntityError;
use thiserror::Error;

/// Failure of one unit of work: a file, an archive, or a map inside one.
#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("pk3 error on {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("unknown file type: {}", .0.display())]
    UnknownFileType(PathBuf),
    #[error("{map}: {source}")]
    Bsp {
        map: String,
        #[source]
        source: BspError,
    },
    #[error("{map}: {source}")]
    Entities {
        map: String,
        #[source]
        source: EntityError,
    },
    #[error("no worldspawn for {map}")]
    NoWorldspawn { map: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Io,
    Unsupported,
    Format,
    Encoding,
    Parse,
    Data,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Io => "io",
            FailureKind::Unsupported => "unsupported",
            FailureKind::Format => "format",
            FailureKind::Encoding => "encoding",
            FailureKind::Parse => "parse",
            FailureKind::Data => "data",
        }
    }
}

impl SurveyError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SurveyError::Io { .. } | SurveyError::Walk(_) => FailureKind::Io,
            SurveyError::Archive { .. } => FailureKind::Format,
            SurveyError::UnknownFileType(_) => FailureKind::Unsupported,
            SurveyError::Bsp { .. } => FailureKind::Format,
            SurveyError::Entities {
                source: EntityError::NotAscii { .. },
                ..
            } => FailureKind::Encoding,
            SurveyError::Entities { .. } => FailureKind::Parse,
            SurveyError::NoWorldspawn { .. } => FailureKind::Data,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SurveyError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn archive(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        SurveyError::Archive {
            path: path.into(),
            source,
        }
    }
}
