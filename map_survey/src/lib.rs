//! Entity inventories for id Tech 3 maps and pk3 archives.
#![forbid(unsafe_code)]

pub mod classify;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod render;
pub mod report;
pub mod tables;

pub use classify::{classify, Capability, ClassCounts, Flags, ReportedMap};
pub use config::SurveyConfig;
pub use error::{FailureKind, SurveyError};
pub use model::{ArchiveEntities, MapEntities, MapFailure, Survey};
pub use report::{build_report, ArchiveReport, Report};
