//! Data models for the collection pipeline.

mod document;
mod progress;
mod run;
mod source;

pub use document::{Document, DocumentVersion, FileType};
pub use progress::{ProgressRecord, ProgressStatus};
pub use run::{CollectionLog, CollectionRun, LogStatus, RunOutcome, UrlOutcome, UrlOutcomeKind};
pub use source::{CollectionSource, SourceType};
