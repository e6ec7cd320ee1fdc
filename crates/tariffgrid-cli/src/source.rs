//! Record source backed by JSON files under the data directory.
//!
//! ```text
//! <data_dir>/directory.json
//! <data_dir>/hours/<date>/subject-<id>.json
//! <data_dir>/hours/<date>/object-<id>.json
//! <data_dir>/statuses/<date>/subject-<id>.json
//! <data_dir>/statuses/<date>/object-<id>.json
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use tariffgrid_core::fetch::Target;
use tariffgrid_core::{dates, Directory, FetchError, HourRecord, ObjectId, RecordSource, StatusMap, SubjectId};
use tariffgrid_parser::{decode_directory, decode_hours, decode_statuses};

#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file(&self, kind: &str, date: NaiveDate, target: Target) -> PathBuf {
        let name = match target {
            Target::Subject(id) => format!("subject-{id}.json"),
            Target::Object(id) => format!("object-{id}.json"),
        };
        self.root
            .join(kind)
            .join(date.format(dates::FORMAT).to_string())
            .join(name)
    }

    async fn read(&self, path: &Path) -> Result<String, FetchError> {
        debug!(path = %path.display(), "reading");
        Ok(tokio::fs::read_to_string(path).await?)
    }

    async fn hours(&self, date: NaiveDate, target: Target) -> Result<Vec<HourRecord>, FetchError> {
        let content = self.read(&self.file("hours", date, target)).await?;
        decode_hours(&content).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// Subject and object names; an absent file is an empty directory
    pub async fn directory(&self) -> Result<Directory, FetchError> {
        let path = self.root.join("directory.json");
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => decode_directory(&content).map_err(|e| FetchError::Decode(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "no directory file, names fall back to ids");
                Ok(Directory::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl RecordSource for DirectorySource {
    async fn subject_hours(
        &self,
        date: NaiveDate,
        subject: SubjectId,
    ) -> Result<Vec<HourRecord>, FetchError> {
        self.hours(date, Target::Subject(subject)).await
    }

    async fn object_hours(
        &self,
        date: NaiveDate,
        object: ObjectId,
    ) -> Result<Vec<HourRecord>, FetchError> {
        self.hours(date, Target::Object(object)).await
    }

    async fn statuses(&self, date: NaiveDate, target: Target) -> Result<StatusMap, FetchError> {
        let content = self.read(&self.file("statuses", date, target)).await?;
        decode_statuses(&content).map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn name(&self) -> &str {
        "directory"
    }
}
