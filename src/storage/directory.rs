//! A filesystem backed record store.
//!
//! Each kind of record is kept in one YAML file under the root directory:
//! `individuals.yaml` and `families.yaml`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{RecordKind, RecordStore, Records};

/// A record store backed by YAML files in a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Opens a store rooted at the given directory.
    ///
    /// Nothing is read until records are loaded. The directory is created on
    /// the first save if it does not exist.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The directory records are stored in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file holding records of the given kind.
    #[must_use]
    pub fn path(&self, kind: RecordKind) -> PathBuf {
        self.root.join(file_name(kind))
    }
}

const fn file_name(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Individual => "individuals.yaml",
        RecordKind::FamilyUnit => "families.yaml",
    }
}

impl RecordStore for DirectoryStore {
    type Error = DirectoryStoreError;

    fn load_all(&self, kind: RecordKind) -> Result<Records, Self::Error> {
        let path = self.path(kind);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no saved {kind}");
                return Ok(Records::empty(kind));
            }
            Err(source) => return Err(DirectoryStoreError::Io { path, source }),
        };

        let yaml_error = |source| DirectoryStoreError::Yaml {
            path: path.clone(),
            source,
        };
        let records = match kind {
            RecordKind::Individual => Records::Individuals(
                serde_yaml::from_str::<Envelope<_>>(&content)
                    .map_err(yaml_error)?
                    .into_records(),
            ),
            RecordKind::FamilyUnit => Records::Families(
                serde_yaml::from_str::<Envelope<_>>(&content)
                    .map_err(yaml_error)?
                    .into_records(),
            ),
        };

        tracing::debug!(path = %path.display(), count = records.len(), "loaded {kind}");
        Ok(records)
    }

    fn replace_all(&mut self, records: Records) -> Result<(), Self::Error> {
        let kind = records.kind();
        let path = self.path(kind);
        let saved = Utc::now();

        let content = match records {
            Records::Individuals(records) => {
                serde_yaml::to_string(&Envelope::V1 { saved, records })
            }
            Records::Families(records) => serde_yaml::to_string(&Envelope::V1 { saved, records }),
        }
        .map_err(|source| DirectoryStoreError::Yaml {
            path: path.clone(),
            source,
        })?;

        write_atomically(&self.root, &path, &content)
            .map_err(|source| DirectoryStoreError::Io { path, source })
    }
}

/// Writes to a sibling temporary file and renames it over the target, so a
/// failed write leaves the previous file intact.
fn write_atomically(root: &Path, path: &Path, content: &str) -> io::Result<()> {
    fs::create_dir_all(root)?;
    let staging = path.with_extension("yaml.tmp");
    fs::write(&staging, content)?;
    fs::rename(&staging, path)
}

/// The on-disk representation of a record file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Envelope<T> {
    #[serde(rename = "1")]
    V1 {
        saved: DateTime<Utc>,
        #[serde(default = "Vec::new")]
        records: Vec<T>,
    },
}

impl<T> Envelope<T> {
    fn into_records(self) -> Vec<T> {
        match self {
            Self::V1 { records, .. } => records,
        }
    }
}

/// An error reading or writing a record file.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryStoreError {
    /// The file could not be read or written.
    #[error("failed to access {path}")]
    Io {
        /// The record file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The file contents are not valid.
    #[error("invalid record file {path}")]
    Yaml {
        /// The record file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_yaml::Error,
    },
}
