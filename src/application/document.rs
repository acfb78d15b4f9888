//! YAML document holding a `blocker` collection
//!
//! Same shape for `get` output and `set` input:
//!
//! ```yaml
//! blocker:
//! - id: 5
//!   type: rate
//!   capacity: 100
//!   host: 10.0.0.2
//!   nextHop: 10.0.0.1
//!   port: '8080'
//! ```

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::application::error_ext::IoResultExt;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::Blocker;
use crate::infrastructure::traits::FileSystem;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockerDocument {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub blocker: Vec<Blocker>,
}

impl BlockerDocument {
    pub fn new(blocker: Vec<Blocker>) -> Self {
        Self { blocker }
    }

    pub fn is_empty(&self) -> bool {
        self.blocker.is_empty()
    }

    /// Parse YAML content. `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> ApplicationResult<Self> {
        serde_yaml::from_str(content).map_err(|source| ApplicationError::Document {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a document file.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> ApplicationResult<Self> {
        debug!("load: path={}", path.display());
        if !fs.exists(path) {
            return Err(ApplicationError::OperationFailed {
                context: format!("blocker file not found: {}", path.display()),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "file does not exist",
                )),
            });
        }
        let content = fs
            .read_to_string(path)
            .with_path_context("read blocker file", path)?;
        let doc = Self::parse(&content, path)?;
        debug!("load: {} records", doc.blocker.len());
        Ok(doc)
    }

    pub fn to_yaml(&self) -> ApplicationResult<String> {
        serde_yaml::to_string(self).map_err(|e| ApplicationError::OperationFailed {
            context: "serialize blocker document".into(),
            source: Box::new(e),
        })
    }
}

/// Serialize a single record, unwrapped, for per-record reports.
pub fn record_to_yaml(blocker: &Blocker) -> ApplicationResult<String> {
    serde_yaml::to_string(blocker).map_err(|e| ApplicationError::OperationFailed {
        context: format!("serialize blocker {}", blocker.id),
        source: Box::new(e),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Blocker>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Blocker>>::deserialize(deserializer)?.unwrap_or_default())
}
