use std::fmt;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Reference to a video the user picked. The file itself is only read on upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAsset {
    id: Uuid,
    uri: PathBuf,
}

impl VideoAsset {
    pub fn new(uri: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            uri: uri.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn uri(&self) -> &Path {
        &self.uri
    }
}

impl fmt::Display for VideoAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri.display())
    }
}
