//! Camera identity.

use crate::error::StoreError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Letters, digits, dot, underscore, dash; no leading dot
const CAMERA_ID_PATTERN: &str = r"^[A-Za-z0-9_-][A-Za-z0-9._-]*$";

/// Identifier of one camera, also used as its snapshot file stem
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CameraId(String);

impl CameraId {
    /// Validate and wrap a camera id
    pub fn new(id: &str) -> Result<Self, StoreError> {
        let valid = Regex::new(CAMERA_ID_PATTERN)
            .map(|pattern| pattern.is_match(id))
            .unwrap_or(false);
        if !valid {
            return Err(StoreError::InvalidCameraId { id: id.to_string() });
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CameraId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CameraId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for CameraId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CameraId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CameraId> for String {
    fn from(id: CameraId) -> Self {
        id.0
    }
}
