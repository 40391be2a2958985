//! Snapshot storage.

use super::CameraId;
use crate::error::StoreError;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffix of diagnostic images written next to test snapshots
pub const DIAGNOSTIC_SUFFIX: &str = "-result";

const SNAPSHOT_EXTENSION: &str = "jpg";
const DIAGNOSTIC_QUALITY: u8 = 90;

/// Trait for snapshot backends
pub trait SnapshotStore: Send + Sync {
    /// Cameras that currently have a test snapshot, sorted
    fn list_cameras(&self) -> Result<Vec<CameraId>, StoreError>;

    /// Encoded reference snapshot, if one was ever saved
    fn load_reference(&self, camera: &CameraId) -> Result<Option<Vec<u8>>, StoreError>;

    /// Encoded test snapshot from the current round, if any
    fn load_candidate(&self, camera: &CameraId) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the reference snapshot
    fn save_reference(&self, camera: &CameraId, bytes: &[u8]) -> Result<(), StoreError>;

    /// Store the match diagnostic for a camera
    fn save_diagnostic(&self, camera: &CameraId, image: &RgbImage) -> Result<(), StoreError>;
}

/// Copy the current test snapshot over the reference.
///
/// Used after a camera was deliberately moved so the new view becomes the
/// baseline.
pub fn promote_candidate(store: &dyn SnapshotStore, camera: &CameraId) -> Result<(), StoreError> {
    let bytes = store
        .load_candidate(camera)?
        .ok_or_else(|| StoreError::MissingSnapshot {
            camera: camera.to_string(),
        })?;
    store.save_reference(camera, &bytes)?;
    tracing::info!(%camera, "promoted test snapshot to reference");
    Ok(())
}

/// Snapshots kept as JPEG files in two directories:
///
/// ```text
/// <root>/referenceImages/<camera>.jpg
/// <root>/testImages/<camera>.jpg
/// <root>/testImages/<camera>-result.jpg
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    reference_dir: PathBuf,
    test_dir: PathBuf,
}

impl DirectoryStore {
    /// Store using the default directory names under `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::with_dirs(root, "referenceImages", "testImages")
    }

    /// Store with custom directory names, relative to `root`
    pub fn with_dirs(
        root: impl AsRef<Path>,
        reference_dir: impl AsRef<Path>,
        test_dir: impl AsRef<Path>,
    ) -> Self {
        let root = root.as_ref();
        Self {
            reference_dir: root.join(reference_dir),
            test_dir: root.join(test_dir),
        }
    }

    pub fn reference_dir(&self) -> &Path {
        &self.reference_dir
    }

    pub fn test_dir(&self) -> &Path {
        &self.test_dir
    }

    pub fn reference_path(&self, camera: &CameraId) -> PathBuf {
        self.reference_dir
            .join(format!("{}.{}", camera, SNAPSHOT_EXTENSION))
    }

    pub fn candidate_path(&self, camera: &CameraId) -> PathBuf {
        self.test_dir.join(format!("{}.{}", camera, SNAPSHOT_EXTENSION))
    }

    pub fn diagnostic_path(&self, camera: &CameraId) -> PathBuf {
        self.test_dir
            .join(format!("{}{}.{}", camera, DIAGNOSTIC_SUFFIX, SNAPSHOT_EXTENSION))
    }

    fn camera_from_path(path: &Path) -> Option<CameraId> {
        let extension = path.extension()?.to_str()?;
        if extension != SNAPSHOT_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        if stem.ends_with(DIAGNOSTIC_SUFFIX) {
            return None;
        }
        CameraId::new(stem).ok()
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(dir).map_err(|source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

impl SnapshotStore for DirectoryStore {
    fn list_cameras(&self) -> Result<Vec<CameraId>, StoreError> {
        if !self.test_dir.is_dir() {
            return Err(StoreError::DirectoryNotFound {
                path: self.test_dir.clone(),
            });
        }

        let mut cameras = Vec::new();
        for entry in WalkDir::new(&self.test_dir).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry in {}: {}", self.test_dir.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match Self::camera_from_path(entry.path()) {
                Some(camera) => cameras.push(camera),
                None => tracing::trace!(path = %entry.path().display(), "not a test snapshot"),
            }
        }

        cameras.sort();
        Ok(cameras)
    }

    fn load_reference(&self, camera: &CameraId) -> Result<Option<Vec<u8>>, StoreError> {
        read_optional(&self.reference_path(camera))
    }

    fn load_candidate(&self, camera: &CameraId) -> Result<Option<Vec<u8>>, StoreError> {
        read_optional(&self.candidate_path(camera))
    }

    fn save_reference(&self, camera: &CameraId, bytes: &[u8]) -> Result<(), StoreError> {
        ensure_dir(&self.reference_dir)?;
        let path = self.reference_path(camera);
        fs::write(&path, bytes).map_err(|source| StoreError::Io { path, source })
    }

    fn save_diagnostic(&self, camera: &CameraId, image: &RgbImage) -> Result<(), StoreError> {
        ensure_dir(&self.test_dir)?;
        let path = self.diagnostic_path(camera);
        let file = fs::File::create(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        write_jpeg(file, image, &path)
    }
}

/// Encode `image` as JPEG into a buffered `writer` and flush it
fn write_jpeg<W: Write>(writer: W, image: &RgbImage, path: &Path) -> Result<(), StoreError> {
    let failed = |reason: String| StoreError::DiagnosticWrite {
        path: path.to_path_buf(),
        reason,
    };

    let mut writer = BufWriter::new(writer);
    JpegEncoder::new_with_quality(&mut writer, DIAGNOSTIC_QUALITY)
        .encode_image(image)
        .map_err(|e| failed(e.to_string()))?;
    writer.flush().map_err(|e| failed(e.to_string()))
}
