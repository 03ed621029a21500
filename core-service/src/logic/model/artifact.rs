//! Model Artifact - on-disk format and load checks
//!
//! Native artifacts are gzip-compressed JSON documents carrying the feature
//! layout they were trained against plus the estimator tree. Plain JSON is
//! accepted as well; gzip is detected from the magic bytes.
//!
//! Every failure here is permanent for the given file, so loading never
//! retries.

use std::borrow::Cow;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::ensemble::{Estimator, ModelValidationError};
use crate::constants::{ARTIFACT_FORMAT, ARTIFACT_FORMAT_VERSION, CHECKSUM_SIDECAR_EXT};
use crate::logic::features::{LayoutInfo, LayoutMismatchError};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// The artifact cannot back a Model Handle; fatal at startup
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("model artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read model artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("model artifact is corrupt: {0}")]
    Corrupt(String),

    #[error("model artifact is incompatible: {0}")]
    Incompatible(String),

    #[error("model artifact was trained on another feature layout: {0}")]
    LayoutMismatch(#[from] LayoutMismatchError),

    #[error("model artifact is invalid at {0}")]
    Invalid(#[from] ModelValidationError),

    #[error("model artifact checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("unsupported model artifact: {0}")]
    Unsupported(String),
}

// ============================================================================
// ARTIFACT KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Native JSON ensemble (`*.json`, `*.json.gz`, anything else)
    Native,
    /// ONNX graph (`*.onnx`, `*.onnx.gz`)
    Onnx,
}

impl ArtifactKind {
    pub fn detect(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if name.ends_with(".onnx") || name.ends_with(".onnx.gz") {
            ArtifactKind::Onnx
        } else {
            ArtifactKind::Native
        }
    }
}

// ============================================================================
// NATIVE ARTIFACT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format: String,
    pub format_version: u32,
    pub layout: LayoutInfo,
    pub name: String,
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    pub model: Estimator,
}

impl ModelArtifact {
    /// Wrap an estimator with the current format and layout
    pub fn new(name: impl Into<String>, model: Estimator) -> Self {
        Self {
            format: ARTIFACT_FORMAT.to_string(),
            format_version: ARTIFACT_FORMAT_VERSION,
            layout: LayoutInfo::current(),
            name: name.into(),
            trained_at: None,
            model,
        }
    }

    /// Parse and check an artifact from raw (optionally gzipped) bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactLoadError> {
        let payload = decompress(bytes)?;

        // Check the envelope before the estimator so that a newer format
        // reports as incompatible rather than as a schema error
        let envelope: Envelope = serde_json::from_slice(&payload)
            .map_err(|e| ArtifactLoadError::Corrupt(e.to_string()))?;

        if envelope.format != ARTIFACT_FORMAT {
            return Err(ArtifactLoadError::Incompatible(format!(
                "format tag {:?}, expected {:?}",
                envelope.format, ARTIFACT_FORMAT
            )));
        }
        if envelope.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactLoadError::Incompatible(format!(
                "format version {}, this build reads {}",
                envelope.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        envelope.layout.validate()?;

        let artifact: ModelArtifact = serde_json::from_slice(&payload)
            .map_err(|e| ArtifactLoadError::Corrupt(e.to_string()))?;
        artifact.model.validate("model")?;

        Ok(artifact)
    }

    /// Read and check an artifact file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactLoadError> {
        let path = path.as_ref();
        Self::from_bytes(&read_artifact(path)?)
    }

    /// Write the gzip form
    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_vec(self)?;
        let file = fs::File::create(path)?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(&json)?;
        encoder.finish()?;
        Ok(())
    }
}

/// The part of an artifact every format version shares
#[derive(Deserialize)]
struct Envelope {
    format: String,
    format_version: u32,
    layout: LayoutInfo,
}

// ============================================================================
// HELPERS
// ============================================================================

/// Read the raw artifact bytes, separating "missing" from other IO failures
pub fn read_artifact(path: &Path) -> Result<Vec<u8>, ArtifactLoadError> {
    fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ArtifactLoadError::NotFound(path.to_path_buf())
        } else {
            ArtifactLoadError::Io { path: path.to_path_buf(), source }
        }
    })
}

/// Inflate gzip data; pass anything else through untouched
pub fn decompress(bytes: &[u8]) -> Result<Cow<'_, [u8]>, ArtifactLoadError> {
    if bytes.len() >= 2 && bytes[..2] == GZIP_MAGIC {
        let mut decoder = GzDecoder::new(bytes);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| ArtifactLoadError::Corrupt(format!("gzip: {}", e)))?;
        Ok(Cow::Owned(out))
    } else {
        Ok(Cow::Borrowed(bytes))
    }
}

/// Lowercase hex SHA-256 of the artifact bytes
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Compare a digest with an expected value (`sha256sum` line format accepted)
pub fn verify_checksum(actual: &str, expected: &str) -> Result<(), ArtifactLoadError> {
    let expected = expected
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    if expected != actual.to_ascii_lowercase() {
        return Err(ArtifactLoadError::ChecksumMismatch {
            expected,
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Path of the checksum file next to an artifact
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(CHECKSUM_SIDECAR_EXT);
    PathBuf::from(name)
}

/// Expected digest from `<artifact>.sha256`, if that file exists
pub fn read_sidecar(path: &Path) -> Result<Option<String>, ArtifactLoadError> {
    let sidecar = sidecar_path(path);
    match fs::read_to_string(&sidecar) {
        Ok(content) => Ok(Some(content.trim().to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ArtifactLoadError::Io { path: sidecar, source }),
    }
}
