//! Central Configuration Constants
//!
//! Single source of truth for defaults shared by the core and the form server.

/// App name
pub const APP_NAME: &str = "Timelytics";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default model artifact path (gzip-compressed JSON ensemble)
pub const DEFAULT_MODEL_PATH: &str = "voting_model.json.gz";

/// Format tag written into every native artifact
pub const ARTIFACT_FORMAT: &str = "timelytics-model";

/// Native artifact format version
/// MUST be incremented when the estimator schema changes incompatibly
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Extension of the optional checksum file next to an artifact
/// (`voting_model.json.gz.sha256`, `sha256sum` output format accepted)
pub const CHECKSUM_SIDECAR_EXT: &str = "sha256";
