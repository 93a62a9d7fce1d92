//! Storage errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from durable coupon storage.
///
/// A failed mutation leaves both the in-memory map and the snapshot file
/// as they were before the call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid coupon snapshot {path}: {source}")]
    Serialization {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A durable store was used before `initialize()` or `load_from_file()`.
    #[error("coupon store at {path} is not initialized")]
    NotInitialized { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_initialized_display_names_path() {
        let err = StoreError::NotInitialized {
            path: PathBuf::from("/tmp/coupons.json"),
        };
        assert_eq!(
            err.to_string(),
            "coupon store at /tmp/coupons.json is not initialized"
        );
    }

    #[test]
    fn io_display_includes_source() {
        let err = StoreError::Io {
            path: PathBuf::from("/tmp/x"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("denied"));
    }
}
