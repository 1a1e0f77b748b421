//! Error taxonomy for every Service operation

use std::path::{Path, PathBuf};

/// Errors returned by the instance-management layer
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("service not initialized at {}", .0.display())]
    NotInitialized(PathBuf),

    #[error("{file}: {message}")]
    ConfigInvalid { file: String, message: String },

    #[error("service already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("holochain: {} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("No DNA file in {}/", .0.display())]
    NoDnaFile(PathBuf),

    #[error("unable to load agent from {}: {reason}", .path.display())]
    AgentLoadFailure { path: PathBuf, reason: String },

    #[error("copy {} -> {}: {source}", .from.display(), .to.display())]
    CopyFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scaffold version mismatch: expected {expected}, found {found}")]
    ScaffoldVersionMismatch { expected: String, found: String },

    #[error("invalid override {key}={value:?}: {reason}")]
    EnvOverrideParse {
        key: String,
        value: String,
        reason: String,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {message}", .path.display())]
    Decode { path: PathBuf, message: String },

    #[error("encoding error: {0}")]
    Encode(String),

    #[error("unknown encoding format: {0}")]
    InvalidFormat(String),

    #[error("invalid instance path: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("DNA changed since the chain was started: recorded {recorded}, current {current}")]
    DnaHashMismatch { recorded: String, current: String },
}

impl ServiceError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        ServiceError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn decode(path: impl AsRef<Path>, message: impl ToString) -> Self {
        ServiceError::Decode {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_message() {
        let err = ServiceError::AlreadyExists(PathBuf::from("/tmp/x/test"));
        assert_eq!(err.to_string(), "holochain: /tmp/x/test already exists");
    }

    #[test]
    fn test_no_dna_file_message() {
        let err = ServiceError::NoDnaFile(PathBuf::from("/tmp/x/test/dna"));
        assert_eq!(err.to_string(), "No DNA file in /tmp/x/test/dna/");
    }

    #[test]
    fn test_copy_failure_keeps_source() {
        use std::error::Error;
        let err = ServiceError::CopyFailure {
            from: "a".into(),
            to: "b".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().starts_with("copy a -> b"));
        assert!(err.source().is_some());
    }
}
