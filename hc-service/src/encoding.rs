//! Serialization formats for DNA descriptors and instance config
//!
//! A chain picks its format once, at generation time. Auxiliary assets
//! (schemas, scenarios, test sets) are always JSON and never go through here.

use crate::error::{ServiceError, ServiceResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Closed set of supported descriptor encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingFormat {
    Json,
    Toml,
}

impl EncodingFormat {
    /// Detection order when probing an instance directory
    pub const ALL: [EncodingFormat; 2] = [EncodingFormat::Json, EncodingFormat::Toml];

    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Json => "json",
            EncodingFormat::Toml => "toml",
        }
    }

    /// `<stem>.<ext>`
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.extension())
    }

    pub fn path_in(&self, dir: &Path, stem: &str) -> PathBuf {
        dir.join(self.file_name(stem))
    }

    pub fn encode<T: Serialize>(&self, value: &T) -> ServiceResult<String> {
        match self {
            EncodingFormat::Json => {
                serde_json::to_string_pretty(value).map_err(|e| ServiceError::Encode(e.to_string()))
            }
            EncodingFormat::Toml => {
                toml::to_string_pretty(value).map_err(|e| ServiceError::Encode(e.to_string()))
            }
        }
    }

    /// Decode `text`, naming `origin` in any error
    pub fn decode<T: DeserializeOwned>(&self, text: &str, origin: &Path) -> ServiceResult<T> {
        match self {
            EncodingFormat::Json => {
                serde_json::from_str(text).map_err(|e| ServiceError::decode(origin, e))
            }
            EncodingFormat::Toml => toml::from_str(text).map_err(|e| ServiceError::decode(origin, e)),
        }
    }

    /// Read and decode `<dir>/<stem>.<ext>`
    pub fn read<T: DeserializeOwned>(&self, dir: &Path, stem: &str) -> ServiceResult<T> {
        let path = self.path_in(dir, stem);
        let text = std::fs::read_to_string(&path).map_err(|e| ServiceError::io(&path, e))?;
        self.decode(&text, &path)
    }

    /// Encode and write `<dir>/<stem>.<ext>`, returning the written path
    pub fn write<T: Serialize>(&self, dir: &Path, stem: &str, value: &T) -> ServiceResult<PathBuf> {
        let path = self.path_in(dir, stem);
        let text = self.encode(value)?;
        std::fs::write(&path, text).map_err(|e| ServiceError::io(&path, e))?;
        Ok(path)
    }

    /// First format whose `<dir>/<stem>.<ext>` is a regular file
    pub fn detect(dir: &Path, stem: &str) -> Option<EncodingFormat> {
        Self::ALL
            .into_iter()
            .find(|format| format.path_in(dir, stem).is_file())
    }
}

impl fmt::Display for EncodingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for EncodingFormat {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(EncodingFormat::Json),
            "toml" => Ok(EncodingFormat::Toml),
            other => Err(ServiceError::InvalidFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        port: u16,
        tags: BTreeMap<String, String>,
    }

    fn sample() -> Sample {
        let mut tags = BTreeMap::new();
        tags.insert("language".to_string(), "en".to_string());
        Sample { name: "chain".into(), port: 6283, tags }
    }

    fn test_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hc-encoding-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("json".parse::<EncodingFormat>().unwrap(), EncodingFormat::Json);
        assert_eq!("TOML".parse::<EncodingFormat>().unwrap(), EncodingFormat::Toml);
        assert!(matches!(
            "yaml".parse::<EncodingFormat>(),
            Err(ServiceError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_write_then_detect() {
        let dir = test_dir();
        EncodingFormat::Toml.write(&dir, "config", &sample()).unwrap();
        assert_eq!(EncodingFormat::detect(&dir, "config"), Some(EncodingFormat::Toml));
        assert_eq!(EncodingFormat::detect(&dir, "dna"), None);

        let back: Sample = EncodingFormat::Toml.read(&dir, "config").unwrap();
        assert_eq!(back, sample());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_decode_error_names_path() {
        let err = EncodingFormat::Json
            .decode::<Sample>("{not json", Path::new("/x/dna.json"))
            .unwrap_err();
        assert!(err.to_string().starts_with("/x/dna.json: "));
    }
}
