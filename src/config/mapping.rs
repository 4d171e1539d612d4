//! Host/backend mapping document.
//!
//! The mapping is a YAML map of route key to backend descriptor:
//!
//! ```yaml
//! example.com:
//!   target: http://127.0.0.1:9000
//!   setcookiepath: true
//! any:
//!   target: /var/www/
//! ```
//!
//! The legacy form maps keys straight to target strings (`example.com: http://127.0.0.1:9000`).

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Mapping documents larger than this are rejected.
pub const MAX_MAPPING_BYTES: u64 = 1 << 20;

/// A routable destination and its forwarding options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Backend {
    /// URL, absolute directory, unix socket path, `@abstract` name or `host:port`.
    ///
    /// Missing targets decode as empty and are skipped when the mapping is applied.
    #[serde(default)]
    pub target: String,

    /// Rewrite the path of every `Set-Cookie` in backend responses to `/`.
    #[serde(
        default,
        rename = "setcookiepath",
        alias = "set_cookie_path",
        alias = "rewrite_cookie_path"
    )]
    pub set_cookie_path: bool,
}

impl Backend {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            set_cookie_path: false,
        }
    }

    pub fn with_cookie_path_rewrite(mut self) -> Self {
        self.set_cookie_path = true;
        self
    }
}

/// Route key → backend descriptor, as read from the mapping document.
pub type Mapping = HashMap<String, Backend>;

/// Error type for reading the mapping document.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("unable to read mapping: {0}")]
    Io(#[from] std::io::Error),

    #[error("mapping exceeds {MAX_MAPPING_BYTES} bytes")]
    TooLarge,

    #[error("unable to parse mapping: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Parse a mapping document, falling back to the legacy `key: target` form.
///
/// A blank document yields an empty mapping; rejecting it is up to the caller.
pub fn parse_mapping(content: &str) -> Result<Mapping, MappingError> {
    if content.trim().is_empty() {
        return Ok(Mapping::new());
    }

    match serde_yaml::from_str::<Mapping>(content) {
        Ok(mapping) => Ok(mapping),
        Err(err) => match serde_yaml::from_str::<HashMap<String, String>>(content) {
            Ok(legacy) => Ok(legacy
                .into_iter()
                .map(|(key, target)| (key, Backend::new(target)))
                .collect()),
            // Report the descriptor error; it names the entry that is actually wrong.
            Err(_) => Err(MappingError::Parse(err)),
        },
    }
}

/// Read and parse the mapping file at `path`.
pub fn read_mapping(path: &Path) -> Result<Mapping, MappingError> {
    let file = std::fs::File::open(path)?;
    let mut content = String::new();
    file.take(MAX_MAPPING_BYTES + 1).read_to_string(&mut content)?;
    if content.len() as u64 > MAX_MAPPING_BYTES {
        return Err(MappingError::TooLarge);
    }
    parse_mapping(&content)
}
