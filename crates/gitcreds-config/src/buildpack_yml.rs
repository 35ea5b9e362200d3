//! Per-build credential declarations
//!
//! Read from `<working_dir>/buildpack.yml`:
//!
//! ```yaml
//! gitcredentials:
//!   credentials:
//!     - protocol: https
//!       host: example.com
//!       path: /foo.git
//!       username: username
//!       password: password
//!       url: https://example.com
//! ```

use crate::{ConfigError, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// File name of the per-build declarative file
pub const BUILDPACK_YML: &str = "buildpack.yml";

/// A credential record as written in `buildpack.yml`.
///
/// Every field is optional and defaults to the empty string.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclaredCredential {
    #[serde(deserialize_with = "scalar_string")]
    pub protocol: String,
    #[serde(deserialize_with = "scalar_string")]
    pub host: String,
    #[serde(deserialize_with = "scalar_string")]
    pub path: String,
    #[serde(deserialize_with = "scalar_string")]
    pub username: String,
    #[serde(deserialize_with = "scalar_string")]
    pub password: String,
    #[serde(deserialize_with = "scalar_string")]
    pub url: String,
}

impl std::fmt::Debug for DeclaredCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeclaredCredential")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("url", &self.url)
            .finish()
    }
}

/// The `gitcredentials` section of `buildpack.yml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildpackYml {
    #[serde(deserialize_with = "null_as_default")]
    pub credentials: Vec<DeclaredCredential>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Document {
    #[serde(deserialize_with = "null_as_default")]
    gitcredentials: BuildpackYml,
}

impl BuildpackYml {
    /// Parse `buildpack.yml` at `path`.
    ///
    /// A missing file, an empty document, or a document without a
    /// `gitcredentials` key yields no credentials.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No {:?} found, skipping declared credentials", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::ReadError {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let parsed = Self::parse(&content).map_err(|e| ConfigError::YamlParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        tracing::debug!(
            "Loaded {} declared credential(s) from {:?}",
            parsed.credentials.len(),
            path
        );

        Ok(parsed)
    }

    /// Parse `buildpack.yml` from the working directory
    pub fn load_from_dir(working_dir: &Path) -> Result<Self> {
        Self::load(&working_dir.join(BUILDPACK_YML))
    }

    fn parse(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let document: Option<Document> = serde_yaml::from_str(content)?;
        Ok(document.map(|d| d.gitcredentials).unwrap_or_default())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// YAML turns `password: 12345` into a number and `url:` into null; both are
/// accepted as strings.
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string, found {:?}",
            other
        ))),
    }
}
