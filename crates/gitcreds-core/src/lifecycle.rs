//! Build plan and layer contracts exchanged with the buildpack lifecycle

use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name used for the build plan entry and the layer
pub const GITCREDENTIALS: &str = "gitcredentials";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub name: String,
}

impl PlanEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Build plan advertised by detect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    #[serde(default)]
    pub provides: Vec<PlanEntry>,
    #[serde(default)]
    pub requires: Vec<PlanEntry>,
}

impl BuildPlan {
    /// Provides and requires `gitcredentials`
    pub fn gitcredentials() -> Self {
        Self {
            provides: vec![PlanEntry::new(GITCREDENTIALS)],
            requires: vec![PlanEntry::new(GITCREDENTIALS)],
        }
    }

    /// Write the plan as TOML to `path`
    pub fn write(&self, path: &Path) -> Result<()> {
        let content = toml::to_string(self)?;
        write_file(path, &content)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerTypes {
    pub build: bool,
    pub cache: bool,
    pub launch: bool,
}

/// A layer registered with the lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(skip)]
    pub name: String,
    pub types: LayerTypes,
}

impl Layer {
    /// The marker layer recording that provisioning happened.
    ///
    /// Not cached, not available at launch, not exposed to later build steps.
    pub fn gitcredentials() -> Self {
        Self {
            name: GITCREDENTIALS.to_string(),
            types: LayerTypes::default(),
        }
    }

    /// Create `<layers_dir>/<name>/` and write `<layers_dir>/<name>.toml`.
    ///
    /// Returns the path of the metadata file.
    pub fn write(&self, layers_dir: &Path) -> Result<PathBuf> {
        let dir = layers_dir.join(&self.name);
        std::fs::create_dir_all(&dir).map_err(|e| CoreError::WriteError {
            path: dir.clone(),
            source: e,
        })?;

        let path = layers_dir.join(format!("{}.toml", self.name));
        let content = toml::to_string(self)?;
        write_file(&path, &content)?;
        Ok(path)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| CoreError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}
