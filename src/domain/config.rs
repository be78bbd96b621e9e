use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{TreeOptions, tree::DEFAULT_MAX_DEPTH};

/// Configuration for a genealogy archive.
///
/// This struct holds the settings that control how records are exported and
/// how far trees are expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The source system name written to the export header (`1 SOUR`).
    pub source_name: String,

    /// The interchange format version written to the export header
    /// (`2 VERS`).
    pub gedcom_version: String,

    /// Generations expanded beyond the root when building trees.
    max_depth: usize,

    /// File name used when exporting without an explicit path.
    pub export_file_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_name: default_source_name(),
            gedcom_version: default_gedcom_version(),
            max_depth: DEFAULT_MAX_DEPTH,
            export_file_name: default_export_file_name(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Loads the configuration, falling back to the defaults if the file is
    /// missing or invalid.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::debug!("Failed to load config: {e}");
            Self::default()
        })
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Generations expanded beyond the root when building trees.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Sets the tree depth bound. Zero is clamped to one generation.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth.max(1);
    }

    /// Tree options derived from this configuration.
    #[must_use]
    pub const fn tree_options(&self) -> TreeOptions {
        TreeOptions {
            max_depth: self.max_depth,
        }
    }
}

fn default_source_name() -> String {
    "FamilyTreeApp".to_string()
}

fn default_gedcom_version() -> String {
    "5.5".to_string()
}

const fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_export_file_name() -> String {
    "family_tree.ged".to_string()
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_source_name")]
        source_name: String,

        #[serde(default = "default_gedcom_version")]
        gedcom_version: String,

        /// Generations expanded beyond the root when building trees.
        #[serde(default = "default_max_depth")]
        max_depth: usize,

        #[serde(default = "default_export_file_name")]
        export_file_name: String,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                source_name,
                gedcom_version,
                max_depth,
                export_file_name,
            } => Self {
                source_name,
                gedcom_version,
                max_depth: max_depth.max(1),
                export_file_name,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            source_name: config.source_name,
            gedcom_version: config.gedcom_version,
            max_depth: config.max_depth,
            export_file_name: config.export_file_name,
        }
    }
}
