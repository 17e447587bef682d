use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Kubernetes context to use (defaults to current context)
    #[serde(default)]
    pub context: Option<String>,

    /// Namespace to probe resources in
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// API resources checked by `knerrors check`
    #[serde(default = "default_resources")]
    pub resources: Vec<ResourceTarget>,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_resources() -> Vec<ResourceTarget> {
    vec![
        ResourceTarget::new("serving.knative.dev", "v1", "Service", "services"),
        ResourceTarget::new("eventing.knative.dev", "v1", "Broker", "brokers"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            context: None,
            namespace: default_namespace(),
            resources: default_resources(),
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("KNERRORS_CONFIG_FILE") {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().context("Could not determine home directory")?;
        let config_dir = home.join(".config").join("knerrors");
        Ok(config_dir.join("config.toml"))
    }
}

/// An API resource addressed by group, version, kind and plural name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTarget {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
}

impl ResourceTarget {
    pub fn new(group: &str, version: &str, kind: &str, plural: &str) -> Self {
        ResourceTarget {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            plural: plural.to_string(),
        }
    }
}

impl fmt::Display for ResourceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.group, self.version, self.kind, self.plural)
    }
}

impl FromStr for ResourceTarget {
    type Err = anyhow::Error;

    /// Parse `group/version/kind/plural`
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [group, version, kind, plural]
                if [version, kind, plural].iter().all(|p| !p.is_empty()) =>
            {
                Ok(ResourceTarget::new(group, version, kind, plural))
            }
            _ => anyhow::bail!(
                "Invalid resource '{}', expected group/version/kind/plural",
                s
            ),
        }
    }
}
