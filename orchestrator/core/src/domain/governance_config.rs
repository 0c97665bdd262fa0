// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Governance Configuration Types
//
// Defines the configuration schema for the swarm governance engine:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Config (read-only inputs) and state (mutable artifacts) directories
// - Canvas bounds for agent positions
// - Switch lock polling and lease settings
// - Busy-agent freshness window
// - Snapshot retention and role policy

use crate::domain::coordinates::Canvas;
use crate::domain::roles::{RolePolicy, ViolationHandling};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_VERSION: &str = "swarmgov/v1";
pub const KIND: &str = "GovernanceConfig";

/// Top-level Kubernetes-style governance configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfigManifest {
    /// API version (must be "swarmgov/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "GovernanceConfig")
    pub kind: String,

    /// Manifest metadata (name, labels)
    pub metadata: ManifestMetadata,

    /// Engine configuration specification
    pub spec: GovernanceConfigSpec,
}

/// Convenience alias used by callers that do not care about the manifest envelope.
pub type GovernanceConfig = GovernanceConfigManifest;

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable name of this swarm deployment
    pub name: String,

    /// Optional: Labels for categorization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Engine configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GovernanceConfigSpec {
    #[serde(default)]
    pub paths: PathsConfig,

    /// Bounds every active coordinate must satisfy
    #[serde(default)]
    pub canvas: Canvas,

    #[serde(default)]
    pub lock: LockConfig,

    #[serde(default)]
    pub status: StatusConfig,

    #[serde(default)]
    pub snapshots: SnapshotConfig,

    #[serde(default)]
    pub roles: RolesConfig,

    #[serde(default)]
    pub activation: ActivationConfig,

    /// Signed intent used when `mode switch` is called without --signature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding canonical coordinates, mode presets and the role catalog
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Directory holding active configuration, history, audit and snapshots
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            state_dir: default_state_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Delay between lock acquisition attempts
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Total time to wait for the lock before giving up
    #[serde(default = "default_lock_timeout_ms")]
    pub timeout_ms: u64,

    /// Lease written by the holder; renewed while a switch is applying
    #[serde(default = "default_lease_ttl_seconds")]
    pub lease_ttl_seconds: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_ms: default_lock_timeout_ms(),
            lease_ttl_seconds: default_lease_ttl_seconds(),
        }
    }
}

impl LockConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn lease_ttl(&self) -> Duration {
        Duration::from_secs(self.lease_ttl_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    /// A busy report older than this is ignored
    #[serde(default = "default_freshness_seconds")]
    pub freshness_seconds: u64,

    /// Agent status file (default: <state_dir>/agent_status.json)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_file: Option<PathBuf>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            freshness_seconds: default_freshness_seconds(),
            status_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Keep at most this many snapshots (unbounded when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolesConfig {
    #[serde(default)]
    pub policy: RolePolicy,

    /// What `role assign` does on a policy violation
    #[serde(default)]
    pub violation_handling: ViolationHandling,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivationConfig {
    /// Program run once per newly included agent, agent id appended as last argument.
    /// When unset, activation is logged only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

// Default value functions
fn default_config_dir() -> PathBuf {
    PathBuf::from("./config")
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("./runtime")
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_lock_timeout_ms() -> u64 {
    10_000
}

fn default_lease_ttl_seconds() -> u64 {
    120
}

fn default_freshness_seconds() -> u64 {
    60
}

impl Default for GovernanceConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "default".to_string(),
                labels: None,
            },
            spec: GovernanceConfigSpec::default(),
        }
    }
}

impl GovernanceConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. SWARMGOV_CONFIG_PATH environment variable
    /// 2. ./swarmgov-config.yaml (working directory)
    /// 3. ~/.swarmgov/config.yaml (user home)
    /// 4. /etc/swarmgov/config.yaml (system, Unix) or C:\ProgramData\Swarmgov\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SWARMGOV_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./swarmgov-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".swarmgov").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/swarmgov/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Swarmgov\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // 1. Explicit CLI path (Fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        // 2. Discovery (Env -> Cwd -> Home -> System)
        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("SWARMGOV_CONFIG_DIR") {
            tracing::info!("Environment override: SWARMGOV_CONFIG_DIR={}", dir);
            self.spec.paths.config_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("SWARMGOV_STATE_DIR") {
            tracing::info!("Environment override: SWARMGOV_STATE_DIR={}", dir);
            self.spec.paths.state_dir = PathBuf::from(dir);
        }

        if let Ok(val) = std::env::var("SWARMGOV_LOCK_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) => {
                    tracing::info!("Environment override: SWARMGOV_LOCK_TIMEOUT_MS={}", ms);
                    self.spec.lock.timeout_ms = ms;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for SWARMGOV_LOCK_TIMEOUT_MS: '{}'. Expected milliseconds. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.trim().is_empty() {
            anyhow::bail!("metadata.name must not be empty");
        }

        let canvas = &self.spec.canvas;
        if canvas.min_x > canvas.max_x || canvas.min_y > canvas.max_y {
            anyhow::bail!(
                "Invalid canvas: x [{}, {}], y [{}, {}]. Minimum exceeds maximum",
                canvas.min_x,
                canvas.max_x,
                canvas.min_y,
                canvas.max_y
            );
        }

        if self.spec.lock.poll_interval_ms == 0 {
            anyhow::bail!("lock.poll_interval_ms must be greater than zero");
        }

        if self.spec.lock.lease_ttl_seconds == 0 {
            anyhow::bail!("lock.lease_ttl_seconds must be greater than zero");
        }

        if self.spec.snapshots.retention == Some(0) {
            anyhow::bail!("snapshots.retention must be at least 1 when set");
        }

        if let Some(command) = &self.spec.activation.command {
            if command.is_empty() {
                anyhow::bail!("activation.command must name a program when set");
            }
        }

        for role in &self.spec.roles.policy.unique_roles {
            if self.spec.roles.policy.capacity.get(role).is_some_and(|cap| *cap == 0) {
                anyhow::bail!("role '{}' is unique but has capacity 0", role);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let config = GovernanceConfigManifest::default();
        assert_eq!(config.api_version, "swarmgov/v1");
        assert_eq!(config.kind, "GovernanceConfig");
        assert_eq!(config.spec.lock.poll_interval_ms, 200);
        assert_eq!(config.spec.lock.timeout_ms, 10_000);
        assert_eq!(config.spec.status.freshness_seconds, 60);
        assert_eq!(config.spec.canvas.max_x, 3840);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let yaml = r#"
apiVersion: swarmgov/v1
kind: GovernanceConfig
metadata:
  name: studio-wall
  labels:
    site: lab
spec:
  paths:
    config_dir: /srv/swarm/config
    state_dir: /srv/swarm/state
  canvas:
    min_x: -1920
    max_x: 3840
    min_y: 0
    max_y: 1080
  lock:
    timeout_ms: 2500
  snapshots:
    retention: 20
  roles:
    policy:
      unique_roles: [captain]
      capacity:
        co_captain: 1
    violation_handling: reject
  activation:
    command: ["/usr/local/bin/wake-agent", "--quiet"]
"#;
        let config = GovernanceConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(config.metadata.name, "studio-wall");
        assert_eq!(config.spec.paths.state_dir, PathBuf::from("/srv/swarm/state"));
        assert_eq!(config.spec.canvas.min_x, -1920);
        assert_eq!(config.spec.lock.timeout_ms, 2500);
        assert_eq!(config.spec.lock.poll_interval_ms, 200);
        assert_eq!(config.spec.snapshots.retention, Some(20));
        assert_eq!(config.spec.roles.policy.capacity_of("co_captain"), Some(1));
        assert_eq!(config.spec.roles.violation_handling, ViolationHandling::Reject);
        assert!(config.validate().is_ok());

        let serialized = serde_yaml::to_string(&config).unwrap();
        let back = GovernanceConfigManifest::from_yaml_str(&serialized).unwrap();
        assert_eq!(back.spec.canvas, config.spec.canvas);
    }

    #[test]
    fn test_validation() {
        let mut config = GovernanceConfigManifest::default();
        config.api_version = "v0".into();
        assert!(config.validate().is_err());

        let mut config = GovernanceConfigManifest::default();
        config.spec.canvas.min_x = 5000;
        assert!(config.validate().is_err());

        let mut config = GovernanceConfigManifest::default();
        config.spec.lock.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = GovernanceConfigManifest::default();
        config.spec.snapshots.retention = Some(0);
        assert!(config.validate().is_err());

        let mut config = GovernanceConfigManifest::default();
        config.spec.activation.command = Some(vec![]);
        assert!(config.validate().is_err());
    }
}
