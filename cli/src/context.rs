// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Engine wiring for one CLI invocation.
//!
//! Every command builds its services from the loaded configuration here; no
//! service outlives the process.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use swarmgov_core::application::RoleService;
use swarmgov_core::domain::governance_config::GovernanceConfig;
use swarmgov_core::domain::validation::ValidationReport;
use swarmgov_core::domain::GovernanceError;
use swarmgov_core::infrastructure::GovernanceStores;
use swarmgov_swarm::application::{ActivationExecutor, ReconfigurationManager};
use swarmgov_swarm::infrastructure::{CommandActivationExecutor, FileStatusProvider, NoopActivationExecutor};

/// JSON body printed for an engine error under `--json`.
#[derive(Debug, Serialize)]
pub struct Rejection<'a> {
    pub success: bool,
    pub error_kind: &'static str,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<&'a ValidationReport>,
}

impl<'a> Rejection<'a> {
    pub fn from_error(err: &'a GovernanceError) -> Self {
        Self {
            success: false,
            error_kind: err.kind(),
            error: err.to_string(),
            report: match err {
                GovernanceError::Validation(report) => Some(report),
                _ => None,
            },
        }
    }
}

pub struct EngineContext {
    pub config: GovernanceConfig,
    pub config_path: Option<PathBuf>,
    pub json: bool,
}

impl EngineContext {
    pub fn load(config_path: Option<PathBuf>, json: bool) -> Result<Self> {
        let config = GovernanceConfig::load_or_default(config_path.clone())
            .context("Failed to load configuration")?;
        config.validate().context("Configuration validation failed")?;
        debug!(
            config_dir = %config.spec.paths.config_dir.display(),
            state_dir = %config.spec.paths.state_dir.display(),
            "Configuration loaded"
        );
        Ok(Self::from_config(config, config_path, json))
    }

    pub fn from_config(config: GovernanceConfig, config_path: Option<PathBuf>, json: bool) -> Self {
        Self {
            config,
            config_path,
            json,
        }
    }

    pub fn stores(&self) -> GovernanceStores {
        GovernanceStores::from_config(&self.config)
    }

    pub fn manager(&self) -> ReconfigurationManager {
        ReconfigurationManager::from_config(
            &self.config,
            self.activator(),
            Arc::new(FileStatusProvider::from_config(&self.config)),
        )
    }

    pub fn roles(&self) -> RoleService {
        RoleService::from_config(&self.config)
    }

    fn activator(&self) -> Arc<dyn ActivationExecutor> {
        match self
            .config
            .spec
            .activation
            .command
            .as_deref()
            .and_then(CommandActivationExecutor::from_command)
        {
            Some(executor) => Arc::new(executor),
            None => Arc::new(NoopActivationExecutor),
        }
    }

    /// Under `--json`, print the error as a [`Rejection`] before it is
    /// returned, so stdout always carries a result.
    pub fn rejected(&self, err: GovernanceError) -> anyhow::Error {
        if self.json {
            match serde_json::to_string_pretty(&Rejection::from_error(&err)) {
                Ok(body) => println!("{}", body),
                Err(e) => warn!("Failed to serialize rejection: {}", e),
            }
        }
        err.into()
    }

    /// Print `value` as pretty JSON when `--json` is set, otherwise run `human`.
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce()) -> Result<()> {
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(value).context("Failed to serialize output")?
            );
        } else {
            human();
        }
        Ok(())
    }
}
