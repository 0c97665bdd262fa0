// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Collaborator Implementations
//!
//! | Type | Trait | Backing |
//! |------|-------|---------|
//! | [`FileStatusProvider`] | [`StatusProvider`] | `agent_status.json` written by the agents' supervisor |
//! | [`CommandActivationExecutor`] | [`ActivationExecutor`] | external program, agent id as last argument |
//! | [`NoopActivationExecutor`] | [`ActivationExecutor`] | logs only |

use crate::application::{ActivationExecutor, StatusProvider};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use swarmgov_core::domain::coordinates::AgentId;
use swarmgov_core::domain::governance_config::GovernanceConfig;
use swarmgov_core::infrastructure::StateLayout;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Deserialize)]
struct AgentStatus {
    #[serde(default)]
    state: String,
    last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StatusDocument {
    #[serde(default)]
    agents: BTreeMap<AgentId, AgentStatus>,
    #[serde(default)]
    blockers: Vec<String>,
}

/// Reads `{agents: {id: {state, last_seen}}, blockers: [...]}`.
///
/// An agent counts as busy when its state is `busy` or `working` and it was
/// seen within the freshness window. A missing or unreadable file means no
/// agent is busy and nothing is blocked.
#[derive(Debug, Clone)]
pub struct FileStatusProvider {
    path: PathBuf,
    freshness: Duration,
}

impl FileStatusProvider {
    pub fn new(path: impl Into<PathBuf>, freshness: Duration) -> Self {
        Self {
            path: path.into(),
            freshness,
        }
    }

    pub fn from_config(config: &GovernanceConfig) -> Self {
        let path = config
            .spec
            .status
            .status_file
            .clone()
            .unwrap_or_else(|| StateLayout::from_config(config).agent_status());
        Self::new(path, Duration::seconds(config.spec.status.freshness_seconds as i64))
    }

    async fn document(&self) -> StatusDocument {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("No agent status at {}: {}", self.path.display(), e);
                return StatusDocument::default();
            }
        };
        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!("Ignoring malformed agent status file {}: {}", self.path.display(), e);
            StatusDocument::default()
        })
    }
}

#[async_trait]
impl StatusProvider for FileStatusProvider {
    async fn is_busy(&self, agent: AgentId) -> bool {
        let document = self.document().await;
        let Some(status) = document.agents.get(&agent) else {
            return false;
        };
        let busy_state = matches!(status.state.as_str(), "busy" | "working");
        let fresh = status
            .last_seen
            .is_some_and(|seen| Utc::now() - seen <= self.freshness);
        busy_state && fresh
    }

    async fn open_blockers(&self) -> Vec<String> {
        self.document().await.blockers
    }
}

/// Runs `program args... <agent>` once per newly included agent.
#[derive(Debug, Clone)]
pub struct CommandActivationExecutor {
    program: String,
    args: Vec<String>,
}

impl CommandActivationExecutor {
    /// `None` for an empty command line.
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl ActivationExecutor for CommandActivationExecutor {
    async fn activate(&self, agent: AgentId) -> bool {
        let result = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(agent.to_string())
            .status()
            .await;
        match result {
            Ok(status) if status.success() => {
                info!(agent, "Agent activated");
                true
            }
            Ok(status) => {
                warn!(agent, "Activation command exited with {}", status);
                false
            }
            Err(e) => {
                warn!(agent, "Failed to run activation command '{}': {}", self.program, e);
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopActivationExecutor;

#[async_trait]
impl ActivationExecutor for NoopActivationExecutor {
    async fn activate(&self, agent: AgentId) -> bool {
        info!(agent, "Agent included (no activation command configured)");
        true
    }
}
