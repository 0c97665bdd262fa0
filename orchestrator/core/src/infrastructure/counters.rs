// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::audit::SwitchCounters;
use crate::domain::GovernanceError;
use crate::infrastructure::json_file::{read_json_opt, write_json_atomic};
use crate::infrastructure::layout::StateLayout;

/// Persistent success/failure tallies of switch attempts, mirrored to the
/// `swarmgov_mode_switch_total` metric.
#[derive(Debug, Clone)]
pub struct SwitchCounterStore {
    layout: StateLayout,
}

impl SwitchCounterStore {
    pub fn new(layout: StateLayout) -> Self {
        Self { layout }
    }

    pub fn load(&self) -> Result<SwitchCounters, GovernanceError> {
        Ok(read_json_opt(&self.layout.switch_counters())?.unwrap_or_default())
    }

    pub fn record(&self, success: bool) -> Result<SwitchCounters, GovernanceError> {
        let mut counters = self.load()?;
        let outcome = if success {
            counters.success += 1;
            "success"
        } else {
            counters.failure += 1;
            "failure"
        };
        metrics::counter!("swarmgov_mode_switch_total", "outcome" => outcome).increment(1);
        write_json_atomic(&self.layout.switch_counters(), &counters)?;
        Ok(counters)
    }
}
