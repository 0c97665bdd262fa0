// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::validation::ValidationReport;
use crate::domain::GovernanceError;
use crate::infrastructure::json_file::{read_json_opt, write_json_atomic};
use crate::infrastructure::layout::StateLayout;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last aggregated validation report, as written to `reports/validation_report.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReport {
    #[serde(flatten)]
    pub report: ValidationReport,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReportStore {
    layout: StateLayout,
}

impl ReportStore {
    pub fn new(layout: StateLayout) -> Self {
        Self { layout }
    }

    pub fn save(&self, report: &ValidationReport) -> Result<(), GovernanceError> {
        let stored = StoredReport {
            report: report.clone(),
            timestamp: Utc::now(),
        };
        write_json_atomic(&self.layout.validation_report(), &stored)
    }

    pub fn load(&self) -> Result<Option<StoredReport>, GovernanceError> {
        read_json_opt(&self.layout.validation_report())
    }
}
