// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Governance Validators
//!
//! Pure checks run before a reconfiguration is applied. Each validator returns
//! a [`ValidationReport`]; callers aggregate reports with
//! [`ValidationReport::merged`] and gate on `ok`.
//!
//! | Validator | Checks |
//! |-----------|--------|
//! | [`validate_projection`] | preset size, canonical coverage, slot collisions, unique roles |
//! | [`validate_switch_request`] | owner authority, target mode, signed intent, running work, blockers |
//!
//! Neither function touches state. Persisting the aggregated report for later
//! inspection is the caller's job.

use crate::domain::coordinates::{ActiveIndex, AgentId, CanonicalTable, CoordinateValidation};
use crate::domain::mode::{is_supported_mode, Authority, ModePreset, UNASSIGNED};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Invariant codes emitted in report errors.
pub mod codes {
    pub const PROJECTION_SIZE_MISMATCH: &str = "projection_size_mismatch";
    pub const MISSING_CANONICAL_PREFIX: &str = "missing_canonical_coordinates_for_agent_";
    pub const ROLE_UNIQUENESS_CONFLICT: &str = "role_uniqueness_conflict";
    pub const DUPLICATE_ACTIVE_INDEX_PREFIX: &str = "duplicate_active_index_";
    pub const DUPLICATE_INCLUDE_PREFIX: &str = "duplicate_include_";
    pub const COORDINATE_OUT_OF_BOUNDS_PREFIX: &str = "coordinate_out_of_bounds_for_slot_";
    pub const OWNER_NOT_AUTHORIZED: &str = "owner_not_authorized";
    pub const INVALID_TARGET_MODE: &str = "invalid_target_mode";
    pub const MISSING_SIGNED_INTENT: &str = "missing_signed_intent";
    pub const RUNNING_WORK_DETECTED: &str = "running_work_detected";
    pub const OPEN_BLOCKERS_PRESENT: &str = "open_blockers_present";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.ok = false;
        self.errors.push(message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// `self.ok AND other.ok`, with errors and warnings concatenated.
    pub fn merged(mut self, other: ValidationReport) -> Self {
        self.ok = self.ok && other.ok;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self
    }

    /// True when any error starts with `code`.
    pub fn has_error(&self, code: &str) -> bool {
        self.errors.iter().any(|e| e.starts_with(code))
    }

    /// Express canvas issues for projected slots as report errors.
    pub fn from_coordinates(validation: &CoordinateValidation) -> Self {
        let mut report = Self::new();
        for issue in &validation.issues {
            report.error(format!(
                "{}{}: {}",
                codes::COORDINATE_OUT_OF_BOUNDS_PREFIX,
                issue.key,
                issue.message
            ));
        }
        report
    }
}

/// Candidate configuration for a mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedProjection {
    /// Declared swarm size.
    pub mode: u8,
    pub include: Vec<AgentId>,
    pub mapping: BTreeMap<AgentId, ActiveIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignments: Option<BTreeMap<ActiveIndex, String>>,
}

impl ProposedProjection {
    pub fn from_preset(
        preset: &ModePreset,
        assignments: Option<BTreeMap<ActiveIndex, String>>,
    ) -> Self {
        Self {
            mode: preset.size,
            include: preset.include.clone(),
            mapping: preset.mapping.clone(),
            assignments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRequest {
    pub owner: String,
    pub target_mode: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_path: Option<PathBuf>,
}

/// Observed runtime conditions fed to [`validate_switch_request`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeState {
    #[serde(default)]
    pub running_agents: Vec<AgentId>,
    #[serde(default)]
    pub blockers: Vec<String>,
}

pub fn validate_projection(
    canonical: &CanonicalTable,
    proposed: &ProposedProjection,
    unique_roles: &BTreeSet<String>,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    // Size counts distinct agents; a repeated id is its own error.
    let mut distinct: BTreeSet<AgentId> = BTreeSet::new();
    for agent in &proposed.include {
        if !distinct.insert(*agent) {
            report.error(format!("{}{}", codes::DUPLICATE_INCLUDE_PREFIX, agent));
        }
    }
    if distinct.len() != proposed.mode as usize {
        report.error(format!(
            "{}: include={} expected={}",
            codes::PROJECTION_SIZE_MISMATCH,
            distinct.len(),
            proposed.mode
        ));
    }

    for agent in proposed.mapping.keys() {
        if !canonical.contains_key(agent) {
            report.error(format!("{}{}", codes::MISSING_CANONICAL_PREFIX, agent));
        }
    }

    let mut seen: BTreeMap<ActiveIndex, AgentId> = BTreeMap::new();
    for (agent, index) in &proposed.mapping {
        if let Some(first) = seen.insert(*index, *agent) {
            report.error(format!(
                "{}{}: agents {} and {}",
                codes::DUPLICATE_ACTIVE_INDEX_PREFIX,
                index,
                first,
                agent
            ));
        }
    }

    for agent in &proposed.include {
        if !proposed.mapping.contains_key(agent) {
            report.warn(format!("include_without_mapping_{}", agent));
        }
    }
    for agent in proposed.mapping.keys() {
        if !proposed.include.contains(agent) {
            report.warn(format!("mapping_outside_include_{}", agent));
        }
    }

    if let Some(assignments) = &proposed.assignments {
        let mut holders: BTreeMap<&str, BTreeSet<ActiveIndex>> = BTreeMap::new();
        for (index, role) in assignments {
            if role != UNASSIGNED && unique_roles.contains(role) {
                holders.entry(role.as_str()).or_default().insert(*index);
            }
        }
        for (role, indexes) in holders {
            if indexes.len() > 1 {
                report.error(format!("{}:{}", codes::ROLE_UNIQUENESS_CONFLICT, role));
            }
        }
    }

    report
}

pub fn validate_switch_request(request: &SwitchRequest, runtime: &RuntimeState) -> ValidationReport {
    let mut report = ValidationReport::new();

    if Authority::parse(&request.owner).is_none() {
        report.error(codes::OWNER_NOT_AUTHORIZED);
    }
    if !is_supported_mode(request.target_mode) {
        report.error(codes::INVALID_TARGET_MODE);
    }
    match &request.signature_path {
        Some(path) if path.is_file() => {}
        _ => report.error(codes::MISSING_SIGNED_INTENT),
    }
    if !runtime.running_agents.is_empty() {
        report.error(codes::RUNNING_WORK_DETECTED);
    }
    if !runtime.blockers.is_empty() {
        report.error(codes::OPEN_BLOCKERS_PRESENT);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coordinates::Position;

    fn canonical_four() -> CanonicalTable {
        (1..=4)
            .map(|id| (id, Position::new(id as i64 * 100, id as i64 * 100)))
            .collect()
    }

    fn proposal(mode: u8, include: Vec<AgentId>) -> ProposedProjection {
        ProposedProjection {
            mode,
            mapping: include.iter().map(|id| (*id, *id)).collect(),
            include,
            assignments: None,
        }
    }

    fn unique_captain() -> BTreeSet<String> {
        BTreeSet::from(["captain".to_string()])
    }

    // ── validate_projection ──────────────────────────────────────────────────

    #[test]
    fn test_valid_projection_passes() {
        let report = validate_projection(&canonical_four(), &proposal(4, vec![1, 2, 3, 4]), &unique_captain());
        assert!(report.ok, "{:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_size_mismatch_reports_counts() {
        let report = validate_projection(&canonical_four(), &proposal(4, vec![1, 2, 3]), &unique_captain());
        assert!(!report.ok);
        assert!(report
            .errors
            .contains(&"projection_size_mismatch: include=3 expected=4".to_string()));
    }

    #[test]
    fn test_repeated_include_counts_once() {
        let report = validate_projection(&canonical_four(), &proposal(4, vec![1, 1, 2, 3]), &unique_captain());
        assert!(!report.ok);
        assert!(report.errors.contains(&"duplicate_include_1".to_string()));
        assert!(report
            .errors
            .contains(&"projection_size_mismatch: include=3 expected=4".to_string()));
    }

    #[test]
    fn test_missing_canonical_agent_is_named() {
        let report = validate_projection(&canonical_four(), &proposal(2, vec![1, 9]), &unique_captain());
        assert!(!report.ok);
        assert!(report
            .errors
            .contains(&"missing_canonical_coordinates_for_agent_9".to_string()));
    }

    #[test]
    fn test_duplicate_slot_is_an_error() {
        let mut p = proposal(2, vec![1, 2]);
        p.mapping.insert(2, 1);
        let report = validate_projection(&canonical_four(), &p, &unique_captain());
        assert!(report.has_error(codes::DUPLICATE_ACTIVE_INDEX_PREFIX));
    }

    #[test]
    fn test_include_mapping_disagreement_is_a_warning() {
        let mut p = proposal(2, vec![1, 2]);
        p.mapping.remove(&2);
        p.mapping.insert(3, 2);
        let report = validate_projection(&canonical_four(), &p, &unique_captain());
        assert!(report.ok);
        assert!(report.warnings.contains(&"include_without_mapping_2".to_string()));
        assert!(report.warnings.contains(&"mapping_outside_include_3".to_string()));
    }

    #[test]
    fn test_unique_role_on_two_slots_conflicts() {
        let mut p = proposal(2, vec![1, 2]);
        p.assignments = Some(BTreeMap::from([(1, "captain".into()), (2, "captain".into())]));
        let report = validate_projection(&canonical_four(), &p, &unique_captain());
        assert!(report
            .errors
            .contains(&"role_uniqueness_conflict:captain".to_string()));
    }

    #[test]
    fn test_non_unique_role_may_repeat() {
        let mut p = proposal(2, vec![1, 2]);
        p.assignments = Some(BTreeMap::from([(1, "builder".into()), (2, "builder".into())]));
        assert!(validate_projection(&canonical_four(), &p, &unique_captain()).ok);
    }

    // ── validate_switch_request ──────────────────────────────────────────────

    fn signed_request(owner: &str, mode: u8) -> (tempfile::NamedTempFile, SwitchRequest) {
        let sig = tempfile::NamedTempFile::new().unwrap();
        let request = SwitchRequest {
            owner: owner.to_string(),
            target_mode: mode,
            signature_path: Some(sig.path().to_path_buf()),
        };
        (sig, request)
    }

    #[test]
    fn test_authorized_signed_request_passes() {
        let (_sig, request) = signed_request("co_captain", 6);
        assert!(validate_switch_request(&request, &RuntimeState::default()).ok);
    }

    #[test]
    fn test_unauthorized_owner_and_bad_mode() {
        let (_sig, request) = signed_request("worker-1", 3);
        let report = validate_switch_request(&request, &RuntimeState::default());
        assert!(!report.ok);
        assert!(report.errors.contains(&"owner_not_authorized".to_string()));
        assert!(report.errors.contains(&"invalid_target_mode".to_string()));
    }

    #[test]
    fn test_signature_must_exist() {
        let request = SwitchRequest {
            owner: "captain".into(),
            target_mode: 4,
            signature_path: Some(PathBuf::from("/nonexistent/intent.sig")),
        };
        let report = validate_switch_request(&request, &RuntimeState::default());
        assert_eq!(report.errors, vec!["missing_signed_intent".to_string()]);

        let unsigned = SwitchRequest { signature_path: None, ..request };
        assert!(validate_switch_request(&unsigned, &RuntimeState::default())
            .has_error(codes::MISSING_SIGNED_INTENT));
    }

    #[test]
    fn test_runtime_conditions_block() {
        let (_sig, request) = signed_request("captain", 4);
        let runtime = RuntimeState {
            running_agents: vec![2],
            blockers: vec!["deploy freeze".into()],
        };
        let report = validate_switch_request(&request, &runtime);
        assert!(report.errors.contains(&"running_work_detected".to_string()));
        assert!(report.errors.contains(&"open_blockers_present".to_string()));
    }

    #[test]
    fn test_merged_reports_and_ok() {
        let mut failing = ValidationReport::new();
        failing.error("x");
        let merged = ValidationReport::new().merged(failing);
        assert!(!merged.ok);
        assert_eq!(merged.errors, vec!["x".to_string()]);
    }
}
