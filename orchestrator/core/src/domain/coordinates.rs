// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Coordinate Domain
//!
//! Canonical (mode-independent) agent positions and the canvas they must fit
//! inside.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Position`] | `(x, y)` pixel position, serialized as `[x, y]` |
//! | [`Canvas`] | Inclusive bounds every active position must respect |
//! | [`CanonicalTable`] | `AgentId → Position` source of truth |
//! | [`CoordinateValidation`] | Result of bounds/shape checking a table |
//!
//! Validation never fails hard on malformed input: a wrong-arity entry or a
//! non-numeric key becomes a [`CoordinateIssue`] in the report.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Canonical agent identity (stable across modes).
pub type AgentId = u32;

/// 1-based slot number an agent occupies in the active configuration.
pub type ActiveIndex = u32;

/// SSOT identity → position table.
pub type CanonicalTable = BTreeMap<AgentId, Position>;

/// Active slot → position table.
pub type ActiveCoordinates = BTreeMap<ActiveIndex, Position>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i64, i64)", into = "(i64, i64)")]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl From<(i64, i64)> for Position {
    fn from((x, y): (i64, i64)) -> Self {
        Self { x, y }
    }
}

impl From<Position> for (i64, i64) {
    fn from(p: Position) -> Self {
        (p.x, p.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// Inclusive drawing bounds for agent positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    #[serde(default)]
    pub min_x: i64,
    #[serde(default = "default_max_x")]
    pub max_x: i64,
    #[serde(default)]
    pub min_y: i64,
    #[serde(default = "default_max_y")]
    pub max_y: i64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            min_x: 0,
            max_x: default_max_x(),
            min_y: 0,
            max_y: default_max_y(),
        }
    }
}

fn default_max_x() -> i64 {
    3840
}

fn default_max_y() -> i64 {
    2160
}

impl Canvas {
    pub fn contains(&self, p: Position) -> bool {
        (self.min_x..=self.max_x).contains(&p.x) && (self.min_y..=self.max_y).contains(&p.y)
    }

    /// Bounds-check a typed table.
    pub fn check<K: fmt::Display>(&self, coords: &BTreeMap<K, Position>) -> CoordinateValidation {
        let mut validation = CoordinateValidation::default();
        for (key, position) in coords {
            self.check_one(&key.to_string(), *position, &mut validation);
        }
        validation.ok = validation.issues.is_empty();
        validation
    }

    fn check_one(&self, key: &str, p: Position, out: &mut CoordinateValidation) {
        if !(self.min_x..=self.max_x).contains(&p.x) {
            out.issues.push(CoordinateIssue::new(
                key,
                IssueKind::OutOfBounds,
                format!("x={} outside [{}, {}]", p.x, self.min_x, self.max_x),
            ));
        }
        if !(self.min_y..=self.max_y).contains(&p.y) {
            out.issues.push(CoordinateIssue::new(
                key,
                IssueKind::OutOfBounds,
                format!("y={} outside [{}, {}]", p.y, self.min_y, self.max_y),
            ));
        }
    }

    /// Validate an untyped JSON table such as `{"1": [100, 200]}`.
    ///
    /// Every entry is checked independently; shape problems are reported as
    /// [`IssueKind::Malformed`] instead of aborting the whole table.
    pub fn check_raw(&self, table: &Value) -> CoordinateValidation {
        let mut validation = CoordinateValidation::default();

        let Some(entries) = table.as_object() else {
            validation.issues.push(CoordinateIssue::new(
                "<root>",
                IssueKind::Malformed,
                "coordinate table must be a JSON object".to_string(),
            ));
            return validation;
        };

        for (key, value) in entries {
            if key.parse::<u32>().is_err() {
                validation.issues.push(CoordinateIssue::new(
                    key,
                    IssueKind::Malformed,
                    "key is not a positive integer id".to_string(),
                ));
                continue;
            }
            match parse_pair(value) {
                Some(position) => self.check_one(key, position, &mut validation),
                None => validation.issues.push(CoordinateIssue::new(
                    key,
                    IssueKind::Malformed,
                    format!("expected [x, y] integer pair, got {}", value),
                )),
            }
        }

        validation.ok = validation.issues.is_empty();
        validation
    }
}

fn parse_pair(value: &Value) -> Option<Position> {
    let items = value.as_array()?;
    if items.len() != 2 {
        return None;
    }
    Some(Position::new(items[0].as_i64()?, items[1].as_i64()?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    OutOfBounds,
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateIssue {
    /// Table key the issue belongs to (agent id or active index).
    pub key: String,
    pub kind: IssueKind,
    pub message: String,
}

impl CoordinateIssue {
    fn new(key: &str, kind: IssueKind, message: String) -> Self {
        Self {
            key: key.to_string(),
            kind,
            message,
        }
    }
}

impl fmt::Display for CoordinateIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateValidation {
    pub ok: bool,
    pub issues: Vec<CoordinateIssue>,
}

impl Default for CoordinateValidation {
    fn default() -> Self {
        Self {
            ok: true,
            issues: Vec::new(),
        }
    }
}

/// Restrict the canonical table to a mode mapping, re-keyed by active index.
///
/// Returns the projected coordinates and the ids that had no canonical entry.
pub fn project_coordinates(
    canonical: &CanonicalTable,
    mapping: &BTreeMap<AgentId, ActiveIndex>,
) -> (ActiveCoordinates, Vec<AgentId>) {
    let mut coords = ActiveCoordinates::new();
    let mut missing = Vec::new();
    for (agent, index) in mapping {
        match canonical.get(agent) {
            Some(position) => {
                coords.insert(*index, *position);
            }
            None => missing.push(*agent),
        }
    }
    (coords, missing)
}
