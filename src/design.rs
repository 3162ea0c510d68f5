//! Experiment design: presets, groups, and unit assignment.
//!
//! The independent variable of an experiment is a [`Preset`] — a named
//! operating configuration. Units (reactor ids) are partitioned into three
//! groups: Control (`A`) and two Test groups (`B`, `C`). A unit belongs to
//! at most one group at a time; reassignment removes it from its previous
//! owner first. This module is pure in-memory state, no I/O.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named operating configuration — the experiment's independent variable.
///
/// Immutable once created; owned by the experiment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Preset {
    /// Human-readable preset name (e.g. "High-temp fast pyrolysis").
    pub name: String,
    /// Target reactor temperature in °C.
    pub target_temp_c: f64,
    /// Residence time in seconds.
    pub residence_time_s: f64,
    /// Inert-gas (N₂) flow in L/min.
    pub inert_flow_l_min: f64,
    /// Operating mode label (free-form, e.g. "aggressive", "conservative").
    pub operating_mode: String,
    /// Optional description for reports.
    #[serde(default)]
    pub description: Option<String>,
}

/// Experiment group key: Control (`A`) and two Test groups (`B`, `C`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum GroupKey {
    /// Control group.
    A,
    /// First test group.
    B,
    /// Second test group.
    C,
}

impl GroupKey {
    /// All group keys in canonical order.
    pub const ALL: [GroupKey; 3] = [GroupKey::A, GroupKey::B, GroupKey::C];

    /// Whether this is the control group.
    pub fn is_control(self) -> bool {
        matches!(self, GroupKey::A)
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKey::A => write!(f, "A"),
            GroupKey::B => write!(f, "B"),
            GroupKey::C => write!(f, "C"),
        }
    }
}

/// One group's assignment: an optional preset plus the units it owns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GroupAssignment {
    /// The preset applied to every unit in this group, if any.
    pub preset: Option<Preset>,
    /// Unit ids assigned to this group, kept sorted for stable display
    /// and reproducible dispatch order.
    pub units: Vec<String>,
}

impl GroupAssignment {
    /// A group contributes to the experiment when it has both a preset and
    /// at least one unit.
    pub fn is_populated(&self) -> bool {
        self.preset.is_some() && !self.units.is_empty()
    }
}

/// The full three-group assignment table.
///
/// Invariant: a unit id appears in at most one group at any time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExperimentDesign {
    groups: BTreeMap<GroupKey, GroupAssignment>,
}

impl ExperimentDesign {
    /// Create an empty design with all three groups present and unassigned.
    pub fn new() -> Self {
        let mut groups = BTreeMap::new();
        for key in GroupKey::ALL {
            groups.insert(key, GroupAssignment::default());
        }
        Self { groups }
    }

    /// Assign (or replace) the preset for a group.
    pub fn assign_preset(&mut self, group: GroupKey, preset: Preset) {
        self.group_mut(group).preset = Some(preset);
    }

    /// Remove the preset from a group, leaving its units in place.
    pub fn remove_preset(&mut self, group: GroupKey) {
        self.group_mut(group).preset = None;
    }

    /// Assign a unit to a group, or unassign it entirely with `None`.
    ///
    /// The unit is removed from any group it currently occupies before being
    /// added to the target, so it has at most one owner at a time.
    pub fn assign_unit(&mut self, unit_id: &str, target: Option<GroupKey>) {
        for assignment in self.groups.values_mut() {
            assignment.units.retain(|u| u != unit_id);
        }
        if let Some(group) = target {
            let units = &mut self.group_mut(group).units;
            units.push(unit_id.to_string());
            units.sort();
        }
    }

    /// Borrow a group's assignment.
    pub fn group(&self, key: GroupKey) -> &GroupAssignment {
        // new() seeds all three keys; the map is never missing one.
        self.groups.get(&key).unwrap_or_else(|| {
            unreachable!("design always holds all three groups")
        })
    }

    fn group_mut(&mut self, key: GroupKey) -> &mut GroupAssignment {
        self.groups.entry(key).or_default()
    }

    /// True iff at least one group has both a preset and ≥1 unit.
    pub fn is_runnable(&self) -> bool {
        self.groups.values().any(GroupAssignment::is_populated)
    }

    /// Groups that will actually be dispatched, in canonical A → B → C order.
    pub fn runnable_groups(&self) -> Vec<(GroupKey, &GroupAssignment)> {
        GroupKey::ALL
            .into_iter()
            .map(|key| (key, self.group(key)))
            .filter(|(_, g)| g.is_populated())
            .collect()
    }

    /// Units from `all` that currently belong to no group, sorted.
    pub fn unassigned_units<'a>(&self, all: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let assigned: std::collections::HashSet<&str> = self
            .groups
            .values()
            .flat_map(|g| g.units.iter().map(String::as_str))
            .collect();
        let mut free: Vec<String> = all
            .into_iter()
            .filter(|id| !assigned.contains(id))
            .map(str::to_string)
            .collect();
        free.sort();
        free
    }

    /// Total number of units assigned across all groups.
    pub fn total_units(&self) -> usize {
        self.groups.values().map(|g| g.units.len()).sum()
    }
}
