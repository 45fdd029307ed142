//! Team (curator/assignee) input rules and junction-set reconciliation.

use std::collections::BTreeSet;

use crate::error::CoreError;
use crate::types::DbId;

/// Minimum number of curators or assignees on a project or task.
pub const MIN_TEAM_SIZE: usize = 1;

/// Maximum number of curators or assignees on a project or task.
pub const MAX_TEAM_SIZE: usize = 5;

/// Validated curator and assignee lists.
///
/// Ids are deduplicated with first-occurrence order kept, so
/// [`Team::primary_curator`] is always the first curator the caller listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    curators: Vec<DbId>,
    assignees: Vec<DbId>,
}

impl Team {
    pub fn new(curators: &[DbId], assignees: &[DbId]) -> Result<Self, CoreError> {
        check_size("curators", curators)?;
        check_size("assignees", assignees)?;
        Ok(Self {
            curators: dedup_ordered(curators),
            assignees: dedup_ordered(assignees),
        })
    }

    pub fn curators(&self) -> &[DbId] {
        &self.curators
    }

    pub fn assignees(&self) -> &[DbId] {
        &self.assignees
    }

    /// First curator; denormalized onto the owning row.
    pub fn primary_curator(&self) -> DbId {
        self.curators[0]
    }

    /// Distinct ids across both roles, ascending.
    pub fn all_members(&self) -> Vec<DbId> {
        self.curators
            .iter()
            .chain(self.assignees.iter())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn check_size(label: &str, ids: &[DbId]) -> Result<(), CoreError> {
    if ids.len() < MIN_TEAM_SIZE || ids.len() > MAX_TEAM_SIZE {
        return Err(CoreError::Validation(format!(
            "Between {MIN_TEAM_SIZE} and {MAX_TEAM_SIZE} {label} are required"
        )));
    }
    if let Some(bad) = ids.iter().find(|id| **id <= 0) {
        return Err(CoreError::Validation(format!("Invalid user id {bad} in {label}")));
    }
    Ok(())
}

fn dedup_ordered(ids: &[DbId]) -> Vec<DbId> {
    let mut seen = BTreeSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// The removals and additions that turn one junction set into another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub remove: Vec<DbId>,
    pub add: Vec<DbId>,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }
}

/// Compute `current - desired` (to remove) and `desired - current` (to add).
pub fn plan_reconcile(current: &[DbId], desired: &[DbId]) -> ReconcilePlan {
    let current: BTreeSet<DbId> = current.iter().copied().collect();
    let desired: BTreeSet<DbId> = desired.iter().copied().collect();
    ReconcilePlan {
        remove: current.difference(&desired).copied().collect(),
        add: desired.difference(&current).copied().collect(),
    }
}
