//! Unit fulfillment calculator.
//!
//! `units_completed` on a unit requirement is the sum of `units` over
//! every currently-assigned, non-junk course whose effective
//! unit-requirement set contains it. Resolution precedence for the
//! effective set:
//!
//! 1. the course's own explicit override, when one has ever been set
//!    (an explicit empty override fulfills nothing);
//! 2. else the assigned course requirement's set. Slots resolve
//!    category inheritance at build time, so a slot materialized under a
//!    bare category already carries the category's set, and a slot's own
//!    set wins over its parent subcategory's.
//!
//! Sums are plain floating-point; rounding is a display concern handled
//! by [`crate::units::UnitFormat`].

use std::collections::BTreeSet;

use crate::course::CourseInstance;
use crate::degree_check::DegreeCheck;
use crate::template::RequirementTree;
use crate::types::DbId;

/// The unit requirements a course would fulfill if assigned: its own
/// override when set, else the assigned slot's resolved set. Empty for
/// unassigned courses without an override.
pub fn effective_unit_requirements(check: &DegreeCheck, course: &CourseInstance) -> Vec<DbId> {
    if let Some(explicit) = &course.unit_requirement_override {
        return explicit.clone();
    }
    match course.assigned_requirement {
        Some(reqt_id) => check
            .tree
            .course_requirements
            .get(&reqt_id)
            .map(|reqt| reqt.unit_requirement_ids.clone())
            .unwrap_or_default(),
        None => Vec::new(),
    }
}

/// The set a course is actually contributing to right now: empty unless
/// the course is assigned and not junked.
pub fn contribution_set(check: &DegreeCheck, course: &CourseInstance) -> Vec<DbId> {
    if !course.is_assigned() || course.is_junk {
        return Vec::new();
    }
    effective_unit_requirements(check, course)
}

/// Whether the course's fulfillment was edited away from what
/// inheritance alone would produce. Drives the "edited" indicator shown
/// to advisors.
pub fn is_fulfillment_edited(check: &DegreeCheck, course: &CourseInstance) -> bool {
    let Some(explicit) = &course.unit_requirement_override else {
        return false;
    };
    let inherited = match course.assigned_requirement {
        Some(reqt_id) => check
            .tree
            .course_requirements
            .get(&reqt_id)
            .map(|reqt| reqt.unit_requirement_ids.clone())
            .unwrap_or_default(),
        None => Vec::new(),
    };
    let explicit: BTreeSet<DbId> = explicit.iter().copied().collect();
    let inherited: BTreeSet<DbId> = inherited.into_iter().collect();
    explicit != inherited
}

// ---------------------------------------------------------------------------
// Rollup primitives
// ---------------------------------------------------------------------------

/// Add `units` to every listed unit requirement. Returns the ids whose
/// totals changed, deduplicated and sorted.
pub(crate) fn add_contribution(
    tree: &mut RequirementTree,
    reqt_ids: &[DbId],
    units: f64,
) -> Vec<DbId> {
    apply_delta(tree, reqt_ids, units)
}

/// Remove `units` from every listed unit requirement.
pub(crate) fn remove_contribution(
    tree: &mut RequirementTree,
    reqt_ids: &[DbId],
    units: f64,
) -> Vec<DbId> {
    apply_delta(tree, reqt_ids, -units)
}

fn apply_delta(tree: &mut RequirementTree, reqt_ids: &[DbId], delta: f64) -> Vec<DbId> {
    let mut changed: BTreeSet<DbId> = BTreeSet::new();
    if delta == 0.0 {
        return Vec::new();
    }
    for &id in reqt_ids {
        if let Some(reqt) = tree.unit_requirements.get_mut(&id) {
            reqt.units_completed += delta;
            changed.insert(id);
        }
    }
    changed.into_iter().collect()
}

/// Recompute every total from scratch: zero all counters, then walk the
/// assigned, non-junk course list. The engine maintains totals
/// incrementally; this is the oracle the incremental path must agree
/// with.
pub fn recompute_all(check: &mut DegreeCheck) {
    for reqt in check.tree.unit_requirements.values_mut() {
        reqt.units_completed = 0.0;
    }
    let contributions: Vec<(Vec<DbId>, f64)> = check
        .courses()
        .map(|course| (contribution_set(check, course), course.units))
        .collect();
    for (reqt_ids, units) in contributions {
        add_contribution(&mut check.tree, &reqt_ids, units);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
