//! End-to-end degree check workflow tests.
//!
//! Drives the public API the way an advisor session does: author a
//! template, clone it for a student, ingest the enrollment feed, then
//! assign, copy, edit, junk, and unassign courses while watching the
//! unit-requirement totals and the rendered snapshot.

use chrono::Utc;

use degree_core::engine::{AssignTarget, CourseEdit};
use degree_core::fulfillment;
use degree_core::snapshot::DegreeCheckSnapshot;
use degree_core::types::DbId;
use degree_core::units::{RequirementUnits, UnitFormat};
use degree_core::{CoreError, DegreeCheck, RequirementTemplate};

// ---------------------------------------------------------------------------
// Fixture: a small but structurally complete degree template
// ---------------------------------------------------------------------------

struct Degree {
    check: DegreeCheck,
    core: DbId,
    breadth: DbId,
    history_101: DbId,
    transfer_slot: DbId,
    electives: DbId,
    upper_division: DbId,
}

/// Template layout:
///
/// - unit requirements: Core (12 units), Breadth (6 units)
/// - "Major Requirements" category fulfilling Core, holding the
///   HISTORY 101 slot and a 2.5-unit transfer-credit slot
/// - "Electives" bare category with no unit requirements
/// - "Upper Division" category holding one subcategory "Seminars"
fn degree() -> Degree {
    let mut template = RequirementTemplate::new(42, "History BA 2026", Utc::now());
    let core = template.tree.add_unit_requirement("Core", 12.0);
    let breadth = template.tree.add_unit_requirement("Breadth", 6.0);

    let major = template
        .tree
        .add_category("Major Requirements", None, Some(1), vec![core])
        .unwrap();
    template
        .tree
        .add_course_requirement(
            major,
            "HISTORY 101",
            Some(RequirementUnits::Single(4.0)),
            false,
            None,
        )
        .unwrap();
    template
        .tree
        .add_course_requirement(
            major,
            "Transfer Credit: World History",
            Some(RequirementUnits::Single(2.5)),
            true,
            None,
        )
        .unwrap();

    template
        .tree
        .add_category("Electives", None, Some(2), vec![])
        .unwrap();

    let upper = template
        .tree
        .add_category("Upper Division", None, Some(3), vec![breadth])
        .unwrap();
    template
        .tree
        .add_subcategory(upper, "Seminars", None, vec![breadth])
        .unwrap();

    let check = DegreeCheck::from_template(&template, 1, "3456789012", Utc::now());

    let mut unit_reqts = check.tree.unit_requirements.keys().copied();
    let core = unit_reqts.next().unwrap();
    let breadth = unit_reqts.next().unwrap();
    let history_101 = *check
        .tree
        .course_requirements
        .iter()
        .find(|(_, r)| r.name == "HISTORY 101")
        .map(|(id, _)| id)
        .unwrap();
    let transfer_slot = *check
        .tree
        .course_requirements
        .iter()
        .find(|(_, r)| r.is_transfer_course)
        .map(|(id, _)| id)
        .unwrap();
    let electives = check.tree.root_category_ids[1];
    let upper_division = check.tree.root_category_ids[2];

    Degree {
        check,
        core,
        breadth,
        history_101,
        transfer_slot,
        electives,
        upper_division,
    }
}

fn completed(check: &mut DegreeCheck) -> DbId {
    check
        .add_sis_course("HISTORY 101", Some("A-"), 4.0, "2232", 30659)
        .unwrap()
}

// ---------------------------------------------------------------------------
// Cloning
// ---------------------------------------------------------------------------

#[test]
fn cloned_degree_starts_with_only_transfer_fulfillment() {
    let d = degree();
    // The synthesized transfer course is assigned and counted; nothing
    // else contributes yet.
    assert_eq!(d.check.tree.unit_requirements[&d.core].units_completed, 2.5);
    assert_eq!(d.check.tree.unit_requirements[&d.breadth].units_completed, 0.0);

    let transfer = d.check.tree.course_requirements[&d.transfer_slot]
        .assigned_course
        .unwrap();
    let course = d.check.course(transfer).unwrap();
    assert_eq!(course.grade.as_deref(), Some("T"));
    assert!(course.is_manual);
    assert_eq!(course.units, 2.5);
}

#[test]
fn template_survives_a_full_advisor_session_on_the_clone() {
    let mut template = RequirementTemplate::new(42, "History BA 2026", Utc::now());
    let core = template.tree.add_unit_requirement("Core", 12.0);
    let major = template
        .tree
        .add_category("Major Requirements", None, None, vec![core])
        .unwrap();
    template
        .tree
        .add_course_requirement(major, "HISTORY 101", None, false, None)
        .unwrap();

    let mut check = DegreeCheck::from_template(&template, 1, "3456789012", Utc::now());
    let slot = *check.tree.course_requirements.keys().next().unwrap();
    let course = check
        .add_sis_course("HISTORY 101", Some("B+"), 4.0, "2232", 30659)
        .unwrap();
    check.assign(course, AssignTarget::Requirement(slot)).unwrap();
    check
        .edit_course(
            course,
            CourseEdit {
                note: Some("Counts toward the minor too".to_string()),
                ..CourseEdit::default()
            },
        )
        .unwrap();
    check.junk(course).unwrap();

    assert!(template
        .tree
        .unit_requirements
        .values()
        .all(|r| r.units_completed == 0.0));
    assert!(template
        .tree
        .course_requirements
        .values()
        .all(|r| r.assigned_course.is_none()));
}

// ---------------------------------------------------------------------------
// Assignment lifecycle
// ---------------------------------------------------------------------------

#[test]
fn assign_edit_unassign_restores_the_starting_totals() {
    let mut d = degree();
    let course = completed(&mut d.check);

    d.check
        .assign(course, AssignTarget::Requirement(d.history_101))
        .unwrap();
    assert_eq!(d.check.tree.unit_requirements[&d.core].units_completed, 6.5);

    d.check
        .edit_course(
            course,
            CourseEdit {
                units: Some(3.0),
                ..CourseEdit::default()
            },
        )
        .unwrap();
    assert_eq!(d.check.tree.unit_requirements[&d.core].units_completed, 5.5);

    d.check.unassign(course).unwrap();
    assert_eq!(d.check.tree.unit_requirements[&d.core].units_completed, 2.5);

    // Second unassign is a quiet no-op.
    let outcome = d.check.unassign(course).unwrap();
    assert!(outcome.changed_unit_requirements.is_empty());
}

#[test]
fn category_with_subcategories_never_accepts_a_course() {
    let mut d = degree();
    let course = completed(&mut d.check);
    let err = d
        .check
        .assign(course, AssignTarget::Category(d.upper_division))
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(err.to_string().contains("subcategory"));
}

#[test]
fn placeholder_slots_come_and_go_with_the_assignment() {
    let mut d = degree();
    let course = completed(&mut d.check);

    d.check
        .assign(course, AssignTarget::Category(d.electives))
        .unwrap();
    let placeholder_count = d
        .check
        .tree
        .course_requirements
        .values()
        .filter(|r| r.is_placeholder)
        .count();
    assert_eq!(placeholder_count, 1);

    d.check
        .reassign(course, AssignTarget::Requirement(d.history_101))
        .unwrap();
    assert!(d
        .check
        .tree
        .course_requirements
        .values()
        .all(|r| !r.is_placeholder));
    assert_eq!(d.check.tree.unit_requirements[&d.core].units_completed, 6.5);
}

// ---------------------------------------------------------------------------
// Copies
// ---------------------------------------------------------------------------

#[test]
fn copies_fulfill_nothing_until_the_advisor_says_so() {
    let mut d = degree();
    let course = completed(&mut d.check);
    d.check
        .assign(course, AssignTarget::Requirement(d.history_101))
        .unwrap();

    let seminars = d.check.tree.categories[&d.upper_division].subcategory_ids[0];
    let copy_id = d
        .check
        .copy(course, AssignTarget::Category(seminars))
        .unwrap()
        .course_id;

    assert_eq!(d.check.tree.unit_requirements[&d.breadth].units_completed, 0.0);

    d.check
        .edit_course(
            copy_id,
            CourseEdit {
                unit_requirements: Some(vec![d.breadth]),
                ..CourseEdit::default()
            },
        )
        .unwrap();
    assert_eq!(d.check.tree.unit_requirements[&d.breadth].units_completed, 4.0);

    // Deleting the copy takes its contribution with it and leaves the
    // original where it was.
    d.check.delete_copy(copy_id).unwrap();
    assert_eq!(d.check.tree.unit_requirements[&d.breadth].units_completed, 0.0);
    assert_eq!(
        d.check.course(course).unwrap().assigned_requirement,
        Some(d.history_101)
    );
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[test]
fn snapshot_totals_match_engine_totals_after_a_busy_session() {
    let mut d = degree();
    let a = completed(&mut d.check);
    let b = d.check.add_manual_course("ART 10", 1.35).unwrap();

    d.check
        .assign(a, AssignTarget::Requirement(d.history_101))
        .unwrap();
    d.check.assign(b, AssignTarget::Category(d.electives)).unwrap();
    d.check
        .edit_course(
            b,
            CourseEdit {
                unit_requirements: Some(vec![d.core, d.breadth]),
                ..CourseEdit::default()
            },
        )
        .unwrap();
    d.check.upsert_note("Reviewed 8/26.", Utc::now());

    fulfillment::recompute_all(&mut d.check);
    let snapshot = DegreeCheckSnapshot::of(&d.check, &UnitFormat::default());

    // Core: 2.5 transfer + 4 assigned + 1.35 override = 7.85
    let core_view = snapshot
        .unit_requirements
        .iter()
        .find(|r| r.name == "Core")
        .unwrap();
    assert_eq!(core_view.units_completed, "7.85");
    let breadth_view = snapshot
        .unit_requirements
        .iter()
        .find(|r| r.name == "Breadth")
        .unwrap();
    assert_eq!(breadth_view.units_completed, "1.35");

    assert_eq!(snapshot.note.as_deref(), Some("Reviewed 8/26."));
    let json = snapshot.to_json();
    assert_eq!(json["unit_requirements"][0]["units_completed"], "7.85");
}
