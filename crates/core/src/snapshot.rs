//! Read-only serialization of a degree check for UI rendering and
//! export feeds.
//!
//! The snapshot is a fully-owned tree: nothing in it borrows the live
//! degree check, so callers can hand it to a renderer or serializer
//! after further mutations. Numeric formatting rules arrive explicitly
//! via [`UnitFormat`].

use serde::Serialize;

use crate::course::CourseInstance;
use crate::degree_check::DegreeCheck;
use crate::fulfillment;
use crate::template::{Category, CategoryKind};
use crate::types::DbId;
use crate::units::UnitFormat;

#[derive(Debug, Clone, Serialize)]
pub struct DegreeCheckSnapshot {
    pub check_id: DbId,
    pub degree_name: String,
    pub student_sid: String,
    pub note: Option<String>,
    pub unit_requirements: Vec<UnitRequirementView>,
    pub categories: Vec<CategoryView>,
    pub unassigned_courses: Vec<CourseView>,
    pub junk_courses: Vec<CourseView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitRequirementView {
    pub id: DbId,
    pub name: String,
    pub unit_count: String,
    pub units_completed: String,
    pub is_satisfied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub id: DbId,
    pub kind: CategoryKind,
    pub name: String,
    pub description: Option<String>,
    pub column_position: Option<i32>,
    pub course_requirements: Vec<CourseRequirementView>,
    pub subcategories: Vec<CategoryView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseRequirementView {
    pub id: DbId,
    pub name: String,
    pub units: Option<String>,
    pub is_transfer_course: bool,
    pub is_placeholder: bool,
    pub assigned_course: Option<CourseView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseView {
    pub id: DbId,
    pub name: String,
    pub units: String,
    pub grade: Option<String>,
    pub term_id: Option<String>,
    pub note: Option<String>,
    pub color: Option<String>,
    pub is_manual: bool,
    pub is_copy: bool,
    /// Set when the course's fulfillment was edited away from the
    /// inherited default; shown as the "edited" indicator.
    pub is_fulfillment_edited: bool,
    /// Names of the unit requirements this course currently fulfills.
    pub fulfills: Vec<String>,
}

impl DegreeCheckSnapshot {
    pub fn of(check: &DegreeCheck, format: &UnitFormat) -> Self {
        let unit_requirements = check
            .tree
            .unit_requirements
            .values()
            .map(|reqt| UnitRequirementView {
                id: reqt.id,
                name: reqt.name.clone(),
                unit_count: format.format(reqt.unit_count),
                units_completed: format.format(reqt.units_completed),
                is_satisfied: reqt.is_satisfied(),
            })
            .collect();

        let categories = check
            .tree
            .root_category_ids
            .iter()
            .filter_map(|id| check.tree.categories.get(id))
            .map(|category| category_view(check, category, format))
            .collect();

        let unassigned_courses = check
            .unassigned_courses()
            .map(|course| course_view(check, course, format))
            .collect();
        let junk_courses = check
            .junk_courses()
            .map(|course| course_view(check, course, format))
            .collect();

        Self {
            check_id: check.check_id,
            degree_name: check.degree_name.clone(),
            student_sid: check.student_sid.clone(),
            note: check.degree_note.clone(),
            unit_requirements,
            categories,
            unassigned_courses,
            junk_courses,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("snapshot types serialize infallibly")
    }
}

fn category_view(check: &DegreeCheck, category: &Category, format: &UnitFormat) -> CategoryView {
    let course_requirements = category
        .course_requirement_ids
        .iter()
        .filter_map(|id| check.tree.course_requirements.get(id))
        .map(|reqt| CourseRequirementView {
            id: reqt.id,
            name: reqt.name.clone(),
            units: reqt.units.map(|u| u.to_string()),
            is_transfer_course: reqt.is_transfer_course,
            is_placeholder: reqt.is_placeholder,
            assigned_course: reqt
                .assigned_course
                .and_then(|id| check.course(id).ok())
                .map(|course| course_view(check, course, format)),
        })
        .collect();

    let subcategories = category
        .subcategory_ids
        .iter()
        .filter_map(|id| check.tree.categories.get(id))
        .map(|sub| category_view(check, sub, format))
        .collect();

    CategoryView {
        id: category.id,
        kind: category.kind,
        name: category.name.clone(),
        description: category.description.clone(),
        column_position: check
            .tree
            .effective_column_position(category.id)
            .unwrap_or(category.column_position),
        course_requirements,
        subcategories,
    }
}

fn course_view(check: &DegreeCheck, course: &CourseInstance, format: &UnitFormat) -> CourseView {
    let fulfills = fulfillment::contribution_set(check, course)
        .into_iter()
        .filter_map(|id| check.tree.unit_requirements.get(&id))
        .map(|reqt| reqt.name.clone())
        .collect();
    CourseView {
        id: course.id,
        name: course.name.clone(),
        units: format.format(course.units),
        grade: course.grade.clone(),
        term_id: course.term_id.clone(),
        note: course.note.clone(),
        color: course.color.clone(),
        is_manual: course.is_manual,
        is_copy: course.is_copy(),
        is_fulfillment_edited: fulfillment::is_fulfillment_edited(check, course),
        fulfills,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
