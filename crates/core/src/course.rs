//! Completed, in-progress, manually-entered, and transfer course instances.
//!
//! A course instance can be assigned to at most one requirement slot, can
//! be parked in the junk holding area, and can be copied so the same
//! completed course appears under multiple slots without duplicating its
//! identity. Copies have independent assignment and fulfillment state.

use crate::types::DbId;

/// Grade recorded on auto-generated transfer-course placeholders.
pub const TRANSFER_GRADE: &str = "T";

/// One student course as it appears on a degree check.
#[derive(Debug, Clone)]
pub struct CourseInstance {
    pub id: DbId,
    pub name: String,
    pub grade: Option<String>,
    pub units: f64,
    pub term_id: Option<String>,
    pub section_id: Option<i64>,
    pub note: Option<String>,
    pub color: Option<String>,
    pub is_manual: bool,
    pub is_junk: bool,
    /// The course requirement currently holding this course, if any.
    /// Mutually exclusive with `is_junk`.
    pub assigned_requirement: Option<DbId>,
    /// Explicit fulfillment override. `None` inherits the assigned slot's
    /// set; `Some(vec![])` is an explicit "fulfills nothing".
    pub unit_requirement_override: Option<Vec<DbId>>,
    /// Back-reference to the course this one was copied from.
    pub original: Option<DbId>,
    /// Forward references to copies made of this course.
    pub copy_ids: Vec<DbId>,
}

impl CourseInstance {
    /// A SIS-sourced course from the student's enrollment feed.
    pub fn sis_course(
        id: DbId,
        name: &str,
        grade: Option<&str>,
        units: f64,
        term_id: &str,
        section_id: i64,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            grade: grade.map(str::to_string),
            units,
            term_id: Some(term_id.to_string()),
            section_id: Some(section_id),
            note: None,
            color: None,
            is_manual: false,
            is_junk: false,
            assigned_requirement: None,
            unit_requirement_override: None,
            original: None,
            copy_ids: Vec::new(),
        }
    }

    /// A course entered by hand by the advisor.
    pub fn manual_course(id: DbId, name: &str, units: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            grade: None,
            units,
            term_id: None,
            section_id: None,
            note: None,
            color: None,
            is_manual: true,
            is_junk: false,
            assigned_requirement: None,
            unit_requirement_override: None,
            original: None,
            copy_ids: Vec::new(),
        }
    }

    /// A fresh copy sharing identity attributes with `self` but carrying
    /// independent assignment state. The copy starts with the empty
    /// fulfillment override: it contributes nothing until edited.
    pub fn copy_of(&self, id: DbId) -> Self {
        Self {
            id,
            name: self.name.clone(),
            grade: self.grade.clone(),
            units: self.units,
            term_id: self.term_id.clone(),
            section_id: self.section_id,
            note: None,
            color: None,
            is_manual: self.is_manual,
            is_junk: false,
            assigned_requirement: None,
            unit_requirement_override: Some(Vec::new()),
            original: Some(self.id),
            copy_ids: Vec::new(),
        }
    }

    pub fn is_copy(&self) -> bool {
        self.original.is_some()
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_requirement.is_some()
    }

    /// Identity key used to detect the same underlying course appearing
    /// twice under one category: term and section for SIS courses, the
    /// display name for manual entries.
    pub fn identity_key(&self) -> (Option<&str>, Option<i64>, &str) {
        (self.term_id.as_deref(), self.section_id, self.name.as_str())
    }
}
