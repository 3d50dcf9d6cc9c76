//! Per-student degree checks: cloning a template into an independent,
//! live instance and managing its course list.
//!
//! Cloning is an explicit recursive walk that rebuilds every node
//! field-by-field with fresh ids, rather than a blanket deep copy. An
//! id map built during the walk re-targets intra-tree references
//! (parents, unit-requirement sets) so the clone never aliases template
//! nodes. Mutating a clone must never affect its template, or any other
//! clone of the same template.

use std::collections::BTreeMap;

use crate::course::{CourseInstance, TRANSFER_GRADE};
use crate::error::CoreError;
use crate::fulfillment;
use crate::template::{RequirementTemplate, RequirementTree};
use crate::types::{DbId, Timestamp};
use crate::units::validate_units;

/// A student's instantiation of a requirement template at a point in time.
#[derive(Debug, Clone)]
pub struct DegreeCheck {
    pub check_id: DbId,
    pub student_sid: String,
    pub degree_name: String,
    pub parent_template_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub degree_note: Option<String>,
    pub tree: RequirementTree,
    pub(crate) courses: BTreeMap<DbId, CourseInstance>,
}

impl DegreeCheck {
    /// Clone `template` for one student.
    ///
    /// Every unit requirement, category, subcategory, and course
    /// requirement is copied into a fresh arena. `units_completed` on
    /// every cloned unit requirement starts at 0 regardless of whatever
    /// the template carries; templates hold no real completion data.
    ///
    /// For every cloned course requirement flagged as a transfer course,
    /// one completed-course placeholder is synthesized (grade "T",
    /// manual, name and units from the requirement), appended to the
    /// course list, and assigned to that requirement. Its units roll up
    /// immediately.
    pub fn from_template(
        template: &RequirementTemplate,
        check_id: DbId,
        student_sid: &str,
        now: Timestamp,
    ) -> Self {
        let mut tree = RequirementTree::new();
        let source = &template.tree;

        // Unit requirements first; categories and course requirements
        // reference them by id.
        let mut unit_reqt_ids: BTreeMap<DbId, DbId> = BTreeMap::new();
        for (old_id, reqt) in &source.unit_requirements {
            let new_id = tree.add_unit_requirement(&reqt.name, reqt.unit_count);
            unit_reqt_ids.insert(*old_id, new_id);
        }
        let map_unit_reqts = |ids: &[DbId], map: &BTreeMap<DbId, DbId>| -> Vec<DbId> {
            ids.iter().map(|id| map[id]).collect()
        };

        let mut transfer_reqt_ids: Vec<DbId> = Vec::new();
        for old_category_id in &source.root_category_ids {
            let category = &source.categories[old_category_id];
            let new_category_id = tree
                .add_category(
                    &category.name,
                    category.description.as_deref(),
                    category.column_position,
                    map_unit_reqts(&category.unit_requirement_ids, &unit_reqt_ids),
                )
                .expect("unit requirements cloned above");

            for old_reqt_id in &category.course_requirement_ids {
                let reqt = &source.course_requirements[old_reqt_id];
                let new_reqt_id = tree
                    .add_course_requirement(
                        new_category_id,
                        &reqt.name,
                        reqt.units,
                        reqt.is_transfer_course,
                        Some(map_unit_reqts(&reqt.unit_requirement_ids, &unit_reqt_ids)),
                    )
                    .expect("parent category created above");
                if reqt.is_transfer_course {
                    transfer_reqt_ids.push(new_reqt_id);
                }
            }

            for old_sub_id in &category.subcategory_ids {
                let sub = &source.categories[old_sub_id];
                let new_sub_id = tree
                    .add_subcategory(
                        new_category_id,
                        &sub.name,
                        sub.description.as_deref(),
                        map_unit_reqts(&sub.unit_requirement_ids, &unit_reqt_ids),
                    )
                    .expect("parent category created above");
                // The builder leaves subcategory positions unset so they
                // inherit; a template subcategory may carry its own.
                tree.categories
                    .get_mut(&new_sub_id)
                    .expect("subcategory created above")
                    .column_position = sub.column_position;
                for old_reqt_id in &sub.course_requirement_ids {
                    let reqt = &source.course_requirements[old_reqt_id];
                    let new_reqt_id = tree
                        .add_course_requirement(
                            new_sub_id,
                            &reqt.name,
                            reqt.units,
                            reqt.is_transfer_course,
                            Some(map_unit_reqts(&reqt.unit_requirement_ids, &unit_reqt_ids)),
                        )
                        .expect("parent subcategory created above");
                    if reqt.is_transfer_course {
                        transfer_reqt_ids.push(new_reqt_id);
                    }
                }
            }
        }

        let mut check = Self {
            check_id,
            student_sid: student_sid.to_string(),
            degree_name: template.name.clone(),
            parent_template_id: template.template_id,
            created_at: now,
            updated_at: now,
            degree_note: None,
            tree,
            courses: BTreeMap::new(),
        };
        for reqt_id in transfer_reqt_ids {
            check.synthesize_transfer_course(reqt_id);
        }

        tracing::debug!(
            check_id,
            student_sid,
            template_id = template.template_id,
            "Cloned degree template"
        );
        check
    }

    fn synthesize_transfer_course(&mut self, reqt_id: DbId) {
        let reqt = &self.tree.course_requirements[&reqt_id];
        let units = reqt.units.map(|u| u.lower()).unwrap_or(0.0);
        let name = reqt.name.clone();

        let course_id = self.tree.alloc_id();
        let mut course = CourseInstance::manual_course(course_id, &name, units);
        course.grade = Some(TRANSFER_GRADE.to_string());
        course.assigned_requirement = Some(reqt_id);
        self.courses.insert(course_id, course);

        let reqt = self
            .tree
            .course_requirements
            .get_mut(&reqt_id)
            .expect("transfer requirement cloned above");
        reqt.assigned_course = Some(course_id);

        let fulfills = self.tree.course_requirements[&reqt_id]
            .unit_requirement_ids
            .clone();
        fulfillment::add_contribution(&mut self.tree, &fulfills, units);
    }

    // -- course list ---------------------------------------------------------

    pub fn course(&self, id: DbId) -> Result<&CourseInstance, CoreError> {
        self.courses.get(&id).ok_or(CoreError::NotFound {
            entity: "course",
            id,
        })
    }

    pub(crate) fn course_mut(&mut self, id: DbId) -> Result<&mut CourseInstance, CoreError> {
        self.courses.get_mut(&id).ok_or(CoreError::NotFound {
            entity: "course",
            id,
        })
    }

    pub fn courses(&self) -> impl Iterator<Item = &CourseInstance> {
        self.courses.values()
    }

    /// Courses not assigned anywhere and not junked.
    pub fn unassigned_courses(&self) -> impl Iterator<Item = &CourseInstance> {
        self.courses
            .values()
            .filter(|c| !c.is_assigned() && !c.is_junk)
    }

    /// The junk ("cornfield") holding area.
    pub fn junk_courses(&self) -> impl Iterator<Item = &CourseInstance> {
        self.courses.values().filter(|c| c.is_junk)
    }

    /// Ingest one course from the student's SIS enrollment feed. The feed
    /// itself is an external collaborator; units arrive pre-validated
    /// from SIS and are checked here anyway.
    pub fn add_sis_course(
        &mut self,
        name: &str,
        grade: Option<&str>,
        units: f64,
        term_id: &str,
        section_id: i64,
    ) -> Result<DbId, CoreError> {
        validate_units(units)?;
        let id = self.tree.alloc_id();
        self.courses.insert(
            id,
            CourseInstance::sis_course(id, name, grade, units, term_id, section_id),
        );
        Ok(id)
    }

    /// Add a manually-entered course.
    pub fn add_manual_course(&mut self, name: &str, units: f64) -> Result<DbId, CoreError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Validation(
                "Course name must not be empty".to_string(),
            ));
        }
        validate_units(units)?;
        let id = self.tree.alloc_id();
        self.courses
            .insert(id, CourseInstance::manual_course(id, trimmed, units));
        Ok(id)
    }

    // -- degree note ---------------------------------------------------------

    /// Create or replace the advisor note attached to this degree check.
    /// An empty body clears the note.
    pub fn upsert_note(&mut self, body: &str, now: Timestamp) {
        let trimmed = body.trim();
        self.degree_note = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self.updated_at = now;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
