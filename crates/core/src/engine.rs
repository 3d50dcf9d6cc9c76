//! Course assignment, copying, junking, and editing, with synchronous
//! unit rollup.
//!
//! Every operation is a single logical transaction on one degree check:
//! it either returns an error having changed nothing, or leaves the tree
//! consistent before returning. Totals are maintained incrementally as
//! remove-old-contribution / add-new-contribution, so no reader can ever
//! observe a transient double count.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::course::CourseInstance;
use crate::degree_check::DegreeCheck;
use crate::error::CoreError;
use crate::fulfillment;
use crate::template::CategoryKind;
use crate::types::DbId;
use crate::units::{validate_units, RequirementUnits};

// ---------------------------------------------------------------------------
// Operation inputs and outputs
// ---------------------------------------------------------------------------

/// Where a course is being placed: a named course-requirement slot, or a
/// bare category/subcategory (which materializes a placeholder slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignTarget {
    Requirement(DbId),
    Category(DbId),
}

/// Result of one engine operation: the course that was mutated plus the
/// unit requirements whose totals changed, sorted and deduplicated.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub course_id: DbId,
    pub changed_unit_requirements: Vec<DbId>,
}

impl Outcome {
    fn unchanged(course_id: DbId) -> Self {
        Self {
            course_id,
            changed_unit_requirements: Vec::new(),
        }
    }
}

/// Partial update applied by [`DegreeCheck::edit_course`]. `None` fields
/// are left untouched. Setting `unit_requirements` installs an explicit
/// override; an empty list means "fulfills nothing".
#[derive(Debug, Clone, Default)]
pub struct CourseEdit {
    pub units: Option<f64>,
    pub grade: Option<String>,
    pub note: Option<String>,
    pub color: Option<String>,
    pub unit_requirements: Option<Vec<DbId>>,
}

// ---------------------------------------------------------------------------
// Engine operations
// ---------------------------------------------------------------------------

impl DegreeCheck {
    /// Assign an unassigned (or junked) course to a slot or bare
    /// category. Junked courses come straight out of the junk area.
    pub fn assign(&mut self, course_id: DbId, target: AssignTarget) -> Result<Outcome, CoreError> {
        let course = self.course(course_id)?;
        if course.is_assigned() {
            return Err(CoreError::Conflict(format!(
                "Course {course_id} is already assigned. Use reassign."
            )));
        }
        let changed = self.attach(course_id, target)?;
        tracing::debug!(course_id, ?target, "Assigned course");
        Ok(Outcome {
            course_id,
            changed_unit_requirements: changed,
        })
    }

    /// Move an assigned course to a new slot or category. The net effect
    /// on totals equals remove-old plus add-new.
    pub fn reassign(
        &mut self,
        course_id: DbId,
        target: AssignTarget,
    ) -> Result<Outcome, CoreError> {
        let course = self.course(course_id)?;
        if !course.is_assigned() {
            return Err(CoreError::Validation(format!(
                "Course {course_id} is unassigned. Use assign instead."
            )));
        }
        self.check_attach_target(course_id, target)?;
        let mut changed = self.detach(course_id)?;
        changed.extend(self.attach(course_id, target)?);
        changed.sort_unstable();
        changed.dedup();
        tracing::debug!(course_id, ?target, "Reassigned course");
        Ok(Outcome {
            course_id,
            changed_unit_requirements: changed,
        })
    }

    /// Clear a course's assignment. The course instance is preserved and
    /// returns to the unassigned list; a placeholder slot materialized
    /// for it is removed; a durable slot goes back to showing its
    /// template defaults. Calling this on an already-unassigned course is
    /// a no-op.
    pub fn unassign(&mut self, course_id: DbId) -> Result<Outcome, CoreError> {
        self.course(course_id)?;
        let changed = self.detach(course_id)?;
        tracing::debug!(course_id, "Unassigned course");
        Ok(Outcome {
            course_id,
            changed_unit_requirements: changed,
        })
    }

    /// Move a course to the junk holding area. An assigned course is
    /// unassigned first (same side effects as [`Self::unassign`]).
    pub fn junk(&mut self, course_id: DbId) -> Result<Outcome, CoreError> {
        if self.course(course_id)?.is_junk {
            return Ok(Outcome::unchanged(course_id));
        }
        let changed = self.detach(course_id)?;
        self.course_mut(course_id)?.is_junk = true;
        tracing::debug!(course_id, "Junked course");
        Ok(Outcome {
            course_id,
            changed_unit_requirements: changed,
        })
    }

    /// Pull a course back out of the junk area into the unassigned list.
    pub fn unjunk(&mut self, course_id: DbId) -> Result<Outcome, CoreError> {
        let course = self.course_mut(course_id)?;
        if !course.is_junk {
            return Ok(Outcome::unchanged(course_id));
        }
        course.is_junk = false;
        tracing::debug!(course_id, "Unjunked course");
        Ok(Outcome::unchanged(course_id))
    }

    /// Copy an assigned course into another slot or category. The copy
    /// shares identity with the original but starts with the empty
    /// fulfillment override, so it contributes nothing until edited.
    /// Returns the new copy's id in the outcome.
    pub fn copy(&mut self, course_id: DbId, target: AssignTarget) -> Result<Outcome, CoreError> {
        let course = self.course(course_id)?;
        if !course.is_assigned() {
            return Err(CoreError::Validation(format!(
                "Course {course_id} is unassigned. Use assign instead."
            )));
        }
        // The copy does not exist yet, so nothing is excluded from the
        // duplicate check: an original already sitting in the target
        // category blocks the copy.
        self.check_target_for(course, None, target)?;

        let copy_id = self.tree.alloc_id();
        let copy = self.course(course_id)?.copy_of(copy_id);
        self.courses.insert(copy_id, copy);
        self.course_mut(course_id)?.copy_ids.push(copy_id);

        let changed = self.attach(copy_id, target)?;
        tracing::debug!(course_id, copy_id, ?target, "Copied course");
        Ok(Outcome {
            course_id: copy_id,
            changed_unit_requirements: changed,
        })
    }

    /// Delete a copy. The original is unlinked but otherwise untouched.
    pub fn delete_copy(&mut self, copy_id: DbId) -> Result<Outcome, CoreError> {
        let copy = self.course(copy_id)?;
        let Some(original_id) = copy.original else {
            return Err(CoreError::Validation(format!(
                "Course {copy_id} is not a copy and cannot be deleted here"
            )));
        };
        let copy_ids = copy.copy_ids.clone();
        let changed = self.detach(copy_id)?;
        if let Ok(original) = self.course_mut(original_id) {
            original.copy_ids.retain(|&id| id != copy_id);
        }
        // Copies made of this copy lose their back-reference and live on.
        for survivor_id in copy_ids {
            if let Ok(survivor) = self.course_mut(survivor_id) {
                survivor.original = None;
            }
        }
        self.courses.remove(&copy_id);
        tracing::debug!(copy_id, original_id, "Deleted course copy");
        Ok(Outcome {
            course_id: copy_id,
            changed_unit_requirements: changed,
        })
    }

    /// Delete a manually-entered course outright. Live copies are not
    /// cascade-deleted; they lose their back-reference and live on.
    pub fn remove_manual_course(&mut self, course_id: DbId) -> Result<Outcome, CoreError> {
        let course = self.course(course_id)?;
        if !course.is_manual || course.is_copy() {
            return Err(CoreError::Validation(format!(
                "Course {course_id} is not a manually created course"
            )));
        }
        let copy_ids = course.copy_ids.clone();
        let changed = self.detach(course_id)?;
        for copy_id in copy_ids {
            if let Ok(copy) = self.course_mut(copy_id) {
                copy.original = None;
            }
        }
        self.courses.remove(&course_id);
        tracing::debug!(course_id, "Removed manual course");
        Ok(Outcome {
            course_id,
            changed_unit_requirements: changed,
        })
    }

    /// Apply a partial edit. A changed `units` value or fulfillment
    /// override recomputes totals as a superset diff: requirements that
    /// lost the course are decremented, requirements that gained it are
    /// incremented, and requirements keeping it absorb the unit delta.
    pub fn edit_course(&mut self, course_id: DbId, edit: CourseEdit) -> Result<Outcome, CoreError> {
        if let Some(units) = edit.units {
            validate_units(units)?;
        }
        if let Some(reqt_ids) = &edit.unit_requirements {
            for &id in reqt_ids {
                self.tree.unit_requirement(id)?;
            }
        }

        let before = self.course(course_id)?.clone();
        let old_set = fulfillment::contribution_set(self, &before);
        let old_units = before.units;

        {
            let course = self.course_mut(course_id)?;
            if let Some(units) = edit.units {
                course.units = units;
            }
            if let Some(grade) = edit.grade {
                course.grade = Some(grade);
            }
            if let Some(note) = edit.note {
                course.note = if note.trim().is_empty() {
                    None
                } else {
                    Some(note)
                };
            }
            if let Some(color) = edit.color {
                course.color = Some(color);
            }
            if let Some(reqt_ids) = edit.unit_requirements {
                course.unit_requirement_override = Some(reqt_ids);
            }
        }

        let after = self.course(course_id)?.clone();
        let new_set = fulfillment::contribution_set(self, &after);
        let new_units = after.units;

        let mut deltas: BTreeMap<DbId, f64> = BTreeMap::new();
        for id in old_set {
            *deltas.entry(id).or_insert(0.0) -= old_units;
        }
        for id in new_set {
            *deltas.entry(id).or_insert(0.0) += new_units;
        }
        let mut changed = Vec::new();
        for (id, delta) in deltas {
            if delta != 0.0 {
                if let Some(reqt) = self.tree.unit_requirements.get_mut(&id) {
                    reqt.units_completed += delta;
                    changed.push(id);
                }
            }
        }

        tracing::debug!(course_id, changed = changed.len(), "Edited course");
        Ok(Outcome {
            course_id,
            changed_unit_requirements: changed,
        })
    }

    // -- internals -----------------------------------------------------------

    /// Validate a target for the named course without mutating anything.
    fn check_attach_target(&self, course_id: DbId, target: AssignTarget) -> Result<(), CoreError> {
        let course = self.course(course_id)?;
        self.check_target_for(course, Some(course_id), target)
    }

    /// Validate a target for a course whose instance may not exist yet
    /// (a copy about to be created). `exclude` names an instance whose
    /// presence in the target does not count as a duplicate: the course
    /// itself when validating its own move.
    fn check_target_for(
        &self,
        course: &CourseInstance,
        exclude: Option<DbId>,
        target: AssignTarget,
    ) -> Result<(), CoreError> {
        match target {
            AssignTarget::Requirement(reqt_id) => {
                let reqt = self.tree.course_requirement(reqt_id)?;
                match reqt.assigned_course {
                    Some(existing) if Some(existing) == exclude => {
                        Err(CoreError::Conflict(format!(
                            "Course {existing} is already assigned to requirement {reqt_id}"
                        )))
                    }
                    Some(_) => Err(CoreError::Conflict(format!(
                        "Requirement {reqt_id} already holds a course"
                    ))),
                    None => Ok(()),
                }
            }
            AssignTarget::Category(category_id) => {
                let category = self.tree.category(category_id)?;
                if category.kind == CategoryKind::Category && category.has_subcategories() {
                    return Err(CoreError::Validation(
                        "A course cannot be assigned to a category with a subcategory".to_string(),
                    ));
                }
                if self.category_holds_like(category_id, course, exclude) {
                    return Err(CoreError::Conflict(format!(
                        "Course already belongs to category {}",
                        category.name
                    )));
                }
                Ok(())
            }
        }
    }

    /// Whether any slot under the category already holds a course with
    /// the same identity (term/section for SIS courses, name for manual
    /// entries). Prevents silent double-placement of one course.
    fn category_holds_like(
        &self,
        category_id: DbId,
        course: &CourseInstance,
        exclude: Option<DbId>,
    ) -> bool {
        let Ok(category) = self.tree.category(category_id) else {
            return false;
        };
        category
            .course_requirement_ids
            .iter()
            .filter_map(|reqt_id| self.tree.course_requirements.get(reqt_id))
            .filter_map(|reqt| reqt.assigned_course)
            .filter(|&held| Some(held) != exclude)
            .filter_map(|held| self.courses.get(&held))
            .any(|held| held.identity_key() == course.identity_key())
    }

    /// Place a course into the target, materializing a placeholder slot
    /// under a bare category, and add its contribution to the rollup.
    fn attach(&mut self, course_id: DbId, target: AssignTarget) -> Result<Vec<DbId>, CoreError> {
        self.check_attach_target(course_id, target)?;

        let reqt_id = match target {
            AssignTarget::Requirement(reqt_id) => reqt_id,
            AssignTarget::Category(category_id) => {
                let (name, units) = {
                    let course = self.course(course_id)?;
                    (course.name.clone(), course.units)
                };
                let reqt_id = self.tree.add_course_requirement(
                    category_id,
                    &name,
                    Some(RequirementUnits::Single(units)),
                    false,
                    None,
                )?;
                self.tree
                    .course_requirements
                    .get_mut(&reqt_id)
                    .expect("placeholder created above")
                    .is_placeholder = true;
                reqt_id
            }
        };

        {
            let course = self.course_mut(course_id)?;
            course.assigned_requirement = Some(reqt_id);
            course.is_junk = false;
        }
        self.tree
            .course_requirements
            .get_mut(&reqt_id)
            .expect("validated or created above")
            .assigned_course = Some(course_id);

        let course = self.course(course_id)?.clone();
        let fulfills = fulfillment::contribution_set(self, &course);
        Ok(fulfillment::add_contribution(
            &mut self.tree,
            &fulfills,
            course.units,
        ))
    }

    /// Remove a course from its slot, subtract its contribution, and
    /// clean up a placeholder slot. Idempotent.
    fn detach(&mut self, course_id: DbId) -> Result<Vec<DbId>, CoreError> {
        let course = self.course(course_id)?.clone();
        let Some(reqt_id) = course.assigned_requirement else {
            return Ok(Vec::new());
        };

        let fulfills = fulfillment::contribution_set(self, &course);
        let changed = fulfillment::remove_contribution(&mut self.tree, &fulfills, course.units);

        self.course_mut(course_id)?.assigned_requirement = None;

        let is_placeholder = match self.tree.course_requirements.get_mut(&reqt_id) {
            Some(reqt) => {
                reqt.assigned_course = None;
                reqt.is_placeholder
            }
            None => false,
        };
        if is_placeholder {
            let parent_id = self.tree.course_requirements[&reqt_id].parent_category;
            if let Some(parent) = self.tree.categories.get_mut(&parent_id) {
                parent.course_requirement_ids.retain(|&id| id != reqt_id);
            }
            self.tree.course_requirements.remove(&reqt_id);
        }
        Ok(changed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
