//! Degree requirement templates: unit requirements, the category tree,
//! and course-requirement slots.
//!
//! The tree is arena-backed: categories and course requirements live in
//! id-keyed maps owned by [`RequirementTree`], and parent/child edges are
//! plain [`DbId`] references rather than owning pointers. Templates carry
//! no live completion data; per-student state lives on
//! [`crate::degree_check::DegreeCheck`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};
use crate::units::RequirementUnits;

// ---------------------------------------------------------------------------
// Unit requirements
// ---------------------------------------------------------------------------

/// A named minimum-units-of-completion rule.
///
/// `units_completed` starts at 0 and is mutated only by the rollup engine
/// as courses are assigned and removed.
#[derive(Debug, Clone, Serialize)]
pub struct UnitRequirement {
    pub id: DbId,
    pub name: String,
    pub unit_count: f64,
    pub units_completed: f64,
}

impl UnitRequirement {
    /// Whether the completed total has reached the required minimum.
    pub fn is_satisfied(&self) -> bool {
        self.units_completed >= self.unit_count
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Grouping node kind. Nesting depth is at most two: a `Category` may hold
/// `Subcategory` children, a `Subcategory` may not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Category,
    Subcategory,
}

/// A grouping node in the requirement tree. May directly hold course
/// requirements or be purely organizational (holding only subcategories).
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: DbId,
    pub kind: CategoryKind,
    pub name: String,
    pub description: Option<String>,
    /// Display column; inherited from the parent when unset.
    pub column_position: Option<i32>,
    /// Non-owning back-reference; `None` for top-level categories.
    pub parent: Option<DbId>,
    pub unit_requirement_ids: Vec<DbId>,
    pub subcategory_ids: Vec<DbId>,
    pub course_requirement_ids: Vec<DbId>,
}

impl Category {
    /// A category with subcategories cannot directly accept courses.
    pub fn has_subcategories(&self) -> bool {
        !self.subcategory_ids.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Course requirements
// ---------------------------------------------------------------------------

/// A named slot expecting a specific course to be assigned.
///
/// Placeholder requirements are materialized on demand when a course is
/// assigned directly to a bare category rather than to a named slot, and
/// are removed again when that course leaves.
#[derive(Debug, Clone, Serialize)]
pub struct CourseRequirement {
    pub id: DbId,
    pub name: String,
    pub units: Option<RequirementUnits>,
    pub is_transfer_course: bool,
    pub is_placeholder: bool,
    /// Non-owning back-reference to the holding category.
    pub parent_category: DbId,
    /// Resolved at build time: an explicit set, or the parent category's
    /// set when none was given.
    pub unit_requirement_ids: Vec<DbId>,
    pub assigned_course: Option<DbId>,
}

// ---------------------------------------------------------------------------
// The arena
// ---------------------------------------------------------------------------

/// Arena-backed requirement tree shared by templates and degree checks.
#[derive(Debug, Clone, Default)]
pub struct RequirementTree {
    next_id: DbId,
    pub unit_requirements: BTreeMap<DbId, UnitRequirement>,
    pub categories: BTreeMap<DbId, Category>,
    pub course_requirements: BTreeMap<DbId, CourseRequirement>,
    pub root_category_ids: Vec<DbId>,
}

impl RequirementTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id in this tree's key space. Courses attached to
    /// a degree check draw from the same space.
    pub(crate) fn alloc_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    // -- lookups -------------------------------------------------------------

    pub fn unit_requirement(&self, id: DbId) -> Result<&UnitRequirement, CoreError> {
        self.unit_requirements.get(&id).ok_or(CoreError::NotFound {
            entity: "unit requirement",
            id,
        })
    }

    pub fn category(&self, id: DbId) -> Result<&Category, CoreError> {
        self.categories.get(&id).ok_or(CoreError::NotFound {
            entity: "category",
            id,
        })
    }

    pub fn course_requirement(&self, id: DbId) -> Result<&CourseRequirement, CoreError> {
        self.course_requirements
            .get(&id)
            .ok_or(CoreError::NotFound {
                entity: "course requirement",
                id,
            })
    }

    /// Effective display column for a category: its own when set, else the
    /// parent's, walking up at most one level (nesting depth is two).
    pub fn effective_column_position(&self, category_id: DbId) -> Result<Option<i32>, CoreError> {
        let category = self.category(category_id)?;
        if category.column_position.is_some() {
            return Ok(category.column_position);
        }
        match category.parent {
            Some(parent_id) => Ok(self.category(parent_id)?.column_position),
            None => Ok(None),
        }
    }

    // -- builders ------------------------------------------------------------

    pub fn add_unit_requirement(&mut self, name: &str, unit_count: f64) -> DbId {
        let id = self.alloc_id();
        self.unit_requirements.insert(
            id,
            UnitRequirement {
                id,
                name: name.to_string(),
                unit_count,
                units_completed: 0.0,
            },
        );
        id
    }

    pub fn add_category(
        &mut self,
        name: &str,
        description: Option<&str>,
        column_position: Option<i32>,
        unit_requirement_ids: Vec<DbId>,
    ) -> Result<DbId, CoreError> {
        self.check_unit_requirements(&unit_requirement_ids)?;
        let id = self.alloc_id();
        self.categories.insert(
            id,
            Category {
                id,
                kind: CategoryKind::Category,
                name: name.to_string(),
                description: description.map(str::to_string),
                column_position,
                parent: None,
                unit_requirement_ids,
                subcategory_ids: Vec::new(),
                course_requirement_ids: Vec::new(),
            },
        );
        self.root_category_ids.push(id);
        Ok(id)
    }

    pub fn add_subcategory(
        &mut self,
        parent_id: DbId,
        name: &str,
        description: Option<&str>,
        unit_requirement_ids: Vec<DbId>,
    ) -> Result<DbId, CoreError> {
        self.check_unit_requirements(&unit_requirement_ids)?;
        let parent = self.category(parent_id)?;
        if parent.kind == CategoryKind::Subcategory {
            return Err(CoreError::Validation(
                "A subcategory cannot hold another subcategory".to_string(),
            ));
        }
        let id = self.alloc_id();
        self.categories.insert(
            id,
            Category {
                id,
                kind: CategoryKind::Subcategory,
                name: name.to_string(),
                description: description.map(str::to_string),
                column_position: None,
                parent: Some(parent_id),
                unit_requirement_ids,
                subcategory_ids: Vec::new(),
                course_requirement_ids: Vec::new(),
            },
        );
        self.categories
            .get_mut(&parent_id)
            .expect("parent looked up above")
            .subcategory_ids
            .push(id);
        Ok(id)
    }

    /// Add a named course-requirement slot under a category.
    ///
    /// When `unit_requirement_ids` is `None` the slot inherits the holding
    /// category's set; `Some(vec![])` is an explicit "fulfills nothing".
    pub fn add_course_requirement(
        &mut self,
        category_id: DbId,
        name: &str,
        units: Option<RequirementUnits>,
        is_transfer_course: bool,
        unit_requirement_ids: Option<Vec<DbId>>,
    ) -> Result<DbId, CoreError> {
        if let Some(ids) = &unit_requirement_ids {
            self.check_unit_requirements(ids)?;
        }
        let category = self.category(category_id)?;
        let resolved =
            unit_requirement_ids.unwrap_or_else(|| category.unit_requirement_ids.clone());
        let id = self.alloc_id();
        self.course_requirements.insert(
            id,
            CourseRequirement {
                id,
                name: name.to_string(),
                units,
                is_transfer_course,
                is_placeholder: false,
                parent_category: category_id,
                unit_requirement_ids: resolved,
                assigned_course: None,
            },
        );
        self.categories
            .get_mut(&category_id)
            .expect("category looked up above")
            .course_requirement_ids
            .push(id);
        Ok(id)
    }

    fn check_unit_requirements(&self, ids: &[DbId]) -> Result<(), CoreError> {
        for &id in ids {
            self.unit_requirement(id)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Root container authored by an advisor, later cloned per student.
#[derive(Debug, Clone)]
pub struct RequirementTemplate {
    pub template_id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
    pub tree: RequirementTree,
}

impl RequirementTemplate {
    pub fn new(template_id: DbId, name: &str, now: Timestamp) -> Self {
        Self {
            template_id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
            tree: RequirementTree::new(),
        }
    }

    pub fn rename(&mut self, name: &str, now: Timestamp) {
        self.name = name.to_string();
        self.updated_at = now;
    }

    /// Templates are soft-deleted; existing degree checks keep working.
    pub fn soft_delete(&mut self, now: Timestamp) {
        self.deleted_at = Some(now);
        self.updated_at = now;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
