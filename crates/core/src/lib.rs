//! Degree-progress domain engine.
//!
//! This crate is the in-memory core behind advisor-facing degree checks:
//!
//! - [`template`] — requirement templates: unit requirements and the
//!   arena-backed category / course-requirement tree.
//! - [`degree_check`] — per-student clones of a template, including
//!   auto-generated transfer-course placeholders.
//! - [`course`] — completed, in-progress, manual, and transfer course
//!   instances, with copy semantics.
//! - [`engine`] — assign / reassign / unassign / junk / copy / edit
//!   operations with synchronous unit rollup.
//! - [`fulfillment`] — effective unit-requirement resolution and the
//!   rollup arithmetic.
//! - [`snapshot`] — read-only serialization for rendering and export.
//!
//! The crate has zero internal dependencies so it can be reused by an
//! API/repository layer, batch tooling, or tests without pulling in any
//! I/O stack. Persistence, enrollment feeds, and authorization are
//! external collaborators.

pub mod course;
pub mod degree_check;
pub mod engine;
pub mod error;
pub mod fulfillment;
pub mod snapshot;
pub mod template;
pub mod types;
pub mod units;

pub use course::CourseInstance;
pub use degree_check::DegreeCheck;
pub use engine::{AssignTarget, CourseEdit, Outcome};
pub use error::CoreError;
pub use snapshot::DegreeCheckSnapshot;
pub use template::{RequirementTemplate, RequirementTree, UnitRequirement};
pub use units::{RequirementUnits, UnitFormat};
