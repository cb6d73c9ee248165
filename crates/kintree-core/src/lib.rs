#![forbid(unsafe_code)]

//! Core data model for kintree: flat member records, the hierarchy builder
//! that turns them into a rooted tree, and world-space geometry primitives.
//!
//! Everything here is pure and synchronous. Transport, image loading, and
//! presentation belong to external collaborators; this crate never performs
//! I/O.

pub mod geometry;
pub mod hierarchy;
pub mod logging;
pub mod member;

pub use geometry::{Bounds, Point, Size};
pub use hierarchy::{FamilyTree, NodeIdx, StructuralError, build};
pub use member::{MemberId, MemberRecord};
