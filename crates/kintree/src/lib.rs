#![forbid(unsafe_code)]

//! Kintree public facade crate.
//!
//! Re-exports the common types from the internal crates and provides the
//! [`Engine`], which ties hierarchy building, layout, the scene, and
//! navigation together behind one surface.
//!
//! ```
//! use kintree::prelude::*;
//!
//! let records = vec![
//!     MemberRecord::new("A", "Alice", None, 1),
//!     MemberRecord::new("B", "Bob", Some("A"), 2),
//! ];
//! let mut engine = Engine::new(
//!     FamilyId::new("demo"),
//!     Size::new(1200.0, 600.0),
//!     SceneHandlers::noop(),
//! );
//! engine.render(records).unwrap();
//! assert_eq!(engine.scene().unwrap().nodes().len(), 2);
//! ```

use std::fmt;

pub mod engine;

// --- Core re-exports -------------------------------------------------------

pub use kintree_core::geometry::{Bounds, Point, Size};
pub use kintree_core::hierarchy::{FamilyTree, NodeIdx, StructuralError, build};
pub use kintree_core::member::{MemberId, MemberRecord};

// --- Layout re-exports -----------------------------------------------------

pub use kintree_layout::{
    EdgeCurve, LayoutConfig, NodeBox, Orientation, TreeLayout, layout, layout_with_config,
};

// --- Scene re-exports ------------------------------------------------------

pub use kintree_scene::{
    Avatar, ImageError, ImageHandle, MAX_ZOOM, MIN_ZOOM, Scene, SceneEdge, SceneHandlers,
    SceneNode, SceneOptions, TriggerKind, ViewAnimation, ViewTransform, Viewport,
};

// --- Navigation re-exports -------------------------------------------------

pub use kintree_nav::{
    Connectivity, FOCUS_DURATION, FOCUS_ZOOM, NavError, ViewCommand, cohort, connectivity,
    find_by_name, focus, lineage,
};

// --- Engine re-exports -----------------------------------------------------

pub use engine::{Engine, FamilyId, MemberChange, MemberStore, SearchHit, StoreError};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for kintree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The member records do not form a valid tree.
    Structural(StructuralError),
    /// A navigation query failed.
    Nav(NavError),
    /// The member store failed.
    Store(StoreError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural(err) => write!(f, "{err}"),
            Self::Nav(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Structural(err) => Some(err),
            Self::Nav(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StructuralError> for Error {
    fn from(err: StructuralError) -> Self {
        Self::Structural(err)
    }
}

impl From<NavError> for Error {
    fn from(err: NavError) -> Self {
        Self::Nav(err)
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Standard result type for kintree APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Engine, Error, FamilyId, MemberChange, MemberId, MemberRecord, MemberStore, Result, Scene,
        SceneHandlers, Size, StructuralError, TriggerKind, Viewport,
    };

    pub use crate::{core, layout, nav, scene};
}

pub use kintree_core as core;
pub use kintree_layout as layout;
pub use kintree_nav as nav;
pub use kintree_scene as scene;
