#![forbid(unsafe_code)]

//! Scene graph and view state for kintree.
//!
//! The scene is a pure data structure materialized from a [`TreeLayout`]
//! plus the member records: avatars, labels, connector curves, and the
//! edit/delete triggers. It is rebuilt wholesale on every render; the
//! pieces of state that must outlive a render (controls visibility, the
//! pan/zoom transform) live outside it.
//!
//! No I/O happens here. Avatar images are loaded by the embedder, which
//! feeds results back through [`Scene::resolve_avatar`]; a failed or stale
//! load degrades to an initials disc and is never surfaced as an error.
//!
//! [`TreeLayout`]: kintree_layout::TreeLayout

pub mod avatar;
pub mod scene;
pub mod viewport;

pub use avatar::{Avatar, ImageError, ImageHandle};
pub use scene::{Scene, SceneEdge, SceneHandlers, SceneNode, SceneOptions, TriggerKind};
pub use viewport::{ViewAnimation, ViewTransform, Viewport, MAX_ZOOM, MIN_ZOOM};
