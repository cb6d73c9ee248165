//! The engine: explicit owner of the member set, view state, and scene.
//!
//! All state the original kept in ambient globals lives here: the current
//! records, the controls flag, the viewport, and the materialized scene.
//! Transport is behind [`MemberStore`]; the engine forwards changes and
//! refetches, it never encodes or sends anything itself.

use kintree_core::geometry::Size;
use kintree_core::hierarchy;
use kintree_core::member::{MemberId, MemberRecord};
use kintree_layout::{LayoutConfig, layout_with_config};
use kintree_nav as nav;
use kintree_nav::{Connectivity, NavError};
use kintree_scene::{Scene, SceneHandlers, SceneOptions, Viewport};
use std::fmt;
use std::time::Duration;

use crate::Error;

/// Identifier of one family's record set in a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FamilyId(String);

impl FamilyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors from a member store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    Transport(String),
    /// The store refused the request.
    Rejected(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "store unreachable: {msg}"),
            Self::Rejected(msg) => write!(f, "store rejected change: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// One mutation of the member set. The photo payload is carried opaquely;
/// encoding is the store's concern.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberChange {
    Add {
        record: MemberRecord,
        photo: Option<Vec<u8>>,
    },
    Edit {
        record: MemberRecord,
        photo: Option<Vec<u8>>,
    },
    Delete {
        id: MemberId,
    },
}

/// A successful name search: the focused member plus its connectivity
/// report (the parent's name, or `None` for the root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: MemberId,
    pub name: String,
    pub parent_name: Option<String>,
}

/// Backing storage for member records. Implementations own the transport;
/// tests use an in-memory store.
pub trait MemberStore {
    fn fetch_members(&self, family: &FamilyId) -> Result<Vec<MemberRecord>, StoreError>;

    fn submit_change(&mut self, change: MemberChange) -> Result<(), StoreError>;
}

/// Owns everything a running tree view needs: member records, the layout
/// configuration, the pan/zoom viewport, the controls flag, and the
/// current scene.
#[derive(Debug)]
pub struct Engine {
    family: FamilyId,
    members: Vec<MemberRecord>,
    controls_visible: bool,
    canvas: Size,
    layout_config: LayoutConfig,
    viewport: Viewport,
    handlers: SceneHandlers,
    scene: Option<Scene>,
}

impl Engine {
    #[must_use]
    pub fn new(family: FamilyId, canvas: Size, handlers: SceneHandlers) -> Self {
        Self {
            family,
            members: Vec::new(),
            controls_visible: true,
            canvas,
            layout_config: LayoutConfig::default(),
            viewport: Viewport::new(canvas),
            handlers,
            scene: None,
        }
    }

    #[must_use]
    pub fn with_layout_config(mut self, config: LayoutConfig) -> Self {
        self.layout_config = config;
        self
    }

    #[must_use]
    pub fn family(&self) -> &FamilyId {
        &self.family
    }

    #[must_use]
    pub fn members(&self) -> &[MemberRecord] {
        &self.members
    }

    #[must_use]
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    #[must_use]
    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    /// Show or hide node controls. Applied to the live scene immediately
    /// and to every scene built afterwards.
    pub fn set_controls_visible(&mut self, visible: bool) {
        self.controls_visible = visible;
        if let Some(scene) = &mut self.scene {
            scene.set_controls_visible(visible);
        }
    }

    /// Replace the member set and rebuild the scene from scratch.
    ///
    /// On a structural error the previous members and scene are left
    /// exactly as they were; a partial scene is never produced. An empty
    /// member set is a no-op, matching a fetch that returned nothing.
    pub fn render(&mut self, members: Vec<MemberRecord>) -> Result<(), Error> {
        if members.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::debug!("render skipped: empty member set");
            return Ok(());
        }

        let tree = hierarchy::build(&members)?;
        let l = layout_with_config(&tree, self.canvas, &self.layout_config);
        let scene = Scene::build(
            &l,
            &members,
            SceneOptions {
                controls_visible: self.controls_visible,
            },
            self.handlers.clone(),
        );

        #[cfg(feature = "tracing")]
        tracing::info!(members = members.len(), "scene rendered");

        self.members = members;
        self.scene = Some(scene);
        Ok(())
    }

    /// Fetch the family's records from the store and render them. A fetch
    /// failure leaves the current members and scene intact.
    pub fn reload(&mut self, store: &dyn MemberStore) -> Result<(), Error> {
        let members = store.fetch_members(&self.family)?;
        self.render(members)
    }

    /// Forward a change to the store, then refetch and re-render.
    pub fn submit_change(
        &mut self,
        store: &mut dyn MemberStore,
        change: MemberChange,
    ) -> Result<(), Error> {
        store.submit_change(change)?;
        self.reload(store)
    }

    /// Search by name and focus the first match. No match is a no-op; an
    /// empty query clears the highlight. A hit carries the focused
    /// member's id plus its connectivity report.
    pub fn search(&mut self, query: &str) -> Option<SearchHit> {
        if query.is_empty() {
            if let Some(scene) = &mut self.scene {
                scene.set_highlight(None);
            }
            return None;
        }
        let found = nav::find_by_name(&self.members, query)?;
        let id = found.id.clone();
        let name = found.name.clone();
        self.focus(&id).ok()?;
        let parent_name = match nav::connectivity(&self.members, &id) {
            Ok(Connectivity::ChildOf(parent)) => Some(parent.name.clone()),
            _ => None,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            id = %id,
            parent = parent_name.as_deref().unwrap_or("none (root)"),
            "search hit"
        );

        Some(SearchHit {
            id,
            name,
            parent_name,
        })
    }

    /// Center the view on a member with the standard focus zoom and
    /// highlight it exclusively.
    pub fn focus(&mut self, id: &MemberId) -> Result<(), Error> {
        let cmd = nav::focus(&self.members, id)?;
        let Some(scene) = &mut self.scene else {
            return Ok(());
        };
        if let Some(node) = scene.node(&cmd.target) {
            self.viewport.center_on(node.center, cmd.zoom, cmd.duration);
        }
        if cmd.highlight {
            scene.set_highlight(Some(&cmd.target));
        }
        Ok(())
    }

    /// Members of one generation, in record order.
    #[must_use]
    pub fn show_cohort(&self, generation: i32) -> Vec<&MemberRecord> {
        nav::cohort(&self.members, generation)
    }

    /// Names from a member up to the root.
    pub fn show_lineage(&self, id: &MemberId) -> Result<Vec<String>, NavError> {
        nav::lineage(&self.members, id)
    }

    /// Advance the focus animation.
    pub fn tick(&mut self, dt: Duration) {
        self.viewport.tick(dt);
    }

    /// Feed back an avatar load result into the current scene.
    pub fn resolve_avatar(
        &mut self,
        id: &MemberId,
        result: Result<kintree_scene::ImageHandle, kintree_scene::ImageError>,
    ) {
        if let Some(scene) = &mut self.scene {
            scene.resolve_avatar(id, result);
        }
    }
}
