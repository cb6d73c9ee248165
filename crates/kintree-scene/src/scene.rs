//! Scene graph materialization and trigger dispatch.
//!
//! [`Scene::build`] tears down nothing; it produces a fresh scene and the
//! previous one is dropped by whoever owned it. Controls visibility is
//! passed in per build so a process-wide toggle is re-applied identically
//! after every rebuild.

use crate::avatar::{Avatar, ImageError, ImageHandle};
use kintree_core::geometry::Point;
use kintree_core::member::{MemberId, MemberRecord};
use kintree_layout::TreeLayout;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Which of a node's controls was activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Edit,
    Delete,
}

/// Externally-owned callbacks invoked when a node control fires.
///
/// The scene only dispatches the intent plus the target id; the edit and
/// delete flows themselves (dialogs, transport) belong to the embedder.
/// Handlers are registered at construction; there is no global-name dispatch.
#[derive(Clone)]
pub struct SceneHandlers {
    on_edit: Rc<dyn Fn(&MemberId)>,
    on_delete: Rc<dyn Fn(&MemberId)>,
}

impl SceneHandlers {
    pub fn new(
        on_edit: impl Fn(&MemberId) + 'static,
        on_delete: impl Fn(&MemberId) + 'static,
    ) -> Self {
        Self {
            on_edit: Rc::new(on_edit),
            on_delete: Rc::new(on_delete),
        }
    }

    /// Handlers that ignore every trigger.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|_| {}, |_| {})
    }
}

impl fmt::Debug for SceneHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SceneHandlers { .. }")
    }
}

/// Options applied at scene construction.
#[derive(Debug, Clone, Copy)]
pub struct SceneOptions {
    /// Whether edit/delete triggers are shown. Re-applied on every build.
    pub controls_visible: bool,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            controls_visible: true,
        }
    }
}

/// One drawn node: avatar disc, label, and its two control triggers.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: MemberId,
    /// Stable addressing id, sanitized for schemes that reject arbitrary
    /// characters. Unique within the scene.
    pub anchor: String,
    pub label: String,
    pub center: Point,
    pub radius: f64,
    pub avatar: Avatar,
    pub highlighted: bool,
}

/// One parent→child connector curve.
#[derive(Debug, Clone)]
pub struct SceneEdge {
    pub parent: MemberId,
    pub child: MemberId,
    pub from: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub to: Point,
}

/// A fully materialized scene: the render surface's output for one frame
/// of the diagram, plus the trigger dispatch table.
pub struct Scene {
    nodes: Vec<SceneNode>,
    edges: Vec<SceneEdge>,
    controls_visible: bool,
    handlers: SceneHandlers,
    by_id: HashMap<MemberId, usize>,
    by_anchor: HashMap<String, usize>,
    highlight: Option<usize>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("controls_visible", &self.controls_visible)
            .field("highlight", &self.highlight)
            .finish()
    }
}

impl Scene {
    /// Materialize a scene from a layout and the records it was laid out
    /// from. `layout.nodes[i]` must correspond to `records[i]` (which is
    /// what the hierarchy builder guarantees).
    #[must_use]
    pub fn build(
        layout: &TreeLayout,
        records: &[MemberRecord],
        options: SceneOptions,
        handlers: SceneHandlers,
    ) -> Self {
        debug_assert_eq!(layout.nodes.len(), records.len());

        let mut by_id = HashMap::with_capacity(records.len());
        let mut by_anchor = HashMap::with_capacity(records.len());
        let mut nodes = Vec::with_capacity(records.len());

        for (i, nb) in layout.nodes.iter().enumerate() {
            let rec = &records[i];
            let mut anchor = sanitize_anchor(rec.id.as_str());
            if by_anchor.contains_key(&anchor) {
                // Distinct ids can sanitize to the same anchor; suffix
                // with the node index, then keep growing until free (the
                // suffixed form itself can collide with a raw id).
                anchor.push('_');
                anchor.push_str(&i.to_string());
                while by_anchor.contains_key(&anchor) {
                    anchor.push('_');
                }
            }
            by_id.insert(rec.id.clone(), i);
            by_anchor.insert(anchor.clone(), i);
            nodes.push(SceneNode {
                id: rec.id.clone(),
                anchor,
                label: rec.name.clone(),
                center: nb.center,
                radius: nb.radius,
                avatar: Avatar::for_member(&rec.name, rec.photo_url.as_deref()),
                highlighted: false,
            });
        }

        let edges = layout
            .edges
            .iter()
            .map(|e| SceneEdge {
                parent: records[e.parent.0].id.clone(),
                child: records[e.child.0].id.clone(),
                from: e.from,
                ctrl1: e.ctrl1,
                ctrl2: e.ctrl2,
                to: e.to,
            })
            .collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            nodes = nodes.len(),
            controls_visible = options.controls_visible,
            "scene rebuilt"
        );

        Self {
            nodes,
            edges,
            controls_visible: options.controls_visible,
            handlers,
            by_id,
            by_anchor,
            highlight: None,
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[SceneEdge] {
        &self.edges
    }

    /// Whether the edit/delete triggers are currently shown.
    #[must_use]
    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    /// Show or hide the edit/delete triggers without rebuilding.
    pub fn set_controls_visible(&mut self, visible: bool) {
        self.controls_visible = visible;
    }

    /// Node lookup by member id.
    #[must_use]
    pub fn node(&self, id: &MemberId) -> Option<&SceneNode> {
        self.by_id.get(id).map(|&i| &self.nodes[i])
    }

    /// Node lookup by sanitized anchor.
    #[must_use]
    pub fn node_by_anchor(&self, anchor: &str) -> Option<&SceneNode> {
        self.by_anchor.get(anchor).map(|&i| &self.nodes[i])
    }

    /// The highlighted node, if any.
    #[must_use]
    pub fn highlighted(&self) -> Option<&SceneNode> {
        self.highlight.map(|i| &self.nodes[i])
    }

    /// Set or clear the exclusive highlight. Returns false when the id is
    /// not in the scene (the previous highlight is still cleared).
    pub fn set_highlight(&mut self, id: Option<&MemberId>) -> bool {
        if let Some(prev) = self.highlight.take() {
            self.nodes[prev].highlighted = false;
        }
        let Some(id) = id else {
            return true;
        };
        match self.by_id.get(id) {
            Some(&i) => {
                self.nodes[i].highlighted = true;
                self.highlight = Some(i);
                true
            }
            None => false,
        }
    }

    /// Feed back the result of an asynchronous avatar load.
    ///
    /// A failed load falls back to initials; a resolve for a node that is
    /// not (or no longer) in the scene, or whose avatar is not pending,
    /// is silently ignored; that is how stale in-flight loads from a
    /// previous scene die.
    pub fn resolve_avatar(&mut self, id: &MemberId, result: Result<ImageHandle, ImageError>) {
        let Some(&i) = self.by_id.get(id) else {
            return;
        };
        let node = &mut self.nodes[i];
        if !node.avatar.is_pending() {
            return;
        }
        node.avatar = match result {
            Ok(handle) => Avatar::Loaded { handle },
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(id = %id, error = ?_err, "avatar load failed, using initials");
                Avatar::initials_for(&node.label)
            }
        };
    }

    /// Fire a node control. Returns true when a handler ran; hidden
    /// controls and unknown ids dispatch nothing.
    pub fn dispatch(&self, id: &MemberId, kind: TriggerKind) -> bool {
        if !self.controls_visible || !self.by_id.contains_key(id) {
            return false;
        }
        match kind {
            TriggerKind::Edit => (self.handlers.on_edit)(id),
            TriggerKind::Delete => (self.handlers.on_delete)(id),
        }
        true
    }
}

/// Replace every character outside `[A-Za-z0-9]` with `_`, the original
/// addressing scheme for node identifiers.
fn sanitize_anchor(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
