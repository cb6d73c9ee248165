#![forbid(unsafe_code)]

//! Navigation over the flat member set: name search, lineage and cohort
//! reports, and focus commands for the view.
//!
//! Everything here operates on `&[MemberRecord]` directly rather than on a
//! built hierarchy, so these queries keep working even while the record set
//! is mid-edit. The lineage walk therefore carries its own cycle guard
//! instead of relying on a prior structural validation pass.

use kintree_core::member::{MemberId, MemberRecord};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

/// Zoom factor applied when focusing a member.
pub const FOCUS_ZOOM: f64 = 1.5;
/// Duration of the focus transition.
pub const FOCUS_DURATION: Duration = Duration::from_millis(750);

/// Errors from navigation queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    /// The requested member id is not in the record set.
    MemberNotFound { id: MemberId },
    /// The parent chain revisited a member during a lineage walk.
    CycleDetected { id: MemberId },
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MemberNotFound { id } => write!(f, "member {id} not found"),
            Self::CycleDetected { id } => {
                write!(f, "parent chain cycles back through member {id}")
            }
        }
    }
}

impl std::error::Error for NavError {}

/// A member's position relative to its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connectivity<'a> {
    /// The member has no parent.
    Root,
    /// The member is a child of the named parent record.
    ChildOf(&'a MemberRecord),
}

/// An instruction for the view layer: center the target member, zoom in,
/// and highlight it.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewCommand {
    pub target: MemberId,
    pub zoom: f64,
    pub duration: Duration,
    pub highlight: bool,
}

/// Case-insensitive substring search over member names. Returns the first
/// match in input order; an empty query matches nothing.
#[must_use]
pub fn find_by_name<'a>(records: &'a [MemberRecord], query: &str) -> Option<&'a MemberRecord> {
    if query.is_empty() {
        return None;
    }
    let needle = query.to_lowercase();
    records.iter().find(|r| r.name.to_lowercase().contains(&needle))
}

/// Names from the given member up through its ancestors, root last.
///
/// A parent reference that resolves to no record ends the walk at the last
/// resolvable member rather than failing. A parent chain that revisits a
/// member fails with [`NavError::CycleDetected`].
pub fn lineage(records: &[MemberRecord], id: &MemberId) -> Result<Vec<String>, NavError> {
    let by_id: HashMap<&str, &MemberRecord> =
        records.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut current = by_id
        .get(id.as_str())
        .copied()
        .ok_or_else(|| NavError::MemberNotFound { id: id.clone() })?;

    let mut path = Vec::new();
    let mut visited = HashSet::new();
    loop {
        if !visited.insert(current.id.as_str()) {
            return Err(NavError::CycleDetected {
                id: current.id.clone(),
            });
        }
        path.push(current.name.clone());
        match current.parent_id.as_ref().and_then(|p| by_id.get(p.as_str())) {
            Some(parent) => current = parent,
            None => break,
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(id = %id, depth = path.len(), "lineage walk complete");

    Ok(path)
}

/// All members of the given generation, preserving input order.
#[must_use]
pub fn cohort(records: &[MemberRecord], generation: i32) -> Vec<&MemberRecord> {
    records.iter().filter(|r| r.generation == generation).collect()
}

/// The member's parent record, or [`Connectivity::Root`] when it has no
/// parent or the parent reference does not resolve.
pub fn connectivity<'a>(
    records: &'a [MemberRecord],
    id: &MemberId,
) -> Result<Connectivity<'a>, NavError> {
    let member = records
        .iter()
        .find(|r| &r.id == id)
        .ok_or_else(|| NavError::MemberNotFound { id: id.clone() })?;
    let parent = member
        .parent_id
        .as_ref()
        .and_then(|p| records.iter().find(|r| &r.id == p));
    Ok(match parent {
        Some(p) => Connectivity::ChildOf(p),
        None => Connectivity::Root,
    })
}

/// Build the focus command for a member: 1.5x zoom over 750 ms with an
/// exclusive highlight.
pub fn focus(records: &[MemberRecord], id: &MemberId) -> Result<ViewCommand, NavError> {
    if !records.iter().any(|r| &r.id == id) {
        return Err(NavError::MemberNotFound { id: id.clone() });
    }
    Ok(ViewCommand {
        target: id.clone(),
        zoom: FOCUS_ZOOM,
        duration: FOCUS_DURATION,
        highlight: true,
    })
}
