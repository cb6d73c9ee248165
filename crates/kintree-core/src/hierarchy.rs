//! Flat records → rooted tree.
//!
//! [`build`] converts a flat set of parent-pointer records into a single
//! rooted [`FamilyTree`], rejecting structural violations instead of
//! guessing a recovery. The builder is pure: no side effects, no I/O, and
//! the same input always produces the same tree.
//!
//! Children keep record input order, which is the only sibling-order
//! information the data model carries.

use crate::member::{MemberId, MemberRecord};
use std::collections::HashMap;
use std::fmt;

/// Index of a node in a [`FamilyTree`] arena.
///
/// Node indices coincide with record input indices, so `NodeIdx(i)` wraps
/// `records[i]` for the record slice the tree was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIdx(pub usize);

/// Structural violation found while building a hierarchy.
///
/// Any of these is fatal to the render attempt that requested the build;
/// the caller must keep its previous scene rather than render a partial
/// tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// No record is marked as root (every record has a parent).
    NoRoot,
    /// More than one record is marked as root.
    MultipleRoots { ids: Vec<MemberId> },
    /// A record references a parent id that is not in the set.
    DanglingParent { child: MemberId, parent: MemberId },
    /// The parent relation contains a cycle; `ids` lists the members of
    /// the first cycle found, in walk order.
    CycleDetected { ids: Vec<MemberId> },
    /// Two records share the same id.
    DuplicateId { id: MemberId },
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRoot => write!(f, "no root member: every record has a parent"),
            Self::MultipleRoots { ids } => {
                write!(f, "multiple root members: ")?;
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{id}")?;
                }
                Ok(())
            }
            Self::DanglingParent { child, parent } => {
                write!(f, "member {child} references missing parent {parent}")
            }
            Self::CycleDetected { ids } => {
                write!(f, "parent cycle: ")?;
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        write!(f, " -> ")?;
                    }
                    write!(f, "{id}")?;
                }
                Ok(())
            }
            Self::DuplicateId { id } => write!(f, "duplicate member id {id}"),
        }
    }
}

impl std::error::Error for StructuralError {}

/// One node of a built hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TreeEntry {
    parent: Option<NodeIdx>,
    children: Vec<NodeIdx>,
}

/// A validated rooted tree over a record slice.
///
/// The tree stores indices only; callers pair it with the record slice it
/// was built from. It is rebuilt wholesale on every render cycle and never
/// mutated in place across renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyTree {
    entries: Vec<TreeEntry>,
    root: NodeIdx,
}

impl FamilyTree {
    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeIdx {
        self.root
    }

    /// Number of nodes. Always equals the record count of the input.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parent of a node; `None` for the root.
    #[must_use]
    pub fn parent(&self, node: NodeIdx) -> Option<NodeIdx> {
        self.entries[node.0].parent
    }

    /// Children of a node, in record input order.
    #[must_use]
    pub fn children(&self, node: NodeIdx) -> &[NodeIdx] {
        &self.entries[node.0].children
    }

    /// Depth of a node: root is 0.
    #[must_use]
    pub fn depth(&self, node: NodeIdx) -> usize {
        let mut depth = 0;
        let mut cur = node;
        while let Some(parent) = self.entries[cur.0].parent {
            depth += 1;
            cur = parent;
        }
        depth
    }

    /// All node indices in pre-order (parent before children).
    #[must_use]
    pub fn preorder(&self) -> Vec<NodeIdx> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            out.push(node);
            // Push children reversed so they pop in input order.
            for &child in self.children(node).iter().rev() {
                stack.push(child);
            }
        }
        out
    }
}

/// Build a rooted tree from a flat record set.
///
/// Violations are detected in a fixed order: duplicate ids, dangling
/// parent references, parent cycles, then root count. The first violation
/// found wins and no tree is produced.
pub fn build(records: &[MemberRecord]) -> Result<FamilyTree, StructuralError> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        if index.insert(rec.id.as_str(), i).is_some() {
            return Err(StructuralError::DuplicateId {
                id: rec.id.clone(),
            });
        }
    }

    // Resolve parent references up front so the remaining passes work on
    // indices only.
    let mut parents: Vec<Option<usize>> = Vec::with_capacity(records.len());
    for rec in records {
        match &rec.parent_id {
            None => parents.push(None),
            Some(pid) => match index.get(pid.as_str()) {
                Some(&p) => parents.push(Some(p)),
                None => {
                    return Err(StructuralError::DanglingParent {
                        child: rec.id.clone(),
                        parent: pid.clone(),
                    });
                }
            },
        }
    }

    detect_cycles(records, &parents)?;

    let mut root: Option<usize> = None;
    let mut extra_roots: Vec<usize> = Vec::new();
    for (i, parent) in parents.iter().enumerate() {
        if parent.is_none() {
            match root {
                None => root = Some(i),
                Some(_) => extra_roots.push(i),
            }
        }
    }
    let root = match root {
        None => return Err(StructuralError::NoRoot),
        Some(r) if !extra_roots.is_empty() => {
            let mut ids = vec![records[r].id.clone()];
            ids.extend(extra_roots.iter().map(|&i| records[i].id.clone()));
            return Err(StructuralError::MultipleRoots { ids });
        }
        Some(r) => r,
    };

    let mut entries: Vec<TreeEntry> = parents
        .iter()
        .map(|p| TreeEntry {
            parent: p.map(NodeIdx),
            children: Vec::new(),
        })
        .collect();
    // Input-order iteration keeps sibling order deterministic.
    for (i, parent) in parents.iter().enumerate() {
        if let Some(p) = parent {
            entries[*p].children.push(NodeIdx(i));
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(nodes = records.len(), root = %records[root].id, "hierarchy built");

    Ok(FamilyTree {
        entries,
        root: NodeIdx(root),
    })
}

/// Walk every parent chain with three-state marking; a chain that reaches
/// a node already on the current path is a cycle.
fn detect_cycles(
    records: &[MemberRecord],
    parents: &[Option<usize>],
) -> Result<(), StructuralError> {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![UNSEEN; records.len()];
    let mut path: Vec<usize> = Vec::new();

    for start in 0..records.len() {
        if state[start] != UNSEEN {
            continue;
        }
        path.clear();
        let mut cur = start;
        loop {
            match state[cur] {
                DONE => break,
                ON_PATH => {
                    // Keep only the cyclic suffix of the walked path.
                    let entry = path.iter().position(|&n| n == cur).unwrap_or(0);
                    let ids = path[entry..]
                        .iter()
                        .map(|&n| records[n].id.clone())
                        .collect();
                    return Err(StructuralError::CycleDetected { ids });
                }
                _ => {
                    state[cur] = ON_PATH;
                    path.push(cur);
                    match parents[cur] {
                        Some(next) => cur = next,
                        None => break,
                    }
                }
            }
        }
        for &n in &path {
            state[n] = DONE;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, parent: Option<&str>, generation: i32) -> MemberRecord {
        MemberRecord::new(id, format!("name-{id}"), parent, generation)
    }

    #[test]
    fn build_single_root() {
        let records = vec![rec("A", None, 1)];
        let tree = build(&records).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root(), NodeIdx(0));
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn build_preserves_child_order() {
        let records = vec![
            rec("A", None, 1),
            rec("B", Some("A"), 2),
            rec("C", Some("A"), 2),
        ];
        let tree = build(&records).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.children(tree.root()), &[NodeIdx(1), NodeIdx(2)]);
    }

    #[test]
    fn build_order_independent_of_record_position() {
        // Root listed last; children still ordered by input position.
        let records = vec![
            rec("B", Some("A"), 2),
            rec("C", Some("A"), 2),
            rec("A", None, 1),
        ];
        let tree = build(&records).unwrap();
        assert_eq!(tree.root(), NodeIdx(2));
        assert_eq!(tree.children(tree.root()), &[NodeIdx(0), NodeIdx(1)]);
    }

    #[test]
    fn build_no_root() {
        let records = vec![rec("A", Some("B"), 1), rec("B", Some("A"), 1)];
        // Both records have parents AND form a cycle; the cycle wins.
        assert!(matches!(
            build(&records),
            Err(StructuralError::CycleDetected { .. })
        ));
    }

    #[test]
    fn build_empty_set_has_no_root() {
        let records: Vec<MemberRecord> = Vec::new();
        assert_eq!(build(&records), Err(StructuralError::NoRoot));
    }

    #[test]
    fn build_multiple_roots() {
        let records = vec![rec("A", None, 1), rec("B", None, 1), rec("C", Some("A"), 2)];
        match build(&records) {
            Err(StructuralError::MultipleRoots { ids }) => {
                assert_eq!(ids, vec![MemberId::new("A"), MemberId::new("B")]);
            }
            other => panic!("expected MultipleRoots, got {other:?}"),
        }
    }

    #[test]
    fn build_dangling_parent() {
        let records = vec![rec("A", None, 1), rec("B", Some("X"), 2)];
        assert_eq!(
            build(&records),
            Err(StructuralError::DanglingParent {
                child: MemberId::new("B"),
                parent: MemberId::new("X"),
            })
        );
    }

    #[test]
    fn build_two_cycle() {
        let records = vec![rec("A", Some("B"), 1), rec("B", Some("A"), 1)];
        match build(&records) {
            Err(StructuralError::CycleDetected { ids }) => {
                assert_eq!(ids.len(), 2);
                assert!(ids.contains(&MemberId::new("A")));
                assert!(ids.contains(&MemberId::new("B")));
            }
            other => panic!("expected CycleDetected, got {other:?}"),
        }
    }

    #[test]
    fn build_cycle_below_valid_root() {
        // Root exists, but C/D/E form a cycle off to the side.
        let records = vec![
            rec("A", None, 1),
            rec("B", Some("A"), 2),
            rec("C", Some("E"), 3),
            rec("D", Some("C"), 3),
            rec("E", Some("D"), 3),
        ];
        match build(&records) {
            Err(StructuralError::CycleDetected { ids }) => {
                assert_eq!(ids.len(), 3);
            }
            other => panic!("expected CycleDetected, got {other:?}"),
        }
    }

    #[test]
    fn build_self_parent_is_cycle() {
        let records = vec![rec("A", None, 1), rec("B", Some("B"), 2)];
        assert_eq!(
            build(&records),
            Err(StructuralError::CycleDetected {
                ids: vec![MemberId::new("B")],
            })
        );
    }

    #[test]
    fn build_duplicate_id() {
        let records = vec![rec("A", None, 1), rec("A", Some("A"), 2)];
        assert_eq!(
            build(&records),
            Err(StructuralError::DuplicateId {
                id: MemberId::new("A"),
            })
        );
    }

    #[test]
    fn node_count_matches_records() {
        let records = vec![
            rec("A", None, 1),
            rec("B", Some("A"), 2),
            rec("C", Some("A"), 2),
            rec("D", Some("B"), 3),
            rec("E", Some("B"), 3),
            rec("F", Some("C"), 3),
        ];
        let tree = build(&records).unwrap();
        assert_eq!(tree.len(), records.len());
        assert_eq!(tree.preorder().len(), records.len());
    }

    #[test]
    fn depth_counts_edges_to_root() {
        let records = vec![
            rec("A", None, 1),
            rec("B", Some("A"), 2),
            rec("C", Some("B"), 3),
        ];
        let tree = build(&records).unwrap();
        assert_eq!(tree.depth(NodeIdx(0)), 0);
        assert_eq!(tree.depth(NodeIdx(1)), 1);
        assert_eq!(tree.depth(NodeIdx(2)), 2);
    }

    #[test]
    fn preorder_visits_parent_first() {
        let records = vec![
            rec("A", None, 1),
            rec("B", Some("A"), 2),
            rec("D", Some("B"), 3),
            rec("C", Some("A"), 2),
        ];
        let tree = build(&records).unwrap();
        let order = tree.preorder();
        assert_eq!(order, vec![NodeIdx(0), NodeIdx(1), NodeIdx(2), NodeIdx(3)]);
    }

    #[test]
    fn error_display_is_descriptive() {
        let err = StructuralError::DanglingParent {
            child: MemberId::new("B"),
            parent: MemberId::new("X"),
        };
        assert_eq!(err.to_string(), "member B references missing parent X");
        let err = StructuralError::CycleDetected {
            ids: vec![MemberId::new("A"), MemberId::new("B")],
        };
        assert_eq!(err.to_string(), "parent cycle: A -> B");
    }

    #[test]
    fn deterministic_rebuild() {
        let records = vec![
            rec("A", None, 1),
            rec("B", Some("A"), 2),
            rec("C", Some("A"), 2),
            rec("D", Some("C"), 3),
        ];
        let t1 = build(&records).unwrap();
        let t2 = build(&records).unwrap();
        assert_eq!(t1.root(), t2.root());
        for i in 0..t1.len() {
            assert_eq!(t1.children(NodeIdx(i)), t2.children(NodeIdx(i)));
            assert_eq!(t1.parent(NodeIdx(i)), t2.parent(NodeIdx(i)));
        }
    }
}
