use crate::{Lit, TermId};

/// Why an equality edge exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub enum Justification {
    /// The boolean search asserted this literal.
    Asserted(Lit),
    /// Both endpoints are applications with equal function and argument parts.
    Congruence,
}

/// The single outgoing equality edge of a node.
///
/// `old_rep` is the representative the edge's class had before the merge
/// that created the edge; it travels with the edge when edges are inverted.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Edge {
    pub to: TermId,
    pub old_rep: TermId,
    pub reason: Justification,
    pub time: u32,
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub rep: TermId,
    /// Set while this node is an absorbed former representative.
    pub merged_into: Option<TermId>,
    pub edge: Option<Edge>,
    /// Only meaningful at representatives and at absorbed former representatives,
    /// where it is the member list at the time of the merge.
    pub members: Vec<TermId>,
    pub shared: Option<TermId>,
}

/// Union-find with eagerly maintained representatives and exact undo.
///
/// Every node knows its representative directly, so [`find`](UnionFind::find)
/// is a single lookup. Merging relabels every member of the absorbed class,
/// which the callers keep cheap by always absorbing the smaller class.
/// Next to the representatives, the nodes of each class are connected by a
/// tree of equality edges that records why they are equal.
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    nodes: Vec<Node>,
}

impl UnionFind {
    pub fn make_set(&mut self) -> TermId {
        let id = TermId::from(self.nodes.len());
        self.nodes.push(Node {
            rep: id,
            merged_into: None,
            edge: None,
            members: vec![id],
            shared: None,
        });
        id
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn find(&self, id: TermId) -> TermId {
        self.nodes[usize::from(id)].rep
    }

    pub(crate) fn node(&self, id: TermId) -> &Node {
        &self.nodes[usize::from(id)]
    }

    pub(crate) fn node_mut(&mut self, id: TermId) -> &mut Node {
        &mut self.nodes[usize::from(id)]
    }

    pub fn members(&self, rep: TermId) -> &[TermId] {
        debug_assert_eq!(self.find(rep), rep);
        &self.node(rep).members
    }

    pub(crate) fn edge(&self, id: TermId) -> Option<&Edge> {
        self.node(id).edge.as_ref()
    }

    /// Reverses the edges on the path from `id` to the root of its edge tree,
    /// so that `id` becomes the root.
    pub fn invert_edges(&mut self, id: TermId) {
        let mut prev: Option<(TermId, Edge)> = None;
        let mut current = id;
        loop {
            let next = self.node_mut(current).edge.take();
            self.node_mut(current).edge = prev.map(|(from, edge)| Edge { to: from, ..edge });
            match next {
                Some(edge) => {
                    prev = Some((current, edge));
                    current = edge.to;
                }
                None => break,
            }
        }
    }

    /// Follows equality edges from `id` up to the root of its edge tree.
    pub fn path_to_root(&self, id: TermId) -> Vec<TermId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(edge) = self.edge(current) {
            current = edge.to;
            path.push(current);
        }
        path
    }

    /// Absorbs the class of `lhs` into the class of `rhs`, adding the edge
    /// `lhs -> rhs`. Returns `(src, dest)`, the absorbed and surviving
    /// representatives.
    pub(crate) fn link(
        &mut self,
        lhs: TermId,
        rhs: TermId,
        reason: Justification,
        time: u32,
    ) -> (TermId, TermId) {
        let src = self.find(lhs);
        let dest = self.find(rhs);
        assert_ne!(src, dest, "Linking {} and {} within one class", lhs, rhs);

        self.invert_edges(lhs);
        self.node_mut(lhs).edge = Some(Edge {
            to: rhs,
            old_rep: src,
            reason,
            time,
        });

        let moved = std::mem::take(&mut self.node_mut(src).members);
        for &m in &moved {
            self.node_mut(m).rep = dest;
        }
        self.node_mut(dest).members.extend_from_slice(&moved);
        let src_node = self.node_mut(src);
        src_node.members = moved;
        src_node.merged_into = Some(dest);
        (src, dest)
    }

    /// Removes the edge between `lhs` and `rhs`, which must be the most
    /// recent edge of their class, and splits the class back in two.
    /// Returns the removed edge and the surviving representative.
    pub(crate) fn unlink(&mut self, lhs: TermId, rhs: TermId) -> (Edge, TermId) {
        let holder = match (self.edge(lhs), self.edge(rhs)) {
            (Some(e), _) if e.to == rhs => lhs,
            (_, Some(e)) if e.to == lhs => rhs,
            _ => panic!("No equality edge between {} and {}", lhs, rhs),
        };
        let edge = self
            .node_mut(holder)
            .edge
            .take()
            .unwrap_or_else(|| panic!("Edge of {} vanished", holder));
        let src = edge.old_rep;
        let dest = self
            .node_mut(src)
            .merged_into
            .take()
            .unwrap_or_else(|| panic!("{} was not merged into another class", src));
        assert_eq!(self.find(holder), dest, "Undoing a merge out of order");

        let moved = std::mem::take(&mut self.node_mut(src).members);
        let dest_members = &mut self.node_mut(dest).members;
        let split = dest_members.len() - moved.len();
        debug_assert_eq!(&dest_members[split..], &moved[..]);
        dest_members.truncate(split);
        for &m in &moved {
            self.node_mut(m).rep = src;
        }
        self.node_mut(src).members = moved;
        (edge, dest)
    }
}
