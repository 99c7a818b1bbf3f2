use std::iter::ExactSizeIterator;

use crate::TermId;

/// A read-only view of one equivalence class.
///
/// Borrowed from a [`CongruenceClosure`](crate::CongruenceClosure), so it
/// always reflects the current state.
#[non_exhaustive]
#[derive(Clone, Copy, Debug)]
pub struct EClass<'a> {
    /// The representative.
    pub id: TermId,
    pub(crate) nodes: &'a [TermId],
    pub(crate) shared: Option<TermId>,
}

impl<'a> EClass<'a> {
    /// Returns `true` if the class has no members, which never happens for
    /// a class obtained from the engine.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The number of members.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Iterates over the members, in the order they joined.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &'a TermId> {
        self.nodes.iter()
    }

    /// Returns `true` if `t` is a member.
    pub fn contains(&self, t: TermId) -> bool {
        self.nodes.contains(&t)
    }

    /// The shared term of this class, see
    /// [`mark_shared`](crate::CongruenceClosure::mark_shared).
    pub fn shared(&self) -> Option<TermId> {
        self.shared
    }
}
