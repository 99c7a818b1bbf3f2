use log::*;

use crate::*;

/// The view of the theories that share terms with the congruence closure.
///
/// Every class carries at most one shared term. When two classes with
/// different shared terms are about to merge, the bridge is asked whether
/// its theory already proves them distinct; if it does, the merge fails
/// with [`ConflictKind::Shared`]. Otherwise the merge goes ahead and the
/// equality between the two shared terms is handed to the boolean search
/// as a propagated atom, so the owning theory learns about it through the
/// usual assignment path.
pub trait Bridge {
    /// Returns `true` if the owning theory proves `a != b`.
    fn are_distinct(&self, terms: &TermBank, a: TermId, b: TermId) -> bool;
}

impl Bridge for () {
    fn are_distinct(&self, _terms: &TermBank, _a: TermId, _b: TermId) -> bool {
        false
    }
}

impl<B: Bridge> CongruenceClosure<B> {
    /// Makes `t` the shared term of its class.
    ///
    /// The marker is written on every former representative between `t`
    /// and the current representative that carried the same marker as
    /// `t`, so it stays on the side of `t` when merges are undone. Marking
    /// itself is never undone. If the class already had another shared
    /// term, their equality is propagated.
    pub fn mark_shared(&mut self, t: TermId) -> Result<(), TermError> {
        if self.terms.get(t)?.is_function() {
            return Err(TermError::PartialArgument(t));
        }
        let old = self.uf.node(t).shared;
        if old == Some(t) {
            return Ok(());
        }
        debug!("Share {}", t);
        let mut current = t;
        let stop = loop {
            let node = self.uf.node_mut(current);
            if node.shared != old {
                break node.shared;
            }
            node.shared = Some(t);
            match node.merged_into {
                Some(next) => current = next,
                None => break None,
            }
        };
        for other in old.into_iter().chain(stop) {
            self.share_equality(t, other);
        }
        Ok(())
    }

    /// The shared term of the class of `t`, if any.
    pub fn get_shared(&self, t: TermId) -> Option<TermId> {
        self.uf.node(self.uf.find(t)).shared
    }

    /// Clears the shared term of the class of `t` if it is `t`.
    pub fn unmark_shared(&mut self, t: TermId) {
        let rep = self.uf.find(t);
        let node = self.uf.node_mut(rep);
        if node.shared == Some(t) {
            debug!("Unshare {}", t);
            node.shared = None;
        }
    }

    /// The shared terms of two classes about to merge, if the bridge
    /// proves them distinct.
    pub(crate) fn distinct_shared(&self, src: TermId, dest: TermId) -> Option<(TermId, TermId)> {
        let s1 = self.uf.node(src).shared?;
        let s2 = self.uf.node(dest).shared?;
        if s1 != s2 && self.bridge.are_distinct(&self.terms, s1, s2) {
            Some((s1, s2))
        } else {
            None
        }
    }

    /// Moves the shared marker of `src` onto `dest` if `dest` has none.
    /// Returns both markers if they differ.
    pub(crate) fn merge_shared(&mut self, src: TermId, dest: TermId) -> Option<(TermId, TermId)> {
        let s1 = self.uf.node(src).shared?;
        let dest_node = self.uf.node_mut(dest);
        match dest_node.shared {
            None => {
                dest_node.shared = Some(s1);
                None
            }
            Some(s2) if s2 != s1 => Some((s1, s2)),
            Some(_) => None,
        }
    }

    pub(crate) fn unmerge_shared(&mut self, src: TermId, dest: TermId) {
        let marker = self.uf.node(src).shared;
        let dest_node = self.uf.node_mut(dest);
        if marker.is_some() && dest_node.shared == marker {
            dest_node.shared = None;
        }
    }

    /// Hands the equality of two shared terms in one class to the boolean
    /// search.
    pub(crate) fn share_equality(&mut self, a: TermId, b: TermId) {
        let (atom, created) = self.intern_atom(a, b);
        debug!("Shared terms {} and {} are equal ({}{})", a, b, atom, if created { ", new" } else { "" });
        // a new atom is propagated when it is registered
        let queued = self.propagations.iter().any(|p| p.lit.atom() == atom);
        if !created && !queued && self.uf.find(a) == self.uf.find(b) {
            self.propagate_lit(Lit::pos(atom), Cause::Merged);
        }
    }
}
