use log::*;

use crate::pairs::{PairEffects, PairMerge};
use crate::parents::{ParentEffects, ParentMerge};
use crate::semi_persistent::UndoOp;
use crate::*;

/// Everything needed to undo one merge besides the equality edge itself.
#[derive(Debug)]
pub(crate) struct MergeRecord {
    /// The endpoints of the equality edge the merge created.
    pub lhs: TermId,
    pub rhs: TermId,
    /// Requested from outside, as opposed to found by congruence.
    pub external: bool,
    parents: ParentMerge,
    pairs: PairMerge,
}

impl<B: Bridge> CongruenceClosure<B> {
    /// Asserts the literal `lit` of a registered atom.
    ///
    /// A positive literal merges the two sides of the atom and closes the
    /// classes under congruence; a negative one records a disequality
    /// witness. Re-asserting an assigned literal is a no-op.
    ///
    /// On conflict, the returned [`Conflict`] holds only currently asserted
    /// literals. The state stays consistent and the caller is expected to
    /// backtrack.
    pub fn assert_literal(&mut self, lit: Lit) -> Result<(), Conflict> {
        let atom = lit.atom();
        let (lhs, rhs) = self.atom(atom);
        match self.value(atom) {
            Some(value) if value == lit.is_positive() => return Ok(()),
            Some(_) => {
                self.stats.conflicts += 1;
                return Err(Conflict::new(vec![lit, !lit], ConflictKind::Assignment(atom)));
            }
            None => {}
        }
        self.atoms[usize::from(atom)].value = Some(lit.is_positive());
        self.trail.push(UndoOp::Assign(atom));
        debug!("Assert {}: {} {} {}", lit, lhs, if lit.is_positive() { "=" } else { "!=" }, rhs);
        if lit.is_positive() {
            self.merge(lhs, rhs, lit).map(|_| ())
        } else {
            self.separate(lhs, rhs, lit)
        }
    }

    /// Merges the classes of `a` and `b` because of `reason` and closes
    /// them under congruence.
    ///
    /// Returns `Ok(false)` without any change if they are already equal.
    pub fn merge(&mut self, a: TermId, b: TermId, reason: Lit) -> Result<bool, Conflict> {
        debug_assert!(!self.terms.is_function(a) && !self.terms.is_function(b));
        let result = self
            .merge_terms(a, b, Justification::Asserted(reason), true)
            .and_then(|merged| self.drain_pending().map(|()| merged));
        self.finish(result)
    }

    /// Records that `a` and `b` are distinct because of `reason`.
    ///
    /// Only the first witness between two classes is kept.
    pub fn separate(&mut self, a: TermId, b: TermId, reason: Lit) -> Result<(), Conflict> {
        let (ra, rb) = (self.uf.find(a), self.uf.find(b));
        let diseq = Disequality {
            lhs: a,
            rhs: b,
            reason,
        };
        if ra == rb {
            let mut literals = Default::default();
            self.explain_into(a, b, &mut literals);
            literals.insert(reason);
            let conflict = Conflict::new(literals.into_iter().collect(), ConflictKind::Disequality(diseq));
            return self.finish(Err(conflict));
        }
        if let Some(atoms) = self.pairs.set_diseq(ra, rb, diseq) {
            debug!("Separate {} and {}", ra, rb);
            self.trail.push(UndoOp::Separate(ra, rb));
            for atom in atoms {
                self.propagate_lit(Lit::neg(atom), Cause::Separated(diseq));
            }
        }
        self.finish(Ok(()))
    }

    /// Drains the pending congruences, e.g. the ones uncovered by
    /// [`pop_levels`](CongruenceClosure::pop_levels).
    pub fn propagate(&mut self) -> Result<(), Conflict> {
        let result = self.drain_pending();
        self.finish(result)
    }

    fn finish<T>(&mut self, result: Result<T, Conflict>) -> Result<T, Conflict> {
        match &result {
            Err(conflict) => {
                self.pending.clear();
                self.stats.conflicts += 1;
                debug!("Conflict: {}", conflict);
            }
            Ok(_) => {
                if self.config.expensive_checks() {
                    self.check_invariants();
                }
            }
        }
        result
    }

    pub(crate) fn drain_pending(&mut self) -> Result<(), Conflict> {
        while let Some((a, b)) = self.pending.pop_front() {
            self.stats.congruence_checks += 1;
            if self.uf.find(a) == self.uf.find(b) {
                continue;
            }
            self.merge_terms(a, b, Justification::Congruence, false)?;
        }
        Ok(())
    }

    /// Merges the classes of `a` and `b` without closing them under
    /// congruence; new congruences are queued on `self.pending`.
    pub(crate) fn merge_terms(
        &mut self,
        a: TermId,
        b: TermId,
        reason: Justification,
        external: bool,
    ) -> Result<bool, Conflict> {
        let (mut lhs, mut rhs) = (a, b);
        let (mut src, mut dest) = (self.uf.find(a), self.uf.find(b));
        if src == dest {
            return Ok(false);
        }
        // absorb the smaller class
        if self.uf.members(src).len() > self.uf.members(dest).len() {
            std::mem::swap(&mut lhs, &mut rhs);
            std::mem::swap(&mut src, &mut dest);
        }

        if let Some(diseq) = self.pairs.get(src, dest).and_then(|info| info.diseq) {
            return Err(self.diseq_conflict(lhs, rhs, reason, diseq));
        }
        if let Some((s1, s2)) = self.distinct_shared(src, dest) {
            return Err(self.shared_conflict(lhs, rhs, reason, s1, s2));
        }

        self.depth += 1;
        let (src, dest) = self.uf.link(lhs, rhs, reason, self.depth);
        debug!("Merge {} into {} ({} = {}, {:?})", src, dest, lhs, rhs, reason);
        self.stats.merges += 1;
        if reason == Justification::Congruence {
            self.stats.congruence_merges += 1;
        }

        let mut parent_effects = ParentEffects::default();
        let parents = self
            .parents
            .merge(src, dest, &self.terms, &self.uf, &mut parent_effects);
        let mut pair_effects = PairEffects::default();
        let pairs = self.pairs.merge(src, dest, &mut pair_effects);
        let markers = self.merge_shared(src, dest);
        self.trail.push(UndoOp::Merge(Box::new(MergeRecord {
            lhs,
            rhs,
            external,
            parents,
            pairs,
        })));

        for (p, q) in parent_effects.congruences {
            trace!("Congruence: {} ~ {}", p, q);
            self.pending.push_back((p, q));
        }
        for (trigger, app) in parent_effects.activations {
            self.activate_reverse(trigger, app);
        }
        for atom in pair_effects.now_equal {
            self.propagate_lit(Lit::pos(atom), Cause::Merged);
        }
        for (atom, diseq) in pair_effects.now_distinct {
            self.propagate_lit(Lit::neg(atom), Cause::Separated(diseq));
        }
        for trigger in pair_effects.fired {
            self.fire_compare(trigger);
        }
        if let Some((s1, s2)) = markers {
            self.share_equality(s1, s2);
        }
        Ok(true)
    }

    pub(crate) fn undo_merge_record(&mut self, record: MergeRecord) {
        let (edge, dest) = self.uf.unlink(record.lhs, record.rhs);
        assert_eq!(
            edge.time, self.depth,
            "Undoing the merge of {} and {} at depth {}, but it was made at depth {}",
            record.lhs, record.rhs, self.depth, edge.time
        );
        self.depth -= 1;
        let src = edge.old_rep;
        debug!("Undo merge of {} into {}", src, dest);
        self.stats.undone_merges += 1;

        self.pairs.undo(record.pairs, src, dest);
        self.parents.undo(record.parents, dest);
        self.unmerge_shared(src, dest);
    }
}
