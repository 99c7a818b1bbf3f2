use log::*;

use crate::merge::MergeRecord;
use crate::*;

/// One reversible change, in the order it was made.
#[derive(Debug)]
pub(crate) enum UndoOp {
    Merge(Box<MergeRecord>),
    /// A disequality witness stored between these two representatives.
    Separate(TermId, TermId),
    Assign(AtomId),
    Atom(AtomId),
    Parents(TermId),
    Trigger(TriggerId),
}

/// Registrations that were undone only because something below them was,
/// and must be replayed against the restored classes.
enum Registration {
    Atom(AtomId),
    Parents(TermId),
    Trigger(TriggerId),
}

#[derive(Debug, Default)]
pub(crate) struct Trail {
    ops: Vec<UndoOp>,
    levels: Vec<usize>,
}

impl Trail {
    pub fn push(&mut self, op: UndoOp) {
        self.ops.push(op)
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }
}

impl<B: Bridge> CongruenceClosure<B> {
    /// Opens a new decision level.
    ///
    /// See [`CongruenceClosure::pop_levels`].
    pub fn push_level(&mut self) {
        self.trail.levels.push(self.trail.len());
        debug!("Level {}", self.trail.n_levels());
    }

    /// The number of open decision levels.
    pub fn level(&self) -> usize {
        self.trail.n_levels()
    }

    /// Undoes everything done since the `n`th most recent
    /// [`push_level`](CongruenceClosure::push_level), closing those levels.
    ///
    /// Terms, atoms and triggers created inside the popped levels survive;
    /// they are registered again against the restored classes. Any
    /// congruence this uncovers is queued, call
    /// [`propagate`](CongruenceClosure::propagate) before relying on the
    /// classes of such terms.
    ///
    /// ```
    /// use cclosure::*;
    /// let mut cc = CongruenceClosure::new();
    /// let a = cc.add_expr("a").unwrap();
    /// let b = cc.add_expr("b").unwrap();
    /// let p = cc.add_atom(a, b).unwrap();
    /// cc.push_level();
    /// cc.assert_literal(Lit::pos(p)).unwrap();
    /// assert!(cc.are_equal(a, b));
    /// cc.pop_levels(1);
    /// assert!(!cc.are_equal(a, b));
    /// assert_eq!(cc.value(p), None);
    /// ```
    pub fn pop_levels(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let levels = &mut self.trail.levels;
        if n > levels.len() {
            panic!("Not enough pushes to pop");
        }
        let target = levels[levels.len() - n];
        levels.truncate(levels.len() - n);
        debug!("Backtrack to level {}", levels.len());
        self.undo_until(target);
    }

    /// Pops levels until only `level` are open.
    pub fn backtrack_to(&mut self, level: usize) {
        let current = self.level();
        assert!(level <= current, "Cannot backtrack from level {} to {}", current, level);
        self.pop_levels(current - level);
    }

    /// The endpoints of the most recent merge, the one
    /// [`undo_merge`](CongruenceClosure::undo_merge) takes back next.
    pub fn last_merge(&self) -> Option<(TermId, TermId)> {
        self.trail.ops.iter().rev().find_map(|op| match op {
            UndoOp::Merge(record) => Some((record.lhs, record.rhs)),
            _ => None,
        })
    }

    /// Undoes the most recent merge, which must have connected `node` to
    /// another term.
    ///
    /// Assignments, separations and registrations made after that merge
    /// are undone with it; registrations are then replayed against the
    /// restored classes. If the merge came from
    /// [`assert_literal`](CongruenceClosure::assert_literal), the
    /// assignment is taken back too.
    ///
    /// # Panics
    /// When there is no merge to undo, or the most recent one does not
    /// touch `node`. That is a bug in the caller, not a recoverable
    /// condition.
    pub fn undo_merge(&mut self, node: TermId) {
        let position = self
            .trail
            .ops
            .iter()
            .rposition(|op| matches!(op, UndoOp::Merge(_)));
        match position.map(|i| &self.trail.ops[i]) {
            Some(UndoOp::Merge(record)) if record.lhs == node || record.rhs == node => {}
            last => panic!("undo_merge({}) but the most recent merge is {:?}", node, last),
        }
        if let Some(position) = position {
            let target = match (&self.trail.ops[position], position.checked_sub(1)) {
                (UndoOp::Merge(record), Some(below)) if record.external => match self.trail.ops[below] {
                    UndoOp::Assign(atom) if self.asserted_by(atom, record.lhs, record.rhs) => below,
                    _ => position,
                },
                _ => position,
            };
            self.undo_until(target);
        }
    }

    /// Undoes the most recent merge requested from outside, together with
    /// its congruence cascade and everything done after it.
    ///
    /// Returns `false` if there is no such merge.
    pub fn undo_external(&mut self) -> bool {
        let position = self
            .trail
            .ops
            .iter()
            .rposition(|op| matches!(op, UndoOp::Merge(record) if record.external));
        match position {
            Some(position) => {
                self.undo_until(position);
                true
            }
            None => false,
        }
    }

    /// Whether assigning `atom` is what merged `lhs` and `rhs`.
    fn asserted_by(&self, atom: AtomId, lhs: TermId, rhs: TermId) -> bool {
        let (a, b) = self.atom(atom);
        self.value(atom) == Some(true) && ((a, b) == (lhs, rhs) || (a, b) == (rhs, lhs))
    }

    fn undo_until(&mut self, target: usize) {
        self.pending.clear();
        self.propagations.clear();
        self.events.clear();

        let mut replay = vec![];
        while self.trail.len() > target {
            let op = match self.trail.ops.pop() {
                Some(op) => op,
                None => break,
            };
            match op {
                UndoOp::Merge(record) => self.undo_merge_record(*record),
                UndoOp::Separate(a, b) => {
                    trace!("Undo separation of {} and {}", a, b);
                    self.pairs.unset_diseq(a, b)
                }
                UndoOp::Assign(atom) => self.atoms[usize::from(atom)].value = None,
                UndoOp::Atom(atom) => {
                    let (lhs, rhs) = self.atom(atom);
                    let (ra, rb) = (self.uf.find(lhs), self.uf.find(rhs));
                    if ra != rb {
                        self.pairs.remove_eqlit(ra, rb, atom);
                    }
                    replay.push(Registration::Atom(atom));
                }
                UndoOp::Parents(app) => {
                    if let Some((func, arg)) = self.terms.term(app).as_app() {
                        let key = self.terms.term(func).func_key().unwrap_or_default();
                        let (func_rep, arg_rep) = (self.uf.find(func), self.uf.find(arg));
                        self.parents.unregister(app, key, func_rep, arg_rep);
                    }
                    replay.push(Registration::Parents(app));
                }
                UndoOp::Trigger(trigger) => {
                    self.unregister_trigger(trigger);
                    replay.push(Registration::Trigger(trigger));
                }
            }
        }
        let len = self.trail.len();
        while self.trail.levels.last().map_or(false, |&l| l > len) {
            self.trail.levels.pop();
        }

        if !replay.is_empty() {
            trace!("Replaying {} registrations", replay.len());
        }
        for registration in replay.into_iter().rev() {
            match registration {
                Registration::Atom(atom) => self.register_atom(atom),
                Registration::Parents(app) => self.register_parents(app),
                Registration::Trigger(trigger) => self.register_trigger(trigger),
            }
        }

        if self.config.expensive_checks() {
            self.check_invariants();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_push_pop() {
        crate::init_logger();
        let mut cc = CongruenceClosure::new();
        let a = cc.add_expr("a").unwrap();
        let fa = cc.add_expr("(f a)").unwrap();
        let c = cc.add_expr("c").unwrap();
        let before = cc.dump();

        cc.push_level();
        let b = cc.add_expr("b").unwrap();
        let gb = cc.add_expr("(g b)").unwrap();
        let ba = cc.add_atom(b, a).unwrap();
        let bc = cc.add_atom(b, c).unwrap();
        cc.assert_literal(Lit::pos(ba)).unwrap();
        cc.assert_literal(Lit::pos(bc)).unwrap();
        assert!(cc.are_equal(a, c));
        cc.pop_levels(1);

        assert!(!cc.are_equal(a, c));
        assert!(!cc.are_equal(a, b));
        assert_eq!(cc.find(fa), fa);
        assert_eq!(cc.find(gb), gb);
        // terms and atoms made inside the level survive
        assert_eq!(cc.dump().reps.len(), before.reps.len() + 3);
        assert_eq!(cc.value(ba), None);
    }

    #[test]
    fn registrations_are_replayed_after_backtracking() {
        let mut cc = CongruenceClosure::new();
        let x = cc.add_expr("x").unwrap();
        let y = cc.add_expr("y").unwrap();
        let xy = cc.add_atom(x, y).unwrap();

        cc.push_level();
        cc.assert_literal(Lit::pos(xy)).unwrap();
        // created while x = y holds
        let fx = cc.add_expr("(f x)").unwrap();
        let fy = cc.add_expr("(f y)").unwrap();
        let p = cc.add_atom(fx, fy).unwrap();
        assert!(cc.are_equal(fx, fy));
        cc.pop_levels(1);
        cc.propagate().unwrap();

        assert!(!cc.are_equal(fx, fy));
        cc.check_invariants();

        // the atom is back in the pair index and gets implied again
        cc.take_propagations();
        cc.assert_literal(Lit::pos(xy)).unwrap();
        let implied = cc.take_propagations();
        assert!(implied.iter().any(|prop| prop.lit == Lit::pos(p)));
    }

    #[test]
    fn undo_merge_checks_order() {
        let mut cc = CongruenceClosure::new();
        let a = cc.add_expr("a").unwrap();
        let b = cc.add_expr("b").unwrap();
        let c = cc.add_expr("c").unwrap();
        let ab = cc.add_atom(a, b).unwrap();
        let bc = cc.add_atom(b, c).unwrap();
        cc.merge(a, b, Lit::pos(ab)).unwrap();
        cc.merge(b, c, Lit::pos(bc)).unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut cc = CongruenceClosure::new();
            let a = cc.add_expr("a").unwrap();
            let b = cc.add_expr("b").unwrap();
            let p = cc.add_atom(a, b).unwrap();
            cc.merge(a, b, Lit::pos(p)).unwrap();
            cc.undo_merge(TermId::from(5));
        }));
        assert!(result.is_err());

        cc.undo_merge(c);
        assert!(!cc.are_equal(a, c));
        assert!(cc.are_equal(a, b));
        cc.undo_merge(a);
        assert!(!cc.are_equal(a, b));
        assert_eq!(cc.merge_depth(), 0);
    }

    #[test]
    fn undo_merge_after_assertions() {
        crate::init_logger();
        let mut cc = CongruenceClosure::new();
        let a = cc.add_expr("a").unwrap();
        let b = cc.add_expr("b").unwrap();
        let c = cc.add_expr("c").unwrap();
        let ab = cc.add_atom(a, b).unwrap();
        let cb = cc.add_atom(c, b).unwrap();
        let before = cc.dump();

        cc.assert_literal(Lit::pos(ab)).unwrap();
        let after_first = cc.dump();
        cc.assert_literal(Lit::pos(cb)).unwrap();
        assert_eq!(cc.assigned_literals().collect::<Vec<_>>(), vec![Lit::pos(ab), Lit::pos(cb)]);

        cc.undo_merge(c);
        assert!(!cc.are_equal(a, c));
        assert!(cc.are_equal(a, b));
        assert_eq!(cc.value(cb), None);
        assert_eq!(cc.dump(), after_first);

        cc.undo_merge(a);
        assert!(!cc.are_equal(a, b));
        assert_eq!(cc.assigned_literals().count(), 0);
        assert_eq!(cc.dump(), before);
        cc.check_invariants();
    }

    #[test]
    #[should_panic(expected = "but the most recent merge is None")]
    fn undo_merge_without_merges() {
        let mut cc = CongruenceClosure::new();
        let a = cc.add_expr("a").unwrap();
        let b = cc.add_expr("b").unwrap();
        let p = cc.add_atom(a, b).unwrap();
        cc.assert_literal(Lit::neg(p)).unwrap();
        cc.undo_merge(a);
    }

    #[test]
    #[should_panic(expected = "Not enough pushes to pop")]
    fn popping_too_far() {
        let mut cc = CongruenceClosure::new();
        cc.push_level();
        cc.pop_levels(2);
    }

    #[test]
    fn undo_external_takes_the_cascade() {
        let mut cc = CongruenceClosure::new();
        let x = cc.add_expr("x").unwrap();
        let y = cc.add_expr("y").unwrap();
        let fx = cc.add_expr("(f x)").unwrap();
        let fy = cc.add_expr("(f y)").unwrap();
        let p = cc.add_atom(x, y).unwrap();
        cc.merge(x, y, Lit::pos(p)).unwrap();
        assert_eq!(cc.merge_depth(), 2);
        assert!(cc.undo_external());
        assert_eq!(cc.merge_depth(), 0);
        assert!(!cc.are_equal(fx, fy));
        assert!(!cc.undo_external());
    }
}
