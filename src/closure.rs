use std::collections::VecDeque;
use std::fmt;

use log::*;

use crate::lit::Atom;
use crate::semi_persistent::{Trail, UndoOp};
use crate::util::HashMap;
use crate::*;

/// A handle to a registered trigger.
#[derive(Clone, Copy, Default, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-1", serde(transparent))]
pub struct TriggerId(u32);

impl From<usize> for TriggerId {
    fn from(n: usize) -> TriggerId {
        TriggerId(n as u32)
    }
}

impl From<TriggerId> for usize {
    fn from(id: TriggerId) -> usize {
        id.0 as usize
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger{}", self.0)
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Trigger {
    Compare {
        lhs: TermId,
        rhs: TermId,
    },
    Reverse {
        key: FuncKey,
        arg: TermId,
    },
}

/// A trigger that became active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub enum TriggerEvent {
    /// The two terms of a compare trigger are now equal.
    Compare {
        /// The trigger.
        trigger: TriggerId,
        /// The first term it was registered with.
        lhs: TermId,
        /// The second term it was registered with.
        rhs: TermId,
    },
    /// A full application has its argument in the watched class.
    Reverse {
        /// The trigger.
        trigger: TriggerId,
        /// The full application.
        app: TermId,
    },
}

/// Why a literal was implied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub enum Cause {
    /// Both sides of the atom are in one class.
    Merged,
    /// The sides of the atom are in two classes separated by this witness.
    Separated(Disequality),
}

/// A literal implied by the current state, for the boolean search to assign.
///
/// The justification is computed on demand by
/// [`CongruenceClosure::explain`], and is only valid until the search
/// backtracks past the point where the propagation was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct Propagation {
    /// The implied literal.
    pub lit: Lit,
    /// Why it holds.
    pub cause: Cause,
}

/// Counters describing the work done so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub struct Stats {
    /// Committed merges, including congruence merges.
    pub merges: usize,
    /// Committed merges that were discovered by congruence.
    pub congruence_merges: usize,
    /// Pending congruences taken from the work list.
    pub congruence_checks: usize,
    /// Conflicts returned.
    pub conflicts: usize,
    /// Merges undone.
    pub undone_merges: usize,
    /// Literals propagated.
    pub propagations: usize,
}

/** The backtracking congruence closure engine of one solving context.

The engine owns every term node, equivalence class, parent list and pair
entry of the context. It is driven by the boolean search:

- equality literals come in through [`assert_literal`](CongruenceClosure::assert_literal)
  (or [`merge`](CongruenceClosure::merge) and
  [`separate`](CongruenceClosure::separate) for callers without atoms),
- decision levels are opened with [`push_level`](CongruenceClosure::push_level)
  and undone with [`pop_levels`](CongruenceClosure::pop_levels),
- implied literals are collected with
  [`take_propagations`](CongruenceClosure::take_propagations).

Every merge is closed under congruence before the call returns, and every
change can be undone exactly, in reverse order.

`B` is the [`Bridge`] to the theories that share terms with this one; the
default `()` never considers two shared terms distinct.

```
use cclosure::*;

let mut cc = CongruenceClosure::new();
let a = cc.add_expr("a").unwrap();
let b = cc.add_expr("b").unwrap();
let c = cc.add_expr("c").unwrap();
let ab = cc.add_atom(a, b).unwrap();
let ac = cc.add_atom(a, c).unwrap();
let bc = cc.add_atom(b, c).unwrap();

cc.assert_literal(Lit::neg(bc)).unwrap();
cc.assert_literal(Lit::pos(ab)).unwrap();
// a = c is now known to be false
let implied = cc.take_propagations();
assert!(implied.iter().any(|p| p.lit == Lit::neg(ac)));

let conflict = cc.assert_literal(Lit::pos(ac)).unwrap_err();
assert_eq!(conflict.literals().len(), 3);
```
**/
pub struct CongruenceClosure<B = ()> {
    pub(crate) terms: TermBank,
    pub(crate) uf: UnionFind,
    pub(crate) parents: ParentIndex,
    pub(crate) pairs: PairIndex,
    pub(crate) atoms: Vec<Atom>,
    pub(crate) atom_memo: HashMap<(TermId, TermId), AtomId>,
    pub(crate) triggers: Vec<Trigger>,
    pub(crate) trail: Trail,
    pub(crate) depth: u32,
    pub(crate) pending: VecDeque<(TermId, TermId)>,
    pub(crate) propagations: Vec<Propagation>,
    pub(crate) events: Vec<TriggerEvent>,
    pub(crate) stats: Stats,
    pub(crate) config: Config,
    pub(crate) bridge: B,
}

impl<B> fmt::Debug for CongruenceClosure<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CongruenceClosure")
            .field("terms", &self.terms)
            .field("atoms", &self.atoms.len())
            .field("depth", &self.depth)
            .field("level", &self.trail.n_levels())
            .field("stats", &self.stats)
            .finish()
    }
}

impl Default for CongruenceClosure<()> {
    fn default() -> Self {
        Self::with_bridge(())
    }
}

impl CongruenceClosure<()> {
    /// Creates an empty engine without theory bridge, configured by [`Config::default`].
    pub fn new() -> Self {
        Self::default()
    }
}

fn atom_key(a: TermId, b: TermId) -> (TermId, TermId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl<B: Bridge> CongruenceClosure<B> {
    /// Creates an empty engine that consults `bridge` about shared terms.
    pub fn with_bridge(bridge: B) -> Self {
        CongruenceClosure {
            terms: Default::default(),
            uf: Default::default(),
            parents: Default::default(),
            pairs: Default::default(),
            atoms: Default::default(),
            atom_memo: Default::default(),
            triggers: Default::default(),
            trail: Default::default(),
            depth: 0,
            pending: Default::default(),
            propagations: Default::default(),
            events: Default::default(),
            stats: Default::default(),
            config: Config::default(),
            bridge,
        }
    }

    /// Replaces the configuration.
    pub fn with_config(self, config: Config) -> Self {
        Self { config, ..self }
    }

    /// The configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The term nodes of this context.
    pub fn terms(&self) -> &TermBank {
        &self.terms
    }

    /// The theory bridge.
    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// The theory bridge, mutably.
    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    /// Counters describing the work done so far.
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// The number of merges currently in effect.
    pub fn merge_depth(&self) -> u32 {
        self.depth
    }

    /// The shared stop flag, see [`StopHandle`].
    pub fn stop_handle(&self) -> &StopHandle {
        self.config.stop_handle()
    }

    /// Returns `true` once someone requested the search to stop.
    ///
    /// The flag is only meant to be polled between top-level calls; calls
    /// that are already running always complete.
    pub fn is_termination_requested(&self) -> bool {
        self.config.stop_handle().is_stop_requested()
    }

    /// Declares a function symbol, see [`TermBank::declare`].
    pub fn declare(&mut self, name: impl Into<Symbol>, arity: usize) -> Result<(), TermError> {
        self.terms.declare(name, arity)
    }

    /// Adds a constant.
    pub fn add_constant(&mut self, name: impl Into<Symbol>) -> Result<TermId, TermError> {
        let id = self.terms.constant(name)?;
        self.sync_terms();
        Ok(id)
    }

    /// Adds the application `name(args..)`.
    pub fn add_app(&mut self, name: impl Into<Symbol>, args: &[TermId]) -> Result<TermId, TermError> {
        let id = self.terms.app(name, args)?;
        self.sync_terms();
        Ok(id)
    }

    /// Adds a term written as an s-expression, such as `(f (g a) b)`.
    pub fn add_expr(&mut self, expr: &str) -> Result<TermId, TermError> {
        let id = self.terms.parse(expr)?;
        self.sync_terms();
        Ok(id)
    }

    /// Gives every term created since the last call a node and registers
    /// it with the parent lists of its function and argument classes.
    fn sync_terms(&mut self) {
        let had_pending = !self.pending.is_empty();
        for i in self.uf.size()..self.terms.len() {
            let id = self.uf.make_set();
            debug_assert_eq!(usize::from(id), i);
            self.parents.add_node();
            self.pairs.add_node();
            self.register_parents(id);
        }
        // A fresh application has no parents, pair entries or shared
        // marker yet, so merging it with a congruent class cannot conflict.
        if !had_pending {
            if let Err(conflict) = self.drain_pending() {
                panic!("Adding a term caused a conflict: {}", conflict);
            }
        }
    }

    pub(crate) fn register_parents(&mut self, app: TermId) {
        let (func, arg) = match self.terms.term(app).as_app() {
            Some(parts) => parts,
            None => return,
        };
        let key = self
            .terms
            .term(func)
            .func_key()
            .unwrap_or_else(|| panic!("{} applies a term that is not function-valued", app));
        if let Some(other) = self.parents.find_congruent(app, &self.terms, &self.uf) {
            trace!("Congruence on creation: {} ~ {}", app, other);
            self.pending.push_back((app, other));
        }
        let (func_rep, arg_rep) = (self.uf.find(func), self.uf.find(arg));
        self.parents.register(app, key, func_rep, arg_rep);
        self.record(UndoOp::Parents(app));

        if !self.terms.is_function(app) {
            // the reverse triggers on every argument position of a new full application
            let mut current = app;
            while let Some((func, arg)) = self.terms.term(current).as_app() {
                let key = self.terms.term(func).func_key();
                let info = self.parents.info(self.uf.find(arg));
                if let Some(list) = key.and_then(|key| info.by_key.get(&key)) {
                    for &trigger in &list.reverse_triggers {
                        self.events.push(TriggerEvent::Reverse { trigger, app });
                    }
                }
                current = func;
            }
        }
    }

    /// Pushes a registration onto the trail if there is anything it could
    /// be undone with.
    pub(crate) fn record(&mut self, op: UndoOp) {
        if !self.trail.is_empty() {
            self.trail.push(op);
        }
    }

    /// Adds the equality atom `a = b`.
    ///
    /// Atoms are interned by their unordered pair of terms. If the atom is
    /// already implied by the current state, the implication shows up in
    /// [`take_propagations`](CongruenceClosure::take_propagations).
    pub fn add_atom(&mut self, a: TermId, b: TermId) -> Result<AtomId, TermError> {
        let (ta, tb) = (self.terms.get(a)?, self.terms.get(b)?);
        if ta.is_function() || tb.is_function() {
            return Err(TermError::PartialEquality(a, b));
        }
        Ok(self.intern_atom(a, b).0)
    }

    /// Returns the atom for `a = b` and whether it was newly created.
    pub(crate) fn intern_atom(&mut self, a: TermId, b: TermId) -> (AtomId, bool) {
        if let Some(&id) = self.atom_memo.get(&atom_key(a, b)) {
            return (id, false);
        }
        let id = AtomId::from(self.atoms.len());
        self.atoms.push(Atom::new(a, b));
        self.atom_memo.insert(atom_key(a, b), id);
        trace!("Atom {}: {} = {}", id, a, b);
        self.register_atom(id);
        (id, true)
    }

    pub(crate) fn register_atom(&mut self, atom: AtomId) {
        let Atom { lhs, rhs, .. } = self.atoms[usize::from(atom)];
        let (ra, rb) = (self.uf.find(lhs), self.uf.find(rhs));
        if ra == rb {
            self.propagate_lit(Lit::pos(atom), Cause::Merged);
        } else if let Some(diseq) = self.pairs.add_eqlit(ra, rb, atom) {
            self.propagate_lit(Lit::neg(atom), Cause::Separated(diseq));
        }
        self.record(UndoOp::Atom(atom));
    }

    /// The two sides of an atom.
    pub fn atom(&self, atom: AtomId) -> (TermId, TermId) {
        let a = &self.atoms[usize::from(atom)];
        (a.lhs, a.rhs)
    }

    /// The current assignment of an atom.
    pub fn value(&self, atom: AtomId) -> Option<bool> {
        self.atoms[usize::from(atom)].value
    }

    /// The literals that are currently asserted, in atom order.
    pub fn assigned_literals(&self) -> impl Iterator<Item = Lit> + '_ {
        self.atoms
            .iter()
            .enumerate()
            .filter_map(|(i, atom)| atom.assigned(AtomId::from(i)))
    }

    /// The number of atoms.
    pub fn number_of_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub(crate) fn propagate_lit(&mut self, lit: Lit, cause: Cause) {
        if self.atoms[usize::from(lit.atom())].value.is_some() {
            return;
        }
        trace!("Propagate {} ({:?})", lit, cause);
        self.stats.propagations += 1;
        self.propagations.push(Propagation { lit, cause });
    }

    /// Takes the literals implied since the last call.
    pub fn take_propagations(&mut self) -> Vec<Propagation> {
        std::mem::take(&mut self.propagations)
    }

    /// Takes the triggers activated since the last call.
    pub fn take_trigger_events(&mut self) -> Vec<TriggerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Watches `a` and `b`: a [`TriggerEvent::Compare`] is reported when
    /// they become equal, right away if they already are.
    pub fn add_compare_trigger(&mut self, a: TermId, b: TermId) -> TriggerId {
        let id = TriggerId::from(self.triggers.len());
        self.triggers.push(Trigger::Compare { lhs: a, rhs: b });
        self.register_trigger(id);
        id
    }

    /// Watches argument `position` of `func` in the class of `arg`: a
    /// [`TriggerEvent::Reverse`] is reported for every full application of
    /// `func` whose argument at `position` is, or becomes, equal to `arg`.
    pub fn add_reverse_trigger(
        &mut self,
        func: impl Into<Symbol>,
        position: usize,
        arg: TermId,
    ) -> Result<TriggerId, TermError> {
        let key = self.terms.key_of(func, position)?;
        if self.terms.get(arg)?.is_function() {
            return Err(TermError::PartialArgument(arg));
        }
        let id = TriggerId::from(self.triggers.len());
        self.triggers.push(Trigger::Reverse { key, arg });
        self.register_trigger(id);
        Ok(id)
    }

    pub(crate) fn register_trigger(&mut self, id: TriggerId) {
        match self.triggers[usize::from(id)] {
            Trigger::Compare { lhs, rhs } => {
                let (ra, rb) = (self.uf.find(lhs), self.uf.find(rhs));
                if ra == rb {
                    self.events.push(TriggerEvent::Compare { trigger: id, lhs, rhs });
                } else {
                    self.pairs.add_trigger(ra, rb, id);
                }
            }
            Trigger::Reverse { key, arg } => {
                let rep = self.uf.find(arg);
                let apps = self.parents.add_reverse_trigger(rep, key, id).to_vec();
                for app in apps {
                    self.activate_reverse(id, app);
                }
            }
        }
        self.record(UndoOp::Trigger(id));
    }

    pub(crate) fn unregister_trigger(&mut self, id: TriggerId) {
        match self.triggers[usize::from(id)] {
            Trigger::Compare { lhs, rhs } => {
                let (ra, rb) = (self.uf.find(lhs), self.uf.find(rhs));
                if ra != rb {
                    self.pairs.remove_trigger(ra, rb, id);
                }
            }
            Trigger::Reverse { key, arg } => {
                let rep = self.uf.find(arg);
                self.parents.remove_reverse_trigger(rep, key, id);
            }
        }
    }

    pub(crate) fn activate_reverse(&mut self, trigger: TriggerId, app: TermId) {
        for full in self.terms.full_applications(app) {
            trace!("Reverse trigger {} on {}", trigger, full);
            self.events.push(TriggerEvent::Reverse { trigger, app: full });
        }
    }

    pub(crate) fn fire_compare(&mut self, trigger: TriggerId) {
        if let Trigger::Compare { lhs, rhs } = self.triggers[usize::from(trigger)] {
            trace!("Compare trigger {} on {} = {}", trigger, lhs, rhs);
            self.events.push(TriggerEvent::Compare { trigger, lhs, rhs });
        }
    }

    /// The representative of the class of `t`.
    pub fn find(&self, t: TermId) -> TermId {
        self.uf.find(t)
    }

    /// Returns `true` if `t` represents its class.
    pub fn is_representative(&self, t: TermId) -> bool {
        self.uf.find(t) == t
    }

    /// Returns `true` if `a` and `b` are in the same class.
    pub fn are_equal(&self, a: TermId, b: TermId) -> bool {
        self.uf.find(a) == self.uf.find(b)
    }

    /// Returns `true` if a disequality witness separates the classes of `a` and `b`.
    pub fn are_distinct(&self, a: TermId, b: TermId) -> bool {
        self.pairs
            .get(self.uf.find(a), self.uf.find(b))
            .map_or(false, |info| info.diseq.is_some())
    }

    /// The class of `t`.
    pub fn class(&self, t: TermId) -> EClass<'_> {
        let rep = self.uf.find(t);
        EClass {
            id: rep,
            nodes: self.uf.members(rep),
            shared: self.uf.node(rep).shared,
        }
    }

    /// Iterates over all classes.
    pub fn classes(&self) -> impl Iterator<Item = EClass<'_>> {
        self.terms
            .ids()
            .filter(move |&id| self.is_representative(id))
            .map(move |id| self.class(id))
    }

    /// The number of classes.
    pub fn number_of_classes(&self) -> usize {
        self.classes().count()
    }

    /// Snapshots the observable state: representatives, member lists,
    /// parent lists, pair entries, shared markers and assignments.
    pub fn dump(&self) -> Dump {
        let reps: Vec<TermId> = self.terms.ids().map(|id| self.uf.find(id)).collect();
        let roots = move || self.terms.ids().filter(move |&id| self.is_representative(id));
        let classes = roots().map(|r| (r, self.uf.members(r).to_vec())).collect();
        let parents = roots()
            .map(|r| {
                let info = self.parents.info(r);
                let by_key = info
                    .by_key
                    .iter()
                    .map(|(&key, list)| (key, list.apps.clone(), list.reverse_triggers.clone()))
                    .collect();
                let parents = DumpParents {
                    func_apps: info.func_apps.clone(),
                    by_key,
                };
                (r, parents)
            })
            .collect();
        let partners = roots().map(|r| (r, self.pairs.partners(r).to_vec())).collect();
        let mut pairs: Vec<DumpPair> = self
            .pairs
            .entries()
            .map(|(&(lhs, rhs), info)| DumpPair {
                lhs,
                rhs,
                eqlits: info.eqlits.clone(),
                diseq: info.diseq,
                triggers: info.triggers.clone(),
            })
            .collect();
        pairs.sort_by_key(|p| (p.lhs, p.rhs));
        Dump {
            reps,
            classes,
            parents,
            partners,
            pairs,
            shared: self.terms.ids().map(|id| self.uf.node(id).shared).collect(),
            assignments: self.atoms.iter().map(|a| a.value).collect(),
        }
    }

    /// Verifies the class invariants, panicking with a description of the
    /// first violation found.
    ///
    /// Runs automatically after every top-level call when
    /// [`Config::expensive_checks`] is on.
    pub fn check_invariants(&self) {
        let n = self.uf.size();
        assert_eq!(n, self.terms.len(), "Term nodes out of sync");

        // representatives agree with the equality edges
        for id in self.terms.ids() {
            let rep = self.uf.find(id);
            assert_eq!(self.uf.find(rep), rep, "Representative {} of {} is stale", rep, id);
            let path = self.uf.path_to_root(id);
            let root = path[path.len() - 1];
            assert_eq!(
                self.uf.find(root),
                rep,
                "{} reaches {} by equality edges but is represented by {}",
                id,
                root,
                rep
            );
        }

        // member lists hold exactly the members
        let mut counted = 0;
        for class in self.classes() {
            for &m in class.iter() {
                assert_eq!(self.uf.find(m), class.id, "{} is listed in the class of {}", m, class.id);
            }
            counted += class.len();
        }
        assert_eq!(counted, n, "Member lists do not cover every node");

        // pair entries are keyed by distinct representatives
        for (&(a, b), info) in self.pairs.entries() {
            assert!(a != b && self.is_representative(a) && self.is_representative(b));
            assert!(self.pairs.partners(a).contains(&b) && self.pairs.partners(b).contains(&a));
            if let Some(d) = info.diseq {
                let ends = (self.uf.find(d.lhs), self.uf.find(d.rhs));
                assert!(ends == (a, b) || ends == (b, a), "Disequality {:?} misplaced", d);
            }
            for &atom in &info.eqlits {
                let (lhs, rhs) = self.atom(atom);
                let ends = (self.uf.find(lhs), self.uf.find(rhs));
                assert!(ends == (a, b) || ends == (b, a), "Atom {} misplaced", atom);
            }
        }

        // parent lists and congruence closure
        let mut signatures: HashMap<(TermId, TermId), TermId> = Default::default();
        for app in self.terms.ids() {
            let (func, arg) = match self.terms.term(app).as_app() {
                Some(parts) => parts,
                None => continue,
            };
            let (func_rep, arg_rep) = (self.uf.find(func), self.uf.find(arg));
            assert!(self.parents.info(func_rep).func_apps.contains(&app), "{} missing from function parents", app);
            let key = self.terms.term(func).func_key();
            let listed = key
                .and_then(|key| self.parents.info(arg_rep).by_key.get(&key))
                .map_or(false, |list| list.apps.contains(&app));
            assert!(listed, "{} missing from argument parents", app);

            if self.pending.is_empty() {
                if let Some(&other) = signatures.get(&(func_rep, arg_rep)) {
                    assert_eq!(
                        self.uf.find(other),
                        self.uf.find(app),
                        "{} and {} are congruent but not equal",
                        other,
                        app
                    );
                } else {
                    signatures.insert((func_rep, arg_rep), app);
                }
            }
        }
    }
}

/// The parent lists of one class, as captured by [`CongruenceClosure::dump`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct DumpParents {
    /// Applications whose function part is in the class.
    pub func_apps: Vec<TermId>,
    /// Per function key: applications whose argument is in the class, and reverse triggers.
    pub by_key: Vec<(FuncKey, Vec<TermId>, Vec<TriggerId>)>,
}

/// One pair entry, as captured by [`CongruenceClosure::dump`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct DumpPair {
    /// The smaller representative.
    pub lhs: TermId,
    /// The larger representative.
    pub rhs: TermId,
    /// Atoms between the two classes.
    pub eqlits: Vec<AtomId>,
    /// The disequality witness, if any.
    pub diseq: Option<Disequality>,
    /// Compare triggers between the two classes.
    pub triggers: Vec<TriggerId>,
}

/// A snapshot of the observable engine state, comparable with `==`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct Dump {
    /// The representative of every node.
    pub reps: Vec<TermId>,
    /// The member list of every class, in order.
    pub classes: Vec<(TermId, Vec<TermId>)>,
    /// The parent lists of every class.
    pub parents: Vec<(TermId, DumpParents)>,
    /// The pair partners of every class, in order.
    pub partners: Vec<(TermId, Vec<TermId>)>,
    /// Every pair entry.
    pub pairs: Vec<DumpPair>,
    /// The shared marker of every node.
    pub shared: Vec<Option<TermId>>,
    /// The assignment of every atom.
    pub assignments: Vec<Option<bool>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms_are_interned_and_checked() {
        crate::init_logger();
        let mut cc = CongruenceClosure::new();
        let a = cc.add_expr("a").unwrap();
        let b = cc.add_expr("b").unwrap();
        let fab = cc.add_expr("(f a b)").unwrap();
        let p = cc.add_atom(a, b).unwrap();
        assert_eq!(cc.add_atom(b, a).unwrap(), p);
        assert_eq!(cc.atom(p), (a, b));

        let (partial, _) = cc.terms().get(fab).unwrap().as_app().unwrap();
        assert_eq!(cc.add_atom(a, partial), Err(TermError::PartialEquality(a, partial)));
        assert_eq!(
            cc.add_atom(a, TermId::from(100)),
            Err(TermError::UnknownTerm(TermId::from(100)))
        );
    }

    #[test]
    fn trivially_true_atoms_propagate() {
        let mut cc = CongruenceClosure::new();
        let a = cc.add_expr("a").unwrap();
        let p = cc.add_atom(a, a).unwrap();
        assert_eq!(
            cc.take_propagations(),
            vec![Propagation {
                lit: Lit::pos(p),
                cause: Cause::Merged
            }]
        );
    }

    #[test]
    fn new_terms_join_congruent_classes() {
        let mut cc = CongruenceClosure::new();
        let x = cc.add_expr("x").unwrap();
        let y = cc.add_expr("y").unwrap();
        let fx = cc.add_expr("(f x)").unwrap();
        let p = cc.add_atom(x, y).unwrap();
        cc.assert_literal(Lit::pos(p)).unwrap();

        let fy = cc.add_expr("(f y)").unwrap();
        assert!(cc.are_equal(fx, fy));
        assert_eq!(cc.class(fx).len(), 2);
        cc.check_invariants();
    }

    #[test]
    fn dump_reflects_classes() {
        let mut cc = CongruenceClosure::new();
        let a = cc.add_expr("a").unwrap();
        let b = cc.add_expr("b").unwrap();
        let before = cc.dump();
        let p = cc.add_atom(a, b).unwrap();
        assert_ne!(cc.dump(), before);
        cc.assert_literal(Lit::pos(p)).unwrap();
        let dump = cc.dump();
        assert_eq!(dump.reps[0], dump.reps[1]);
        assert_eq!(dump.classes.len(), 1);
        assert_eq!(dump.assignments, vec![Some(true)]);
        assert!(dump.pairs.is_empty());
    }
}
