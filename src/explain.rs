use std::fmt;

use symbolic_expressions::Sexp;

use crate::unionfind::Edge;
use crate::util::{pretty_print, HashMap, HashSet, IndexSet};
use crate::*;

/// What made a [`Conflict`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub enum ConflictKind {
    /// Two classes separated by this witness were about to merge.
    Disequality(Disequality),
    /// Two classes were about to merge although the bridge proves their
    /// shared terms distinct. The bridge owns the reason for `lhs != rhs`.
    Shared {
        /// The shared term of one class.
        lhs: TermId,
        /// The shared term of the other class.
        rhs: TermId,
    },
    /// The opposite literal of this atom is already assigned.
    Assignment(AtomId),
}

/// A set of currently asserted literals that cannot all be true.
///
/// The boolean search learns [`clause`](Conflict::clause) and backtracks.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct Conflict {
    literals: Vec<Lit>,
    kind: ConflictKind,
}

impl Conflict {
    pub(crate) fn new(literals: Vec<Lit>, kind: ConflictKind) -> Self {
        Conflict { literals, kind }
    }

    /// The literals whose conjunction is unsatisfiable, without duplicates.
    pub fn literals(&self) -> &[Lit] {
        &self.literals
    }

    /// The conflict as a clause: the negation of every literal.
    pub fn clause(&self) -> Vec<Lit> {
        self.literals.iter().map(|&lit| !lit).collect()
    }

    /// What made the conflict.
    pub fn kind(&self) -> &ConflictKind {
        &self.kind
    }

    /// Returns `true` if `lit` is one of the literals.
    pub fn contains(&self, lit: Lit) -> bool {
        self.literals.contains(&lit)
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, lit) in self.literals.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", lit)?;
        }
        write!(f, "]")?;
        match &self.kind {
            ConflictKind::Disequality(d) => write!(f, " against {} != {}", d.lhs, d.rhs),
            ConflictKind::Shared { lhs, rhs } => write!(f, " against shared {} != {}", lhs, rhs),
            ConflictKind::Assignment(atom) => write!(f, " on {}", atom),
        }
    }
}

impl std::error::Error for Conflict {}

/// Index of a [`ProofStep`] inside an [`EqualityProof`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProofId(u32);

impl From<usize> for ProofId {
    fn from(n: usize) -> ProofId {
        ProofId(n as u32)
    }
}

impl From<ProofId> for usize {
    fn from(id: ProofId) -> usize {
        id.0 as usize
    }
}

/// One step of an [`EqualityProof`]. Premises refer to earlier steps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProofStep {
    /// A term equals itself.
    Refl(TermId),
    /// An asserted literal.
    Asserted {
        /// Left side.
        lhs: TermId,
        /// Right side.
        rhs: TermId,
        /// The literal.
        lit: Lit,
    },
    /// Two applications with equal function and argument parts.
    Congruence {
        /// Left application.
        lhs: TermId,
        /// Right application.
        rhs: TermId,
        /// Proof that the function parts are equal.
        func: ProofId,
        /// Proof that the arguments are equal.
        arg: ProofId,
    },
    /// A chain of equalities, each step starting where the last one ended.
    Trans(Vec<ProofId>),
}

/** A derivation of one equality from asserted literals.

Built by [`CongruenceClosure::proof`] from the equality edges that are
live at the time of the call. Like a flattened expression, the steps are
stored in a vector where every step only refers to steps before it, and
the last step is the conclusion. A sub-proof needed more than once is
stored once.
**/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EqualityProof {
    steps: Vec<ProofStep>,
}

impl std::ops::Index<ProofId> for EqualityProof {
    type Output = ProofStep;
    fn index(&self, id: ProofId) -> &ProofStep {
        &self.steps[usize::from(id)]
    }
}

impl EqualityProof {
    fn add(&mut self, step: ProofStep) -> ProofId {
        self.steps.push(step);
        ProofId::from(self.steps.len() - 1)
    }

    /// The steps, premises first.
    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    /// The number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always `false`, a proof has at least its conclusion.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The id of the concluding step.
    pub fn root_id(&self) -> ProofId {
        ProofId::from(self.steps.len() - 1)
    }

    /// The concluding step.
    pub fn root(&self) -> &ProofStep {
        &self[self.root_id()]
    }

    /// The two terms the step `id` proves equal.
    pub fn ends(&self, id: ProofId) -> (TermId, TermId) {
        match &self[id] {
            ProofStep::Refl(t) => (*t, *t),
            ProofStep::Asserted { lhs, rhs, .. } | ProofStep::Congruence { lhs, rhs, .. } => (*lhs, *rhs),
            ProofStep::Trans(chain) => {
                // chains are built from single edges, never from chains
                let first = self.ends(chain[0]).0;
                let last = self.ends(chain[chain.len() - 1]).1;
                (first, last)
            }
        }
    }

    /// Renders the proof as an s-expression such as
    /// `(cong (f x) (f y) (refl (f _)) (asserted p0 x y))`.
    pub fn to_sexp(&self, terms: &TermBank) -> Sexp {
        let atom = |s: &str| Sexp::String(s.to_string());
        let mut rendered: Vec<Sexp> = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let sexp = match step {
                ProofStep::Refl(t) => Sexp::List(vec![atom("refl"), terms.sexp(*t)]),
                ProofStep::Asserted { lhs, rhs, lit } => Sexp::List(vec![
                    atom("asserted"),
                    atom(&lit.to_string()),
                    terms.sexp(*lhs),
                    terms.sexp(*rhs),
                ]),
                ProofStep::Congruence { lhs, rhs, func, arg } => Sexp::List(vec![
                    atom("cong"),
                    terms.sexp(*lhs),
                    terms.sexp(*rhs),
                    rendered[usize::from(*func)].clone(),
                    rendered[usize::from(*arg)].clone(),
                ]),
                ProofStep::Trans(chain) => {
                    let mut list = vec![atom("trans")];
                    list.extend(chain.iter().map(|&id| rendered[usize::from(id)].clone()));
                    Sexp::List(list)
                }
            };
            rendered.push(sexp);
        }
        rendered.pop().unwrap_or_default()
    }

    /// Renders the proof, breaking lines longer than `width`.
    pub fn pretty(&self, terms: &TermBank, width: usize) -> String {
        let mut buf = String::new();
        pretty_print(&mut buf, &self.to_sexp(terms), width, 1).unwrap();
        buf
    }

    /// The asserted literals the proof uses, without duplicates.
    pub fn literals(&self) -> Vec<Lit> {
        let lits: IndexSet<Lit> = self
            .steps
            .iter()
            .filter_map(|step| match step {
                ProofStep::Asserted { lit, .. } => Some(*lit),
                _ => None,
            })
            .collect();
        lits.into_iter().collect()
    }
}

/// Pending work while building an [`EqualityProof`].
enum ProofWork {
    Goal(TermId, TermId),
    Step(ProofStep),
    Congruence(TermId, TermId),
    Chain(TermId, TermId, usize),
}

impl<B: Bridge> CongruenceClosure<B> {
    /// The edges on the path between `a` and `b` in their edge tree, as
    /// `(holder, edge)` pairs. The first part climbs from `a`, the second
    /// climbs from `b`.
    fn edges_between(&self, a: TermId, b: TermId) -> (Vec<(TermId, Edge)>, Vec<(TermId, Edge)>) {
        let pa = self.uf.path_to_root(a);
        let pb = self.uf.path_to_root(b);
        assert_eq!(pa.last(), pb.last(), "Explaining {} = {} across classes", a, b);
        let (mut i, mut j) = (pa.len(), pb.len());
        while i > 0 && j > 0 && pa[i - 1] == pb[j - 1] {
            i -= 1;
            j -= 1;
        }
        let edges = |path: &[TermId]| {
            path.iter()
                .filter_map(|&n| self.uf.edge(n).map(|e| (n, *e)))
                .collect()
        };
        (edges(&pa[..i]), edges(&pb[..j]))
    }

    fn push_parts(&self, p: TermId, q: TermId, todo: &mut Vec<(TermId, TermId)>) {
        let parts = self.terms.term(p).as_app().zip(self.terms.term(q).as_app());
        match parts {
            Some(((fp, ap), (fq, aq))) => {
                todo.push((ap, aq));
                todo.push((fp, fq));
            }
            None => panic!("Congruence edge between {} and {}, which are not both applications", p, q),
        }
    }

    /// Collects the asserted literals that make `a` and `b` equal.
    pub(crate) fn explain_into(&self, a: TermId, b: TermId, out: &mut IndexSet<Lit>) {
        let mut todo = vec![(a, b)];
        let mut seen: HashSet<TermId> = Default::default();
        while let Some((a, b)) = todo.pop() {
            if a == b {
                continue;
            }
            let (up, down) = self.edges_between(a, b);
            for (holder, edge) in up.into_iter().chain(down) {
                if !seen.insert(holder) {
                    continue;
                }
                match edge.reason {
                    Justification::Asserted(lit) => {
                        out.insert(lit);
                    }
                    Justification::Congruence => self.push_parts(holder, edge.to, &mut todo),
                }
            }
        }
    }

    fn explain_reason(&self, lhs: TermId, rhs: TermId, reason: Justification, out: &mut IndexSet<Lit>) {
        match reason {
            Justification::Asserted(lit) => {
                out.insert(lit);
            }
            Justification::Congruence => {
                let mut todo = vec![];
                self.push_parts(lhs, rhs, &mut todo);
                for (p, q) in todo.into_iter().rev() {
                    self.explain_into(p, q, out);
                }
            }
        }
    }

    /// Explains why the classes of `lhs` and `rhs` are separated by `diseq`.
    fn explain_separation(&self, lhs: TermId, rhs: TermId, diseq: Disequality, out: &mut IndexSet<Lit>) {
        if self.uf.find(lhs) == self.uf.find(diseq.lhs) {
            self.explain_into(lhs, diseq.lhs, out);
            self.explain_into(rhs, diseq.rhs, out);
        } else {
            self.explain_into(lhs, diseq.rhs, out);
            self.explain_into(rhs, diseq.lhs, out);
        }
        out.insert(diseq.reason);
    }

    /// Returns the asserted literals that make `a` and `b` equal, or `None`
    /// if they are not.
    pub fn explain_equality(&self, a: TermId, b: TermId) -> Option<Vec<Lit>> {
        if !self.are_equal(a, b) {
            return None;
        }
        let mut out = IndexSet::default();
        self.explain_into(a, b, &mut out);
        Some(out.into_iter().collect())
    }

    /// Returns the asserted literals that imply `propagation`.
    ///
    /// Only valid before the search backtracks past the call that produced
    /// the propagation.
    pub fn explain(&self, propagation: &Propagation) -> Vec<Lit> {
        let (lhs, rhs) = self.atom(propagation.lit.atom());
        let mut out = IndexSet::default();
        match propagation.cause {
            Cause::Merged => self.explain_into(lhs, rhs, &mut out),
            Cause::Separated(diseq) => self.explain_separation(lhs, rhs, diseq, &mut out),
        }
        out.into_iter().collect()
    }

    pub(crate) fn diseq_conflict(
        &self,
        lhs: TermId,
        rhs: TermId,
        reason: Justification,
        diseq: Disequality,
    ) -> Conflict {
        let mut out = IndexSet::default();
        self.explain_reason(lhs, rhs, reason, &mut out);
        self.explain_separation(lhs, rhs, diseq, &mut out);
        Conflict::new(out.into_iter().collect(), ConflictKind::Disequality(diseq))
    }

    /// `s1` is the shared term of the class of `lhs`, `s2` of the class of `rhs`.
    pub(crate) fn shared_conflict(
        &self,
        lhs: TermId,
        rhs: TermId,
        reason: Justification,
        s1: TermId,
        s2: TermId,
    ) -> Conflict {
        let mut out = IndexSet::default();
        self.explain_into(s1, lhs, &mut out);
        self.explain_reason(lhs, rhs, reason, &mut out);
        self.explain_into(rhs, s2, &mut out);
        Conflict::new(out.into_iter().collect(), ConflictKind::Shared { lhs: s1, rhs: s2 })
    }

    /// Builds a proof of `a = b` from the live equality edges, or `None` if
    /// they are not equal.
    pub fn proof(&self, a: TermId, b: TermId) -> Option<EqualityProof> {
        if !self.are_equal(a, b) {
            return None;
        }
        Some(self.prove(a, b))
    }

    /// Builds the proof with a work list. Finished sub-proofs wait on
    /// `done` until the step that uses them is built.
    fn prove(&self, a: TermId, b: TermId) -> EqualityProof {
        let mut proof = EqualityProof { steps: vec![] };
        let mut memo: HashMap<(TermId, TermId), ProofId> = Default::default();
        let mut done: Vec<ProofId> = vec![];
        let mut todo = vec![ProofWork::Goal(a, b)];
        while let Some(work) = todo.pop() {
            match work {
                ProofWork::Goal(a, b) => {
                    if let Some(&id) = memo.get(&(a, b)) {
                        done.push(id);
                    } else if a == b {
                        let id = proof.add(ProofStep::Refl(a));
                        memo.insert((a, b), id);
                        done.push(id);
                    } else {
                        let (up, down) = self.edges_between(a, b);
                        let steps: Vec<(TermId, TermId, Justification)> = up
                            .into_iter()
                            .map(|(holder, edge)| (holder, edge.to, edge.reason))
                            .chain(down.into_iter().rev().map(|(holder, edge)| (edge.to, holder, edge.reason)))
                            .collect();
                        todo.push(ProofWork::Chain(a, b, steps.len()));
                        for (from, to, reason) in steps.into_iter().rev() {
                            match reason {
                                Justification::Asserted(lit) => {
                                    todo.push(ProofWork::Step(ProofStep::Asserted { lhs: from, rhs: to, lit }))
                                }
                                Justification::Congruence => {
                                    todo.push(ProofWork::Congruence(from, to));
                                    // parts come argument first, so the function part is proved first
                                    let mut parts = vec![];
                                    self.push_parts(from, to, &mut parts);
                                    todo.extend(parts.into_iter().map(|(p, q)| ProofWork::Goal(p, q)));
                                }
                            }
                        }
                    }
                }
                ProofWork::Step(step) => done.push(proof.add(step)),
                ProofWork::Congruence(lhs, rhs) => {
                    let arg = done.pop().expect("argument proof");
                    let func = done.pop().expect("function proof");
                    done.push(proof.add(ProofStep::Congruence { lhs, rhs, func, arg }));
                }
                ProofWork::Chain(a, b, n) => {
                    assert!(n > 0 && done.len() >= n, "Broken edge path between {} and {}", a, b);
                    let id = if n == 1 {
                        done[done.len() - 1]
                    } else {
                        let chain = done.split_off(done.len() - n);
                        let id = proof.add(ProofStep::Trans(chain));
                        done.push(id);
                        id
                    };
                    memo.insert((a, b), id);
                }
            }
        }
        debug_assert_eq!(done, vec![proof.root_id()]);
        proof
    }
}
