use cclosure::*;
use proptest::prelude::*;

/// A small signature with plenty of overlapping subterms.
const TERMS: &[&str] = &[
    "a",
    "b",
    "c",
    "d",
    "(f a)",
    "(f b)",
    "(f c)",
    "(f (f a))",
    "(f (f d))",
    "(g a b)",
    "(g b a)",
    "(g c (f a))",
    "(g d (f b))",
    "(g (f a) (f b))",
];

fn setup() -> (CongruenceClosure, Vec<TermId>, Vec<AtomId>) {
    let mut cc = CongruenceClosure::new().with_config(Config::default().with_expensive_checks(true));
    let ids: Vec<TermId> = TERMS.iter().map(|t| cc.add_expr(t).unwrap()).collect();
    let mut atoms = vec![];
    for (i, &s) in ids.iter().enumerate() {
        for &t in &ids[i + 1..] {
            atoms.push(cc.add_atom(s, t).unwrap());
        }
    }
    cc.take_propagations();
    (cc, ids, atoms)
}

#[derive(Clone, Debug)]
enum Op {
    Push,
    Pop,
    Assert(usize, bool),
    Share(usize),
    Compare(usize, usize),
    Reverse(usize, usize),
}

impl Op {
    /// Changes that outlive backtracking, as opposed to search steps.
    fn is_permanent(&self) -> bool {
        matches!(self, Op::Share(_) | Op::Compare(..) | Op::Reverse(..))
    }
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Push),
        2 => Just(Op::Pop),
        8 => (0usize..1000, any::<bool>()).prop_map(|(i, b)| Op::Assert(i, b)),
        1 => (0..TERMS.len()).prop_map(Op::Share),
        1 => (0..TERMS.len(), 0..TERMS.len()).prop_map(|(i, j)| Op::Compare(i, j)),
        1 => (0..TERMS.len(), 0usize..2).prop_map(|(i, pos)| Op::Reverse(i, pos)),
    ]
}

/// Runs a change that outlives backtracking.
fn apply_permanent(cc: &mut CongruenceClosure, ids: &[TermId], op: &Op) {
    match *op {
        Op::Share(i) => cc.mark_shared(ids[i]).unwrap(),
        Op::Compare(i, j) => {
            cc.add_compare_trigger(ids[i], ids[j]);
        }
        Op::Reverse(i, pos) => {
            cc.add_reverse_trigger("g", pos, ids[i]).unwrap();
        }
        _ => unreachable!(),
    }
}

fn check_congruence(cc: &CongruenceClosure, ids: &[TermId]) {
    for &s in ids {
        for &t in ids {
            let (ps, pt) = (cc.terms().get(s).unwrap(), cc.terms().get(t).unwrap());
            if let (Some((fs, xs)), Some((ft, xt))) = (ps.as_app(), pt.as_app()) {
                if cc.are_equal(fs, ft) && cc.are_equal(xs, xt) {
                    assert!(cc.are_equal(s, t), "{} and {} are congruent but not equal", s, t);
                }
            }
        }
    }
}

fn check_transitivity(cc: &CongruenceClosure, ids: &[TermId]) {
    for &a in ids {
        for &b in ids {
            for &c in ids {
                if cc.are_equal(a, b) && cc.are_equal(b, c) {
                    assert!(cc.are_equal(a, c));
                }
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Random search-like sequences keep the engine closed, and popping
    /// everything restores the state of an engine that only saw the
    /// shared markers and triggers.
    #[test]
    fn search_round_trip(ops in prop::collection::vec(op(), 1..40)) {
        let (mut cc, ids, atoms) = setup();
        let all: Vec<TermId> = cc.terms().ids().collect();
        let (mut reference, _, _) = setup();
        for op in ops.iter().filter(|op| op.is_permanent()) {
            apply_permanent(&mut reference, &ids, op);
        }

        for op in ops {
            match op {
                Op::Share(..) | Op::Compare(..) | Op::Reverse(..) => apply_permanent(&mut cc, &ids, &op),
                Op::Push => cc.push_level(),
                Op::Pop => {
                    if cc.level() > 0 {
                        cc.pop_levels(1);
                        cc.propagate().unwrap();
                    }
                }
                Op::Assert(i, positive) => {
                    let lit = Lit::new(atoms[i % atoms.len()], positive);
                    cc.push_level();
                    if let Err(conflict) = cc.assert_literal(lit) {
                        // apart from the one being asserted, every literal
                        // of a conflict is currently assigned
                        let asserted: Vec<Lit> = cc.assigned_literals().collect();
                        for &l in conflict.literals().iter().filter(|&&l| l != lit) {
                            prop_assert!(asserted.contains(&l), "{}", conflict);
                        }
                        cc.pop_levels(1);
                    }
                }
            }
            cc.check_invariants();
            check_congruence(&cc, &all);
            check_transitivity(&cc, &ids);
        }

        cc.backtrack_to(0);
        prop_assert_eq!(cc.dump(), reference.dump());
    }

    /// Undoing external merges one at a time mirrors them exactly.
    #[test]
    fn merge_undo_round_trip(pairs in prop::collection::vec((0..TERMS.len(), 0..TERMS.len()), 1..12)) {
        let (mut cc, ids, _) = setup();
        let mut snapshots = vec![];
        for (k, &(i, j)) in pairs.iter().enumerate() {
            let reason = Lit::pos(AtomId::from(k));
            let before = cc.dump();
            if cc.merge(ids[i], ids[j], reason) == Ok(true) {
                snapshots.push(before);
                prop_assert!(cc.are_equal(ids[i], ids[j]));
            }
        }
        while let Some(before) = snapshots.pop() {
            prop_assert!(cc.undo_external());
            prop_assert_eq!(cc.dump(), before);
        }
        prop_assert!(!cc.undo_external());
        prop_assert_eq!(cc.merge_depth(), 0);
    }

    /// Undoing merges one at a time with `undo_merge`, newest first, walks
    /// back through the states before every merging assertion.
    #[test]
    fn undo_merge_round_trip(
        shared in prop::collection::vec(0..TERMS.len(), 0..4),
        lits in prop::collection::vec((0usize..1000, any::<bool>()), 1..16),
    ) {
        let (mut cc, ids, atoms) = setup();
        for i in shared {
            cc.mark_shared(ids[i]).unwrap();
        }
        let mut snapshots = vec![];
        for (i, positive) in lits {
            let lit = Lit::new(atoms[i % atoms.len()], positive);
            let depth = cc.merge_depth();
            let before = cc.dump();
            let result = cc.assert_literal(lit);
            if cc.merge_depth() > depth {
                snapshots.push((depth, before));
            }
            if result.is_err() {
                break;
            }
        }

        while let Some((lhs, rhs)) = cc.last_merge() {
            cc.undo_merge(if lhs < rhs { lhs } else { rhs });
            cc.check_invariants();
            if snapshots.last().map_or(false, |(depth, _)| *depth == cc.merge_depth()) {
                let (_, before) = snapshots.pop().unwrap();
                prop_assert_eq!(cc.dump(), before);
            }
        }
        prop_assert!(snapshots.is_empty());
    }

    /// Asserting implied literals never conflicts and changes nothing.
    #[test]
    fn implied_literals_are_consistent(lits in prop::collection::vec((0usize..1000, any::<bool>()), 1..10)) {
        let (mut cc, _, atoms) = setup();
        for (i, positive) in lits {
            cc.push_level();
            let lit = Lit::new(atoms[i % atoms.len()], positive);
            if cc.assert_literal(lit).is_err() {
                cc.pop_levels(1);
                continue;
            }
            for prop in cc.take_propagations() {
                let explanation = cc.explain(&prop);
                for &l in &explanation {
                    prop_assert_eq!(cc.value(l.atom()), Some(l.is_positive()));
                }
                let dump = cc.dump();
                cc.push_level();
                prop_assert!(cc.assert_literal(prop.lit).is_ok());
                let (lhs, rhs) = cc.atom(prop.lit.atom());
                prop_assert_eq!(cc.are_equal(lhs, rhs), prop.lit.is_positive());
                cc.pop_levels(1);
                prop_assert_eq!(cc.dump(), dump);
            }
        }
    }
}
