use cclosure::*;

/// Integer constants are distinct from each other, like an arithmetic
/// theory would decide.
struct Numerals;

impl Bridge for Numerals {
    fn are_distinct(&self, terms: &TermBank, a: TermId, b: TermId) -> bool {
        let value = |t: TermId| terms.get(t).ok()?.head().as_str().parse::<i64>().ok();
        matches!((value(a), value(b)), (Some(x), Some(y)) if x != y)
    }
}

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn distinct_shared_terms_conflict() {
    init();
    let mut cc = CongruenceClosure::with_bridge(Numerals);
    let one = cc.add_expr("1").unwrap();
    let two = cc.add_expr("2").unwrap();
    let x = cc.add_expr("x").unwrap();
    cc.mark_shared(one).unwrap();
    cc.mark_shared(two).unwrap();
    let x1 = Lit::pos(cc.add_atom(x, one).unwrap());
    let x2 = Lit::pos(cc.add_atom(x, two).unwrap());

    cc.push_level();
    cc.assert_literal(x1).unwrap();
    assert_eq!(cc.get_shared(x), Some(one));
    let conflict = cc.assert_literal(x2).unwrap_err();
    assert!(conflict.contains(x1) && conflict.contains(x2));
    assert_eq!(conflict.literals().len(), 2);
    match conflict.kind() {
        ConflictKind::Shared { lhs, rhs } => {
            let mut ends = [*lhs, *rhs];
            ends.sort();
            assert_eq!(ends, [one, two]);
        }
        kind => panic!("unexpected conflict {:?}", kind),
    }

    cc.pop_levels(1);
    assert_eq!(cc.get_shared(x), None);
    assert_eq!(cc.get_shared(one), Some(one));
    assert_eq!(cc.get_shared(two), Some(two));
}

#[test]
fn congruence_can_meet_shared_terms() {
    init();
    let mut cc = CongruenceClosure::with_bridge(Numerals);
    let fa = cc.add_expr("(f a)").unwrap();
    let fb = cc.add_expr("(f b)").unwrap();
    let one = cc.add_expr("1").unwrap();
    let two = cc.add_expr("2").unwrap();
    let a = cc.add_expr("a").unwrap();
    let b = cc.add_expr("b").unwrap();
    cc.mark_shared(one).unwrap();
    cc.mark_shared(two).unwrap();
    let p1 = Lit::pos(cc.add_atom(fa, one).unwrap());
    let p2 = Lit::pos(cc.add_atom(fb, two).unwrap());
    let ab = Lit::pos(cc.add_atom(a, b).unwrap());

    cc.assert_literal(p1).unwrap();
    cc.assert_literal(p2).unwrap();
    let conflict = cc.assert_literal(ab).unwrap_err();
    let mut lits = conflict.literals().to_vec();
    lits.sort();
    let mut expected = vec![p1, p2, ab];
    expected.sort();
    assert_eq!(lits, expected);
}

#[test]
fn merging_shared_classes_propagates_their_equality() {
    init();
    let mut cc = CongruenceClosure::new();
    let u = cc.add_expr("u").unwrap();
    let v = cc.add_expr("v").unwrap();
    let w = cc.add_expr("w").unwrap();
    cc.mark_shared(u).unwrap();
    cc.mark_shared(v).unwrap();
    let uw = cc.add_atom(u, w).unwrap();
    let wv = cc.add_atom(w, v).unwrap();
    assert_eq!(cc.number_of_atoms(), 2);

    cc.push_level();
    cc.assert_literal(Lit::pos(uw)).unwrap();
    cc.assert_literal(Lit::pos(wv)).unwrap();
    assert_eq!(cc.number_of_atoms(), 3);
    let uv = cc.add_atom(u, v).unwrap();
    let implied = cc.take_propagations();
    assert!(implied.iter().any(|p| p.lit == Lit::pos(uv)), "{:?}", implied);
    assert_eq!(cc.explain(&implied[implied.len() - 1]).len(), 2);
    assert!(cc.class(w).shared().is_some());

    // the new atom outlives the level and is found again
    cc.pop_levels(1);
    assert_eq!(cc.value(uv), None);
    cc.push_level();
    cc.assert_literal(Lit::pos(uw)).unwrap();
    cc.take_propagations();
    cc.assert_literal(Lit::pos(wv)).unwrap();
    let implied = cc.take_propagations();
    assert!(implied.iter().any(|p| p.lit == Lit::pos(uv)), "{:?}", implied);
    assert_eq!(cc.number_of_atoms(), 3);
    cc.check_invariants();
}

#[test]
fn undoing_merges_takes_back_shared_equalities() {
    init();
    let mut cc = CongruenceClosure::new();
    let a = cc.add_expr("a").unwrap();
    let b = cc.add_expr("b").unwrap();
    let c = cc.add_expr("c").unwrap();
    cc.mark_shared(a).unwrap();
    cc.mark_shared(b).unwrap();
    let ac = Lit::pos(cc.add_atom(a, c).unwrap());
    let cb = Lit::pos(cc.add_atom(c, b).unwrap());
    let before = cc.dump();

    cc.merge(a, c, ac).unwrap();
    let after_first = cc.dump();
    cc.merge(c, b, cb).unwrap();
    // the bridge equality between the two shared terms is a new atom
    assert_eq!(cc.number_of_atoms(), 3);
    let implied = cc.take_propagations();
    let shared_eq = implied[implied.len() - 1].lit;
    let (lhs, rhs) = cc.atom(shared_eq.atom());
    assert!((lhs, rhs) == (a, b) || (lhs, rhs) == (b, a));

    cc.undo_merge(b);
    assert!(cc.are_equal(a, c));
    assert!(!cc.are_equal(c, b));
    assert_eq!(cc.get_shared(c), Some(a));
    assert_eq!(cc.get_shared(b), Some(b));
    let now = cc.dump();
    assert_eq!(now.reps, after_first.reps);
    assert_eq!(now.classes, after_first.classes);
    assert_eq!(now.shared, after_first.shared);
    cc.check_invariants();

    cc.undo_merge(c);
    assert!(!cc.are_equal(a, c));
    assert_eq!(cc.merge_depth(), 0);
    cc.check_invariants();
    // the atom outlives the merges; the classes are as before
    let now = cc.dump();
    assert_eq!(now.reps, before.reps);
    assert_eq!(now.classes, before.classes);
    assert_eq!(now.parents, before.parents);
    assert_eq!(now.shared, before.shared);
    assert!(now.assignments.iter().all(Option::is_none));

    // merging again implies the equality of the shared terms again
    cc.merge(a, c, ac).unwrap();
    cc.merge(c, b, cb).unwrap();
    assert!(cc.take_propagations().iter().any(|p| p.lit == shared_eq));
    assert_eq!(cc.number_of_atoms(), 3);
}
