use cclosure::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn compare_triggers_fire_on_merge() {
    init();
    let mut cc = CongruenceClosure::new();
    let a = cc.add_expr("a").unwrap();
    let b = cc.add_expr("b").unwrap();
    let c = cc.add_expr("c").unwrap();
    let trigger = cc.add_compare_trigger(a, c);
    let ab = cc.add_atom(a, b).unwrap();
    let bc = cc.add_atom(b, c).unwrap();
    assert!(cc.take_trigger_events().is_empty());

    cc.push_level();
    cc.assert_literal(Lit::pos(ab)).unwrap();
    assert!(cc.take_trigger_events().is_empty());
    cc.assert_literal(Lit::pos(bc)).unwrap();
    assert_eq!(
        cc.take_trigger_events(),
        vec![TriggerEvent::Compare {
            trigger,
            lhs: a,
            rhs: c
        }]
    );

    // the trigger is waiting again after backtracking
    cc.pop_levels(1);
    cc.push_level();
    cc.assert_literal(Lit::pos(bc)).unwrap();
    cc.assert_literal(Lit::pos(ab)).unwrap();
    assert_eq!(cc.take_trigger_events().len(), 1);
}

#[test]
fn compare_triggers_on_equal_terms_fire_at_once() {
    let mut cc = CongruenceClosure::new();
    let x = cc.add_expr("x").unwrap();
    let trigger = cc.add_compare_trigger(x, x);
    assert_eq!(
        cc.take_trigger_events(),
        vec![TriggerEvent::Compare {
            trigger,
            lhs: x,
            rhs: x
        }]
    );
}

#[test]
fn reverse_triggers_watch_argument_classes() {
    init();
    let mut cc = CongruenceClosure::new();
    let fab = cc.add_expr("(f a b)").unwrap();
    let fcb = cc.add_expr("(f c b)").unwrap();
    let a = cc.add_expr("a").unwrap();
    let b = cc.add_expr("b").unwrap();
    let d = cc.add_expr("d").unwrap();
    let ad = cc.add_atom(a, d).unwrap();

    let first = cc.add_reverse_trigger("f", 0, d).unwrap();
    assert!(cc.take_trigger_events().is_empty());

    let second = cc.add_reverse_trigger("f", 1, b).unwrap();
    let mut apps: Vec<TermId> = cc
        .take_trigger_events()
        .into_iter()
        .map(|event| match event {
            TriggerEvent::Reverse { trigger, app } => {
                assert_eq!(trigger, second);
                app
            }
            event => panic!("unexpected event {:?}", event),
        })
        .collect();
    apps.sort();
    assert_eq!(apps, vec![fab, fcb]);

    cc.push_level();
    cc.assert_literal(Lit::pos(ad)).unwrap();
    assert_eq!(
        cc.take_trigger_events(),
        vec![TriggerEvent::Reverse {
            trigger: first,
            app: fab
        }]
    );

    // new applications meet the trigger when they are built
    let fde = cc.add_expr("(f d e)").unwrap();
    assert_eq!(
        cc.take_trigger_events(),
        vec![TriggerEvent::Reverse {
            trigger: first,
            app: fde
        }]
    );
    cc.pop_levels(1);
    cc.propagate().unwrap();
    cc.check_invariants();
}

#[test]
fn reverse_triggers_need_a_real_position() {
    let mut cc = CongruenceClosure::new();
    let d = cc.add_expr("d").unwrap();
    cc.add_expr("(f d d)").unwrap();
    assert_eq!(
        cc.add_reverse_trigger("f", 2, d),
        Err(TermError::BadPosition {
            name: "f".into(),
            position: 2
        })
    );
    assert_eq!(
        cc.add_reverse_trigger("g", 0, d),
        Err(TermError::UnknownFunction("g".into()))
    );
}
