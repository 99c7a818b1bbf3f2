#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
/*!

`cclosure` is a backtracking congruence closure engine, the equality core
of a DPLL(T) SMT solver.

It keeps equivalence classes of ground terms, closes them under function
congruence, detects conflicts against asserted disequalities, and undoes
every merge exactly, in LIFO order, when the boolean search backtracks.

The main entry point is [`CongruenceClosure`].
Terms are built through it (or its [`TermBank`]), equality atoms are
registered with [`CongruenceClosure::add_atom`], and the boolean search
drives it with [`assert_literal`](CongruenceClosure::assert_literal),
[`push_level`](CongruenceClosure::push_level) and
[`pop_levels`](CongruenceClosure::pop_levels).
Implied literals come back through
[`take_propagations`](CongruenceClosure::take_propagations), conflicts come
back as [`Conflict`] values.

## Simple Example
```
use cclosure::*;

let mut cc = CongruenceClosure::new();
let x = cc.add_expr("x").unwrap();
let y = cc.add_expr("y").unwrap();
let fx = cc.add_expr("(f x)").unwrap();
let fy = cc.add_expr("(f y)").unwrap();
let x_eq_y = cc.add_atom(x, y).unwrap();

cc.push_level();
cc.assert_literal(Lit::pos(x_eq_y)).unwrap();
assert!(cc.are_equal(fx, fy));

cc.pop_levels(1);
assert!(!cc.are_equal(fx, fy));
```

## Logging

The engine reports merges, undos and propagations through the
[`log`](https://docs.rs/log/) crate.
The easiest way to see this info is to use the
[`env_logger`](https://docs.rs/env_logger/) crate in your binary or test,
put `env_logger::init();` near the top of your `main`, and set the
environment variable `RUST_LOG=cclosure=debug` (or `trace` for every
congruence check).

*/

mod closure;
mod config;
mod dot;
mod eclass;
mod explain;
mod lit;
mod merge;
mod pairs;
mod parents;
mod run;
mod semi_persistent;
mod shared;
mod term;
mod unionfind;
mod util;

/// A handle to an interned term node.
///
/// Handles are dense indices into the [`TermBank`] of one solving
/// context and stay valid for the lifetime of that context.
#[derive(Clone, Copy, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-1", serde(transparent))]
pub struct TermId(u32);

impl From<usize> for TermId {
    fn from(n: usize) -> TermId {
        TermId(n as u32)
    }
}

impl From<TermId> for usize {
    fn from(id: TermId) -> usize {
        id.0 as usize
    }
}

impl std::fmt::Debug for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl std::fmt::Display for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

pub(crate) use {pairs::PairIndex, parents::ParentIndex, unionfind::UnionFind};

pub use {
    closure::{CongruenceClosure, Dump, DumpPair, DumpParents, Stats, TriggerEvent, TriggerId},
    config::{Config, StopHandle},
    dot::Dot,
    eclass::EClass,
    explain::{Conflict, ConflictKind, EqualityProof, ProofId, ProofStep},
    lit::{AtomId, Lit},
    pairs::Disequality,
    run::*,
    shared::Bridge,
    term::{FuncKey, Term, TermBank, TermError, TermKind},
    unionfind::Justification,
    util::Symbol,
};

pub use closure::{Cause, Propagation};

#[cfg(test)]
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
