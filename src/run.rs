use std::fmt;

use log::*;

use crate::util::{Duration, Instant};
use crate::*;

/** One call of the boolean search into the engine.

A [`Runner`] replays a script of these, which is how a search loop
(or a test) drives a [`CongruenceClosure`] without writing the loop by
hand.
**/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub enum Step {
    /// [`CongruenceClosure::push_level`]
    Push,
    /// [`CongruenceClosure::pop_levels`], followed by
    /// [`CongruenceClosure::propagate`].
    Pop(usize),
    /// [`CongruenceClosure::assert_literal`]
    Assert(Lit),
    /// [`CongruenceClosure::merge`]
    Merge(TermId, TermId, Lit),
    /// [`CongruenceClosure::separate`]
    Separate(TermId, TermId, Lit),
    /// [`CongruenceClosure::undo_external`]
    UndoExternal,
    /// [`CongruenceClosure::propagate`]
    Propagate,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Push => write!(f, "push"),
            Step::Pop(n) => write!(f, "pop {}", n),
            Step::Assert(lit) => write!(f, "assert {}", lit),
            Step::Merge(a, b, lit) => write!(f, "merge {} {} by {}", a, b, lit),
            Step::Separate(a, b, lit) => write!(f, "separate {} {} by {}", a, b, lit),
            Step::UndoExternal => write!(f, "undo"),
            Step::Propagate => write!(f, "propagate"),
        }
    }
}

/// Why a [`Runner`] stopped.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize))]
pub enum StopReason {
    /// Every step ran.
    Finished,
    /// A step returned a conflict, see [`Runner::conflict`].
    Conflict,
    /// The step limit was hit. The data is the step limit.
    StepLimit(usize),
    /// The time limit was hit. The data is the elapsed time in seconds.
    TimeLimit(f64),
    /// The stop flag of the engine was set.
    Interrupted,
}

/// Data generated by running one [`Step`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize))]
#[non_exhaustive]
pub struct StepReport {
    /// The step.
    pub step: Step,
    /// The decision level after the step.
    pub level: usize,
    /// The number of classes after the step.
    pub classes: usize,
    /// Merges committed by the step, congruences included.
    pub merges: usize,
    /// Literals implied by the step.
    pub propagations: usize,
    /// Triggers activated by the step.
    pub trigger_events: usize,
    /// Seconds spent in the step.
    pub time: f64,
}

type RunnerResult<T> = std::result::Result<T, StopReason>;

/** Replays a script of [`Step`]s against a [`CongruenceClosure`].

The runner stops at the first conflict, or when a limit is hit, and
records a [`StepReport`] for every step it ran. With
[`with_implied_propagation`](Runner::with_implied_propagation) it also
asserts every implied literal after each step, like a search loop that
does unit propagation through the theory.

```
use cclosure::*;

let mut cc = CongruenceClosure::new();
let x = cc.add_expr("x").unwrap();
let y = cc.add_expr("y").unwrap();
let fx = cc.add_expr("(f x)").unwrap();
let fy = cc.add_expr("(f y)").unwrap();
let xy = cc.add_atom(x, y).unwrap();
let f = cc.add_atom(fx, fy).unwrap();

let runner = Runner::default()
    .with_closure(cc)
    .with_step_limit(10)
    .run(vec![
        Step::Push,
        Step::Assert(Lit::neg(f)),
        Step::Assert(Lit::pos(xy)),
    ]);
assert_eq!(runner.stop_reason, Some(StopReason::Conflict));
let conflict = runner.conflict.as_ref().unwrap();
assert_eq!(conflict.literals().len(), 2);
```
**/
pub struct Runner<B = ()> {
    /// The engine.
    pub closure: CongruenceClosure<B>,
    /// One report per step run.
    pub reports: Vec<StepReport>,
    /// Why the runner stopped. `None` until it has.
    pub stop_reason: Option<StopReason>,
    /// The conflict that stopped the runner, if any.
    pub conflict: Option<Conflict>,
    /// Every literal implied along the way, in order.
    pub propagations: Vec<Propagation>,
    /// Every trigger activated along the way, in order.
    pub trigger_events: Vec<TriggerEvent>,

    // limits
    step_limit: usize,
    time_limit: Duration,
    assert_implied: bool,

    start_time: Option<Instant>,
}

impl Default for Runner<()> {
    fn default() -> Self {
        Runner::new(())
    }
}

impl<B: Bridge> Runner<B> {
    /// Creates a runner around an empty engine that uses `bridge`.
    pub fn new(bridge: B) -> Self {
        Self {
            step_limit: 100_000,
            time_limit: Duration::from_secs(5),
            assert_implied: false,

            closure: CongruenceClosure::with_bridge(bridge),
            reports: vec![],
            stop_reason: None,
            conflict: None,
            propagations: vec![],
            trigger_events: vec![],

            start_time: None,
        }
    }

    /// Sets the step limit. Default: 100,000
    pub fn with_step_limit(self, step_limit: usize) -> Self {
        Self { step_limit, ..self }
    }

    /// Sets the runner time limit. Default: 5 seconds
    pub fn with_time_limit(self, time_limit: Duration) -> Self {
        Self { time_limit, ..self }
    }

    /// Asserts every implied literal after each step. Default: off
    pub fn with_implied_propagation(self, assert_implied: bool) -> Self {
        Self {
            assert_implied,
            ..self
        }
    }

    /// Replaces the engine.
    pub fn with_closure(self, closure: CongruenceClosure<B>) -> Self {
        Self { closure, ..self }
    }

    /// Runs `steps` until they are exhausted or the runner stops.
    /// After this, [`stop_reason`](Runner::stop_reason) is set.
    pub fn run(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        for step in steps {
            if let Err(stop_reason) = self.check_limits().and_then(|()| self.run_one(step)) {
                self.stop(stop_reason);
                return self;
            }
        }
        self.stop(StopReason::Finished);
        self
    }

    fn stop(&mut self, stop_reason: StopReason) {
        info!("Stopping: {:?}", stop_reason);
        self.stop_reason = Some(stop_reason);
    }

    fn run_one(&mut self, step: Step) -> RunnerResult<()> {
        info!("Step {}: {}", self.reports.len(), step);
        let start_time = Instant::now();
        let before = self.closure.stats();
        let (n_props, n_events) = (self.propagations.len(), self.trigger_events.len());

        let cc = &mut self.closure;
        let result = match step {
            Step::Push => {
                cc.push_level();
                Ok(())
            }
            Step::Pop(n) => {
                cc.pop_levels(n);
                cc.propagate()
            }
            Step::Assert(lit) => cc.assert_literal(lit),
            Step::Merge(a, b, lit) => cc.merge(a, b, lit).map(|_| ()),
            Step::Separate(a, b, lit) => cc.separate(a, b, lit),
            Step::UndoExternal => {
                if !cc.undo_external() {
                    warn!("Nothing to undo");
                }
                Ok(())
            }
            Step::Propagate => cc.propagate(),
        };
        let result = result.and_then(|()| self.collect());

        let after = self.closure.stats();
        self.reports.push(StepReport {
            step,
            level: self.closure.level(),
            classes: self.closure.number_of_classes(),
            merges: after.merges - before.merges,
            propagations: self.propagations.len() - n_props,
            trigger_events: self.trigger_events.len() - n_events,
            time: start_time.elapsed().as_secs_f64(),
        });

        result.map_err(|conflict| {
            self.conflict = Some(conflict);
            StopReason::Conflict
        })
    }

    /// Takes the implied literals and trigger events, asserting the former
    /// if asked to.
    fn collect(&mut self) -> Result<(), Conflict> {
        loop {
            self.trigger_events
                .extend(self.closure.take_trigger_events());
            let implied = self.closure.take_propagations();
            if implied.is_empty() {
                return Ok(());
            }
            self.propagations.extend_from_slice(&implied);
            if !self.assert_implied {
                return Ok(());
            }
            for prop in implied {
                debug!("Asserting implied {}", prop.lit);
                self.closure.assert_literal(prop.lit)?;
            }
        }
    }

    fn check_limits(&mut self) -> RunnerResult<()> {
        let start_time = *self.start_time.get_or_insert_with(Instant::now);
        let elapsed = start_time.elapsed();
        if elapsed >= self.time_limit {
            return Err(StopReason::TimeLimit(elapsed.as_secs_f64()));
        }

        if self.reports.len() >= self.step_limit {
            return Err(StopReason::StepLimit(self.step_limit));
        }

        if self.closure.is_termination_requested() {
            return Err(StopReason::Interrupted);
        }

        Ok(())
    }

    #[rustfmt::skip]
    /// Prints some information about a runners run.
    pub fn print_report(&self) {
        let total_time: f64 = self.reports.iter().map(|r| r.time).sum();
        let steps = self.reports.len();
        let stats = self.closure.stats();

        println!("Runner report");
        println!("=============");
        println!("  Stop reason: {:?}", self.stop_reason);
        println!("  Steps: {}", steps);
        println!("  Engine size: {} terms, {} classes, {} atoms", self.closure.terms().len(), self.closure.number_of_classes(), self.closure.number_of_atoms());
        println!("  Merges: {} ({} by congruence), {} undone", stats.merges, stats.congruence_merges, stats.undone_merges);
        println!("  Congruence checks: {}, {:.2} per merge", stats.congruence_checks, (stats.congruence_checks as f64) / (stats.merges.max(1) as f64));
        println!("  Propagations: {}, trigger events: {}", self.propagations.len(), self.trigger_events.len());
        println!("  Conflicts: {}", stats.conflicts);
        println!("  Total time: {}", total_time);
    }
}
