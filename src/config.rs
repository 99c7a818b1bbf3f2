use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reads and parses an environment variable, `None` if it is unset.
fn var<T>(s: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Debug,
{
    use std::env::VarError;
    match std::env::var(s) {
        Err(VarError::NotPresent) => None,
        Err(VarError::NotUnicode(_)) => panic!("Environment variable {} isn't unicode", s),
        Ok(v) => match v.parse() {
            Ok(v) => Some(v),
            Err(err) => panic!("Couldn't parse environment variable {}={}, {:?}", s, v, err),
        },
    }
}

/// A flag the search sets to ask for termination.
///
/// Clones share the flag, so a handle can be given to another thread (a
/// timeout watchdog, a signal handler) while the engine keeps its own.
/// The engine never stops by itself: the search polls
/// [`CongruenceClosure::is_termination_requested`](crate::CongruenceClosure::is_termination_requested)
/// between top-level calls.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// A fresh, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks every holder of this flag to stop.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Relaxed)
    }

    /// Returns `true` once [`request_stop`](StopHandle::request_stop) was called.
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clears the flag.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed)
    }
}

/** Settings of a [`CongruenceClosure`](crate::CongruenceClosure).

Set them with the `with_*` builder methods:
```
use cclosure::*;

let stop = StopHandle::new();
let cc = CongruenceClosure::new().with_config(
    Config::default()
        .with_expensive_checks(true)
        .with_stop_handle(stop.clone()),
);
stop.request_stop();
assert!(cc.is_termination_requested());
```
**/
#[derive(Clone, Debug)]
pub struct Config {
    expensive_checks: bool,
    stop: StopHandle,
}

impl Default for Config {
    /// Expensive checks are on in debug builds, unless the
    /// `CCLOSURE_EXPENSIVE_CHECKS` environment variable says otherwise.
    fn default() -> Self {
        Config {
            expensive_checks: var("CCLOSURE_EXPENSIVE_CHECKS").unwrap_or(cfg!(debug_assertions)),
            stop: StopHandle::default(),
        }
    }
}

impl Config {
    /// Runs [`check_invariants`](crate::CongruenceClosure::check_invariants)
    /// after every merge, separation and backtrack. This costs time linear
    /// in the number of terms per call.
    pub fn with_expensive_checks(self, expensive_checks: bool) -> Self {
        Self {
            expensive_checks,
            ..self
        }
    }

    /// Uses `stop` as the stop flag.
    pub fn with_stop_handle(self, stop: StopHandle) -> Self {
        Self { stop, ..self }
    }

    /// Whether invariants are checked after every call.
    pub fn expensive_checks(&self) -> bool {
        self.expensive_checks
    }

    /// The stop flag.
    pub fn stop_handle(&self) -> &StopHandle {
        &self.stop
    }
}
