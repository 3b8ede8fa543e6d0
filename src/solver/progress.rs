//! Iteration table written through the `log` facade.
//!
//! With `verbose` the table is logged at `info`, otherwise at `debug`.
//! Failure to converge is always logged at `warn`.
use crate::solver::outcome::{SolveMethod, SolveOutcome};
use log::Level;
use std::time::Instant;

pub(crate) struct Progress {
    level: Level,
    start: Instant,
}

impl Progress {
    pub(crate) fn start(method: SolveMethod, verbose: bool) -> Self {
        let level = if verbose { Level::Info } else { Level::Debug };
        log::log!(level, "Solving by {method}");
        log::log!(level, "{:>6} {:>14} {:>12}", "iter", "change", "time (s)");
        log::log!(level, "{}", "-".repeat(34));
        Progress { level, start: Instant::now() }
    }

    pub(crate) fn iteration(&self, it: usize, change: f64) {
        log::log!(
            self.level,
            "{:>6} {:>14.3e} {:>12.4}",
            it,
            change,
            self.start.elapsed().as_secs_f64()
        );
    }

    pub(crate) fn period(&self, t: usize) {
        log::log!(self.level, "{:>6} {:>14} {:>12.4}", t, "-", self.start.elapsed().as_secs_f64());
    }

    pub(crate) fn finish(
        &self, method: SolveMethod, converged: bool, it: usize, change: f64,
    ) -> SolveOutcome {
        let outcome = SolveOutcome::new(method, converged, it, change, self.start.elapsed());
        if converged {
            log::log!(self.level, "{}: {}", method, outcome.status);
        } else {
            log::warn!("{}: {}", method, outcome.status);
        }
        outcome
    }
}
