//! Logging is delegated to a host collaborator interface rather than a
//! logging-facade dependency: `Debug` impls and `println!` do the job for
//! this crate's own diagnostics. `JoinLogger` is the seam a real host plugs
//! its own logger into; [`PrintlnLogger`] is the one used by the demo CLI.

use crate::stats::JoinStats;
use config::Algorithm;

pub trait JoinLogger {
    fn algorithm_chosen(&self, _algorithm: Algorithm, _left_estimate: u64, _right_estimate: u64) {}
    fn phase(&self, _message: &str) {}
    fn finished(&self, _stats: &JoinStats) {}
}

/// No-op logger, used wherever a caller doesn't care (e.g. unit tests).
#[derive(Default)]
pub struct NullLogger;
impl JoinLogger for NullLogger {}

/// Prints each phase and the final stats summary to stdout.
#[derive(Default)]
pub struct PrintlnLogger;

impl JoinLogger for PrintlnLogger {
    fn algorithm_chosen(&self, algorithm: Algorithm, left_estimate: u64, right_estimate: u64) {
        println!("[join] algorithm = {algorithm:?} (left~{left_estimate}B, right~{right_estimate}B)");
    }

    fn phase(&self, message: &str) {
        println!("[join] {message}");
    }

    fn finished(&self, stats: &JoinStats) {
        println!("[join] done: {stats:?}");
    }
}
