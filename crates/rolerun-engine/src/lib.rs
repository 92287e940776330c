//! Execution engine for rolerun
//!
//! Drives a single agent run: the [`executor`] streams one generation
//! attempt to the [`console`] sinks, the [`retry`] controller repeats it with
//! backoff, and [`run`] ties client construction, role and context loading,
//! and the retry loop together.

pub mod console;
pub mod executor;
pub mod retry;
pub mod run;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use console::Console;
pub use executor::{Fault, Outcome, StreamAccumulator, execute_once};
pub use retry::{
    Attempt, Interrupted, MAX_RETRIES, RETRY_DELAY_BASE, RetryPolicy, Sleeper, TokioSleeper,
    run_with_retry,
};
pub use run::{RunRequest, RunStatus, run_agent, run_agent_with};
