//! Configuration for rolerun
//!
//! All process-environment lookups happen here, once, at startup. The
//! resulting [`RunnerConfig`] is passed by reference into every component,
//! so nothing downstream reads ambient process state and tests can inject a
//! fully deterministic configuration.

mod builder;
mod env;
mod model;

pub use builder::RunnerConfigBuilder;
pub use env::{EnvSource, ProcessEnv};
pub use model::*;
