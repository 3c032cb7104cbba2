//! Backing servers: descriptors, readiness selection, topology and launching

pub mod launcher;
pub mod readiness;
pub mod spec;
pub mod topology;

pub use launcher::{Launcher, RunningServers};
pub use spec::{ReadinessMode, ServerSpec};
