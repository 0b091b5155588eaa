pub mod config;
pub mod file_host;
pub mod host;
pub mod runner;

pub use config::{ConfigLoader, PagetapConfig};
pub use file_host::FileHost;
pub use host::{Host, HostError, NavigationResult};
pub use runner::{RunnerError, inspect, now_ms, pump};

pub use pagetap_common::formatter;
pub use pagetap_common::protocol;
pub use pagetap_core::instrument::{InstrumentConfig, Instrumentation};
