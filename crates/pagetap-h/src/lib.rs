pub mod cdp;
pub mod host;

pub use host::CdpHost;
