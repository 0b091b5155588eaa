pub mod dom;
pub mod events;
pub mod framework;
pub mod instrument;
pub mod locator;
pub mod page;
pub mod recorder;
pub mod report;
pub mod selector;
pub mod session;
pub mod tap;

pub use dom::{Dom, ElementNode, NodeId};
pub use events::{DomEvent, DomEventKind, PageEvent};
pub use instrument::{InstrumentConfig, Instrumentation};
pub use page::Page;
pub use report::build_report;
pub use selector::SimpleSelector;
pub use session::{SessionConfig, SessionController, SessionState};
pub use tap::{ConsoleCapture, RuntimeTap, TapConfig};
