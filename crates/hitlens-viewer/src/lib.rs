//! Viewer layer: citation bus, highlight controller, and record presenter.

pub mod bus;
pub mod config;
pub mod highlight;
pub mod presenter;
pub mod viewer;

pub use bus::{CitationBus, CitationSubscription};
pub use config::{DEFAULT_HIGHLIGHT_TTL, ViewerConfig};
pub use highlight::{Activation, ExpiryHandle, Highlight, HighlightController, HighlightSet, ScrollState};
pub use presenter::{FieldLine, Presented, RawLine, ViewState, find_ignore_case, present};
pub use viewer::{Frame, RecordViewer, Surface};
