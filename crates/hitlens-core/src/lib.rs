pub mod case;
pub mod citation;
pub mod record;
pub mod section;
pub mod verdict;

pub use citation::{AnalysisView, CitationEvent, CitationSink, CitationSpan, ClaimView, Segment};
pub use record::{KeyValue, LineRange, SegmentedRecord, display_text, split_key_value};
pub use section::{Section, SectionError};
pub use verdict::{AspectStatus, AspectVerdict, aspect_verdict};
