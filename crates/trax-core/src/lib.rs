//! Core decision logic for TRAX report analysis: who the report is about,
//! when it was tested, what the model said, and how that flattens into
//! dashboard tables.

pub mod dashboard;
pub mod date;
pub mod identity;
pub mod record;
pub mod response;
pub mod sanitize;

pub use dashboard::{
    BushingRow, Dashboard, HealthRow, TanDeltaRow, TurnsRatioRow, WindingRow, flatten,
};
pub use date::{DateSource, DocumentDate, resolve_with_source};
pub use identity::resolve_identity;
pub use record::{StructuredRecord, first_present_key};
pub use response::{SplitError, SplitResponse, split_response};
pub use sanitize::{UNKNOWN_EQUIPMENT, sanitize};
