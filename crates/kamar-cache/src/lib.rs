//! Cache layer for portal data.
//!
//! Owns the on-disk artifacts: raw XML responses cached verbatim and the
//! derived JSON schedule artifacts, plus the fetch-or-load policy that
//! decides when cached data is reused versus refetched.

/// Raw-XML to parsed-JSON pipeline operations.
pub mod pipeline;
/// Cache store and freshness policy.
pub mod store;

pub use pipeline::{convert_calendar, convert_timetable, load_calendar, load_timetable};
#[allow(clippy::module_name_repetitions)]
pub use store::{CacheKind, CacheStore};
