//! Portal error taxonomy.
//!
//! Error values carry kind and context only; formatting for the user
//! happens at the CLI boundary.

use thiserror::Error;

/// A remote resource served by the portal API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Weekly timetable grid (`GetStudentTimetable`).
    Timetable,
    /// Period start times (`GetGlobals`).
    Periods,
    /// School calendar (`GetCalendar`).
    Calendar,
}

impl Resource {
    /// Lowercase display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timetable => "timetable",
            Self::Periods => "periods",
            Self::Calendar => "calendar",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by the portal client and the schedule parsers.
///
/// All variants are terminal for the current command; nothing is retried
/// internally.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Login was rejected or the auth response carried no session key.
    #[error("login rejected by the portal: {0}")]
    Authentication(String),

    /// A resource fetch returned a non-success HTTP status.
    #[error("failed to fetch {0} (HTTP {1})")]
    Fetch(Resource, u16),

    /// An expected XML substructure was absent from a response.
    #[error("expected element `{0}` is missing from the response")]
    MissingData(String),

    /// A degenerate day or week was encountered while parsing.
    #[error("malformed schedule data: {0}")]
    MalformedSchedule(String),
}
