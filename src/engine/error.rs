use chrono::NaiveDate;

use crate::source::SourceError;

#[derive(Debug)]
pub enum SearchError {
    /// A request date was supplied but could not be read.
    MalformedDate {
        field: &'static str,
        raw: String,
    },
    /// Check-out on or before check-in.
    InvalidWindow {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    LimitExceeded(&'static str),
    Source(SourceError),
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::MalformedDate { field, raw } => {
                write!(f, "malformed {field}: {raw:?}")
            }
            SearchError::InvalidWindow {
                check_in,
                check_out,
            } => {
                write!(
                    f,
                    "check-out {check_out} must be after check-in {check_in}"
                )
            }
            SearchError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            SearchError::Source(e) => write!(f, "listing source: {e}"),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SearchError::Source(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SourceError> for SearchError {
    fn from(e: SourceError) -> Self {
        SearchError::Source(e)
    }
}
