use std::{error::Error, fmt, time::Duration};

/// The status module's result type.
pub type Result<T> = std::result::Result<T, StatusErr>;

/// Status-side failures worth surfacing to a caller.
///
/// The protocol itself absorbs and logs its failures (stale channels,
/// disconnected peers, malformed numerics); these variants cover
/// construction-time mistakes only.
#[derive(Debug)]
pub enum StatusErr {
    /// The configured display window is outside the supported range.
    InvalidResetDelay { got: Duration },
}

impl fmt::Display for StatusErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusErr::InvalidResetDelay { got } => {
                write!(
                    f,
                    "invalid reset delay {got:?}: must be between 2 and 5 seconds"
                )
            }
        }
    }
}

impl Error for StatusErr {}
