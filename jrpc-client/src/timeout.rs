//! Per-call expiry settings

use std::time::Duration;

/// How long a call may stay pending before it is rejected with a timeout error
///
/// ```rust
/// use jrpc_client::Timeout;
/// use std::time::Duration;
///
/// assert_eq!(Timeout::from_millis(-1), Timeout::Never);
/// assert_eq!(Timeout::from_millis(250), Timeout::After(Duration::from_millis(250)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// The call waits until a response arrives or the client is cancelled
    Never,
    /// The call is rejected once this much time has passed; zero rejects at once
    After(Duration),
}

impl Timeout {
    /// Build from a millisecond count; negative values disable expiry
    pub fn from_millis(ms: i64) -> Self {
        match u64::try_from(ms) {
            Ok(ms) => Timeout::After(Duration::from_millis(ms)),
            Err(_) => Timeout::Never,
        }
    }

    /// True for a zero duration
    pub fn is_immediate(&self) -> bool {
        matches!(self, Timeout::After(d) if d.is_zero())
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Timeout::After(Duration::from_millis(jrpc_core::DEFAULT_TIMEOUT_MS))
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Timeout::After(duration)
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(duration: Option<Duration>) -> Self {
        duration.map_or(Timeout::Never, Timeout::After)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_ten_seconds() {
        assert_eq!(Timeout::default(), Timeout::After(Duration::from_secs(10)));
    }

    #[test]
    fn test_from_millis() {
        assert_eq!(Timeout::from_millis(-500), Timeout::Never);
        assert_eq!(Timeout::from_millis(0), Timeout::After(Duration::ZERO));
        assert!(Timeout::from_millis(0).is_immediate());
        assert!(!Timeout::from_millis(1).is_immediate());
        assert!(!Timeout::Never.is_immediate());
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Timeout::from(None), Timeout::Never);
        assert_eq!(
            Timeout::from(Some(Duration::from_secs(1))),
            Timeout::After(Duration::from_secs(1))
        );
    }
}
