use thiserror::Error;

/// All errors generated while ingesting lending market snapshots.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("failed to parse snapshot message: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid market record {symbol}: {reason}")]
    InvalidRecord { symbol: String, reason: String },

    #[error("SocketError: {0}")]
    Socket(String),
}

impl DashboardError {
    /// Determine if an error means the current snapshot must be discarded while the feed stays up.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_recoverable(&self) -> bool {
        match self {
            DashboardError::Parse(_) | DashboardError::InvalidRecord { .. } => true,
            _ => false,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for DashboardError {
    fn from(value: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Socket(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_error_is_recoverable() {
        struct TestCase {
            input: DashboardError,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: recoverable w/ DashboardError::InvalidRecord
                input: DashboardError::InvalidRecord {
                    symbol: "USDC".to_string(),
                    reason: "deposit_limit is negative: -1".to_string(),
                },
                expected: true,
            },
            TestCase {
                // TC1: recoverable w/ DashboardError::Parse
                input: DashboardError::from(serde_json::from_str::<u8>("nope").unwrap_err()),
                expected: true,
            },
            TestCase {
                // TC2: not recoverable w/ DashboardError::Socket
                input: DashboardError::Socket("ConnectionClosed".to_string()),
                expected: false,
            },
            TestCase {
                // TC3: not recoverable w/ DashboardError::Io
                input: DashboardError::from(std::io::Error::other("disk gone")),
                expected: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.is_recoverable();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_invalid_record_display() {
        let error = DashboardError::InvalidRecord {
            symbol: "SOL".to_string(),
            reason: "price is negative: -1".to_string(),
        };
        assert_eq!(error.to_string(), "invalid market record SOL: price is negative: -1");
    }
}
