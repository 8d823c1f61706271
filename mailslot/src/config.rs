use std::time::Duration;

use crate::policy::ConfigError;

/// How long a connection may spend reading before it is dropped. Armed once,
/// when the connection is accepted.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_RECIPIENTS: usize = 10;
/// One mebibyte
pub const DEFAULT_MAX_MESSAGE_BYTES: u64 = 1024 * 1024;

pub trait Config: Send + Sync {
	/// Check if mail for this domain is accepted here. Exact, case-sensitive match.
	fn accepts_domain(&self, domain: &str) -> bool;

	/// Returns the hostname that the server will present itself as
	fn default_host(&self) -> String;

	/// Re-read the policy from wherever it came from.
	fn reload(&self) -> Result<(), ConfigError>;

	fn timeout(&self) -> Duration {
		DEFAULT_TIMEOUT
	}

	/// The number of forward paths a single transaction may carry.
	fn max_recipients(&self) -> usize {
		DEFAULT_MAX_RECIPIENTS
	}

	fn max_message_bytes(&self) -> u64 {
		DEFAULT_MAX_MESSAGE_BYTES
	}
}
