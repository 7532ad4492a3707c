//! Mapper configuration.

use std::time::Duration;

/// Default time to wait for a requested target or isolated world to be reported.
pub const DEFAULT_CONTEXT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime knobs for the mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperConfig {
	/// Bounds `browsingContext.create` and sandbox creation waits.
	pub context_timeout: Duration,
}

impl Default for MapperConfig {
	fn default() -> Self {
		Self {
			context_timeout: DEFAULT_CONTEXT_TIMEOUT,
		}
	}
}

impl MapperConfig {
	pub fn with_context_timeout(mut self, timeout: Duration) -> Self {
		self.context_timeout = timeout;
		self
	}
}
