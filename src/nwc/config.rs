//! Session configuration - timeouts and limits for one wallet round trip

use std::time::Duration;

pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RESPONSE_LIMIT: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Upper bound on everything after connect: subscribe, the relay's
    /// acknowledgement and the wallet's reply.
    pub response_timeout: Duration,
    /// `limit` sent in the reply subscription filter.
    pub response_limit: usize,
    /// How long a relay may take to acknowledge the request event. Only
    /// shortens the call when below `response_timeout`.
    pub publish_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            response_limit: DEFAULT_RESPONSE_LIMIT,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_response_timeout(mut self, t: Duration) -> Self { self.response_timeout = t; self }
    pub fn with_response_limit(mut self, n: usize) -> Self { self.response_limit = n.max(1); self }
    pub fn with_publish_timeout(mut self, t: Duration) -> Self { self.publish_timeout = t; self }
}
