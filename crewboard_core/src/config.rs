use std::time::Duration;

/// Tunables for the remote bridge and the local data window. The defaults
/// match the deployed endpoint contract; embedders normally override only
/// `endpoint`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identifier of the remote function-style endpoint, passed through to
    /// the transport with every request.
    pub endpoint: String,
    /// How long a remote call may stay unanswered before it fails with
    /// `Timeout`.
    pub call_timeout: Duration,
    /// Artificial latency of the fallback simulator, so degraded operation
    /// still feels like a round trip.
    pub simulator_latency: Duration,
    /// Length of the trailing assignment-history window loaded on refresh.
    pub assignment_window_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: String::new(),
            call_timeout: Duration::from_secs(15),
            simulator_latency: Duration::from_millis(300),
            assignment_window_days: 30,
        }
    }
}
