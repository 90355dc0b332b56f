use std::sync::LazyLock;
use std::time::Duration;

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Request timeout of the shared client
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connect timeout of the shared client
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Global HTTP client for short request/response calls (Telegram Bot API)
///
/// This client is initialized lazily on first access and reused across the
/// application, so TCP and TLS connections to the Bot API are pooled.
///
/// Long-polling must not use it: its 30s timeout is shorter than the time the
/// review API holds a request. See [`build_client`].
///
/// # Example
/// ```ignore
/// use crate::external::client::HTTP_CLIENT;
///
/// async fn fetch_data() -> Result<String, reqwest::Error> {
///     HTTP_CLIENT.get("https://api.telegram.org").send().await?.text().await
/// }
/// ```
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    build_client(DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT).expect("Failed to build HTTP client")
});

/// Build a client with the given timeouts and the shared defaults
/// (pooling, compression, User-Agent).
pub fn build_client(timeout: Duration, connect_timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        // Timeouts
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        // Connection pooling
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        // Compression
        .gzip(true)
        .user_agent(USER_AGENT)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_initialization() {
        // Access the client to ensure it initializes without panicking
        let _ = &*HTTP_CLIENT;
    }

    #[test]
    fn test_long_poll_client_builds() {
        assert!(build_client(Duration::from_secs(120), Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_user_agent_names_the_crate() {
        assert!(USER_AGENT.starts_with("review-watcher/"));
    }
}
