/// Network adapters: the shared HTTP client
mod http_client;

pub use http_client::{build_http_client, default_user_agent, HttpSettings, DEFAULT_TIMEOUT_SECS};
