pub mod backend_uri;
pub mod fetch_any;
pub mod fetch_get;
pub mod fetch_retry;
pub mod http_transport;
pub mod reqwest_transport;
