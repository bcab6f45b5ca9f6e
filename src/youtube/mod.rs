// YouTube integration: upstream API client, suggestion handling, and the
// client for our own proxy routes
pub mod api;
pub mod debounce;
pub mod duration;
pub mod proxy_client;
pub mod suggestions;
