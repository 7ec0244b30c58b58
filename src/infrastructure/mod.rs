pub mod app_host;
pub mod core;
pub mod dapr;
pub mod http_server;
pub mod mock;
pub mod observability;

pub use dapr::DaprClient;
pub use mock::MockPubSubClient;
