// Synthetic message model and generator
pub mod message;

// Port interfaces
pub mod ports;

// Broker routes and load tiers
pub mod routes;

// Domain-specific error types
pub mod errors;
