// Per-route publishing loops
pub mod publisher;

// Sidecar readiness gate
pub mod readiness;

// Process orchestrator
pub mod system;
