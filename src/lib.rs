// ABOUTME: Root library module for the server-to-Telegram bridge
// ABOUTME: Exposes the Telegram platform, process supervisor, inbound relay, and logging setup

pub mod logging;
pub mod platform;
pub mod relay;
pub mod supervisor;

// Re-export platform-agnostic modules from whosin-core
pub use whosin_core::config;
pub use whosin_core::detector;
pub use whosin_core::launch;
pub use whosin_core::outbox;
pub use whosin_core::paths;
pub use whosin_core::traits;
