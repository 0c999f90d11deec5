// All conversion logic is in altotei-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod kraken;

// Re-export core types for convenience
pub use altotei_core::*;

// Re-export CLI utilities
pub use kraken::KrakenRunner;
