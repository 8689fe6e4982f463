// Flattening
pub mod bundle;
pub mod estimate;

// Settings
pub mod config;
pub mod token;

// Shared helpers
pub mod interrupt;
