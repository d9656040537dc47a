// Background workers.

pub mod sweeper;

// Re-export main types
pub use sweeper::Sweeper;
