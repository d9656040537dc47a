#[path = "shared/rand/mod.rs"]
pub mod rand;
#[path = "shared/time/mod.rs"]
pub mod time;
#[cfg(test)]
mod tests;

#[cfg(test)]
pub use tests::support;

pub mod app;
pub mod config;
pub mod controller;
pub mod http;
pub mod metrics;
pub mod middleware;
pub mod model;
pub mod poller;
pub mod power;
pub mod queue;
pub mod shutdown;
pub mod workers;
