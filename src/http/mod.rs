// HTTP module: server plus re-exports of the controller/middleware interfaces.

pub mod server;

// Re-export middleware interfaces from the dedicated middleware module
pub use crate::middleware::Middleware;

// Re-export server types
pub use server::HttpServer;

// Common controller interface
pub use crate::controller::controller::Controller;
