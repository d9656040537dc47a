// Router-wide middlewares.

pub mod cors_middleware;
pub mod middleware;
pub mod recover_middleware;

pub use cors_middleware::CorsMiddleware;
pub use middleware::Middleware;
pub use recover_middleware::{panics_counter, PanicRecoverMiddleware};
