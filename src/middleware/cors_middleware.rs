//! CORS middleware.
//!
//! Devices and browser dashboards call the relay from arbitrary origins, so
//! nothing is restricted. There is no authentication behind it either: anyone
//! who can reach the port can enqueue requests.

use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use super::middleware::Middleware;

pub struct CorsMiddleware;

impl CorsMiddleware {
    pub fn new() -> Self {
        Self
    }

    fn layer() -> CorsLayer {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

impl Default for CorsMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for CorsMiddleware {
    fn apply(&self, router: Router) -> Router {
        router.layer(Self::layer())
    }
}
