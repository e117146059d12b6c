//! API endpoint modules.

pub mod auth;
pub mod collects;
pub mod health;
pub mod models;
pub mod openapi;
pub mod sse;
pub mod users;

pub use auth::configure_routes as configure_auth_routes;
pub use collects::configure_routes as configure_collect_routes;
pub use health::configure_health_routes;
pub use models::configure_routes as configure_model_routes;
pub use openapi::ApiDoc;
pub use sse::configure_routes as configure_sse_routes;
pub use users::configure_routes as configure_user_routes;
