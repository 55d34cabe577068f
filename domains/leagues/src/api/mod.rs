//! API layer for the leagues domain

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::LeaguesState;
pub use routes::routes;
