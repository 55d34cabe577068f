//! Handlers for the leagues domain API

pub mod companies;
pub mod leagues;
pub mod notifications;
