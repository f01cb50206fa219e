//! API module - HTTP routes, handlers, payload decoding and models

pub mod handlers;
pub mod models;
pub mod payload;
pub mod routes;
