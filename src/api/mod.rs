//! HTTP layer: handlers, middleware, DTOs and the router that ties them
//! together.

pub mod doc;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
