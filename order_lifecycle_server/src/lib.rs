//! # Order lifecycle server
//! This crate hosts the HTTP surface of the order lifecycle service. It is responsible for:
//! * Accepting order commands (create, pay, cancel, ship) and handing them to the engine's state machine.
//! * Receiving signed shipping webhooks, checking the signature and handing the event to the dispatcher.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /orders`, `GET /orders/{order_id}`: Create and fetch orders.
//! * `POST /orders/{order_id}/pay|cancel|ship`: Lease-protected status transitions.
//! * `GET /orders/{order_id}/history`: The status history, most recent first.
//! * `POST /webhooks/shipping`: The signed shipping carrier webhook.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
