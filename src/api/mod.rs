//! API Module
//!
//! HTTP handlers and routing for the flag service REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET {prefix}/flags/evaluate` - Evaluate a flag for a user (cached)
//! - `POST|GET {prefix}/flags` - Create / list flags
//! - `GET|PATCH|DELETE {prefix}/flags/:flag_id` - Read / update / delete a flag
//! - `PATCH {prefix}/flags/:flag_id/toggle` - Switch a flag on or off
//! - `GET {prefix}/flags/:flag_id/users` - List overrides
//! - `PUT|DELETE {prefix}/flags/:flag_id/users/:user_id` - Set / remove an override
//! - `GET {prefix}/cache/stats` - Evaluation cache statistics

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
