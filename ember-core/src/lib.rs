// Core library for the Ember HTTP framework
// This module contains the foundational types, traits, and runtime components

pub mod application;
pub mod arena;
pub mod body;
pub mod connection;
pub mod connection_manager;
pub mod config;
pub mod container;
pub mod error;
pub mod extensions;
pub mod extractors;
pub mod form;
pub mod guard;
pub mod handler;
pub mod http;
pub mod json;
pub mod middleware;
pub mod route_constraint;
pub mod route_group;
pub mod routing;
pub mod shutdown;
pub mod status;
pub mod timeout;
pub mod traits;
pub mod worker;

// Re-export commonly used types
pub use application::*;
pub use arena::*;
pub use body::*;
pub use connection::*;
pub use connection_manager::*;
pub use config::ServerConfig;
pub use container::*;
pub use error::*;
pub use extensions::*;
pub use extractors::*;
pub use form::*;
pub use guard::*;
pub use http::*;
pub use middleware::*;
pub use route_constraint::*;
pub use route_group::*;
pub use routing::{Route, RouteLookup, Router, RouterConfig}; // Explicit exports to avoid ambiguous HandlerFn with handler.rs
pub use shutdown::*;
pub use status::*;
pub use timeout::*;
pub use traits::*;
// `worker` and `handler` are namespaced (`ember_core::worker::...`, `ember_core::handler::...`)
// rather than wildcard-exported to keep their HandlerFn/Router-adjacent names out of the
// top-level namespace alongside `routing`'s.
