//! Core library for the `weathersim` synthetic weather generator.
//!
//! This crate defines:
//! - Configuration (city list, resolver credentials and endpoints)
//! - Abstraction over coordinate resolvers (geocoding + elevation services)
//! - Shared domain models and the observation generator
//!
//! It is used by `weathersim-cli`, but can also be reused by other binaries.

pub mod config;
pub mod error;
pub mod model;
pub mod resolver;
pub mod simulator;

pub use config::{Config, DEFAULT_CITIES, ResolverConfig};
pub use error::ResolveError;
pub use model::{Condition, Observation, Position, Reading};
pub use resolver::{
    CoordinateResolver, ResolverId, default_resolver_from_config, resolver_from_config,
};
pub use simulator::Simulator;
