//! `entity-db` crate — a generic single-table data client over Postgres.
//!
//! Provides a pool lifecycle manager, the `Entity` contract, and a
//! `DbClient` that finds, inserts, updates and deletes entities by building
//! parameterized SQL from their declared fields. No migrations, joins or
//! transactions live here.

pub mod client;
pub mod config;
mod decode;
pub mod entity;
pub mod error;
pub mod executor;
pub mod mock;
pub mod naming;
pub mod params;
pub mod pool;
pub mod value;

pub use client::{DbClient, SaveMode};
pub use config::{DbClientConfig, PoolConfig};
pub use entity::{Entity, Field};
pub use error::DbError;
pub use executor::{QueryPool, Row};
pub use pool::PoolProvider;
pub use value::DbValue;
