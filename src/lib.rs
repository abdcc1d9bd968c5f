//! Typed Rust client for the MoySklad JSON API.
//!
//! Public API layers:
//! - [`MoySklad`]: one repository per entity type over a shared transport.
//! - [`EntityRepository`]: CRUD, bulk and paging for any [`Entity`], plus
//!   entity-specific operations on the named [`repositories`].
//! - [`ApiClient`]/[`BlockingApiClient`]: JSON HTTP transports with retry
//!   and status mapping.
//! - [`QueryBuilder`]: `filter`, `order`, `expand` and paging parameters.
//! - [`ClientError`]: unified error type used by all of the above.

mod attributes;
mod blocking_client;
mod client;
mod config;
pub mod datetime;
pub mod entities;
mod entity;
mod error;
mod meta;
mod moysklad;
mod query;
pub mod repositories;
mod repository;
mod retry;

pub use attributes::{Attribute, AttributeCollection};
/// Generic blocking JSON REST client.
pub use blocking_client::BlockingApiClient;
/// Generic async JSON REST client.
pub use client::ApiClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use entity::{Entity, EntityBase, ListResponse, id_from_href};
/// Error type returned by all client operations.
pub use error::{ApiError, ClientError, DEFAULT_RETRY_AFTER};
pub use meta::{EntityRef, Meta};
pub use moysklad::MoySklad;
pub use query::{Direction, Filter, FilterValue, OrderBy, QueryBuilder};
pub use repositories::*;
pub use repository::EntityRepository;
pub use retry::RetryPolicy;
