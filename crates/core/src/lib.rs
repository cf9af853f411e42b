//! `sitesecurity-core`: shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model, paging and the entity/value-object traits
//! the scheduling crates build on.

pub mod entity;
pub mod error;
pub mod id;
pub mod paging;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{UserId, WorkerId, WorksiteId};
pub use paging::PageRequest;
pub use value_object::ValueObject;
