//! Data Transfer Objects for REST request/response serialization.
//!
//! Subscriber identities never leave the service in a class body; list
//! endpoints are paginated.

pub mod class_dto;
pub mod common_dto;
pub mod subscription_dto;

pub use class_dto::*;
pub use common_dto::*;
pub use subscription_dto::*;
