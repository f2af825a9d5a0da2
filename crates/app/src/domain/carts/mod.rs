//! Carts

pub mod data;
pub mod errors;
pub mod identity;
pub mod policy;
pub mod records;
mod repositories;
pub mod service;

pub use errors::CartsServiceError;
pub use identity::{CartIdentity, SessionId};
pub use service::*;
