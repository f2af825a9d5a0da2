//! Client-side cart for the Stride storefront.
//!
//! [`engine::CartEngine`] keeps a locally persisted cart projection that the
//! UI reads and mutates without waiting on the network, and reconciles it
//! with the server-authoritative cart in the background. [`wishlist`] is the
//! local-only sibling with no server component.

pub mod config;
pub mod engine;
pub mod ids;
pub mod models;
pub mod remote;
pub mod store;
pub mod wishlist;
