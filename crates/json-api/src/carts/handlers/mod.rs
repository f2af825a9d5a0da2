//! Cart Handlers
//!
//! Every route acts on the cart of the authenticated customer, or of the
//! anonymous `session_id` when no token was sent.

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod get;
pub(crate) mod update;
