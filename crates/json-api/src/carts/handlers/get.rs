//! Get Cart Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stride_app::domain::carts::records::{CartLineRecord, CartRecord};

use crate::{carts::errors::into_status_error, extensions::*, state::State};

/// Cart Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartResponse {
    /// The lines in the cart, oldest first
    pub lines: Vec<CartLineResponse>,

    /// Total units across all lines
    pub item_count: u64,

    /// Sum of line totals in minor currency units
    pub total_amount: u64,
}

impl From<CartRecord> for CartResponse {
    fn from(cart: CartRecord) -> Self {
        let item_count = cart.item_count();
        let total_amount = cart.total_amount();

        Self {
            lines: cart.lines.into_iter().map(Into::into).collect(),
            item_count,
            total_amount,
        }
    }
}

/// Cart Line Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartLineResponse {
    /// The unique identifier of the line
    pub uuid: Uuid,

    /// The product this line holds
    pub product_uuid: Uuid,

    /// Units of the product
    pub quantity: u32,

    /// Price per unit captured when the line was added, in minor units
    pub unit_price: u64,

    /// `unit_price * quantity`
    pub line_total: u64,
}

impl From<CartLineRecord> for CartLineResponse {
    fn from(line: CartLineRecord) -> Self {
        Self {
            uuid: line.uuid.into(),
            product_uuid: line.product_uuid.into(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total(),
        }
    }
}

/// Get Cart Handler
///
/// Returns the caller's cart, creating an empty one on first contact.
#[endpoint(
    tags("cart"),
    summary = "Get Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Current cart"),
        (status_code = StatusCode::BAD_REQUEST, description = "Missing or malformed session_id"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Invalid API token"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    session_id: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.cart_identity(session_id.into_inner().as_deref())?;

    let cart = state
        .app
        .carts
        .get_cart(identity)
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}
