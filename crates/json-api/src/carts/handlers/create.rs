//! Add To Cart Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    carts::{errors::into_status_error, handlers::get::CartLineResponse},
    extensions::*,
    state::State,
};

/// Cart Line Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub(crate) struct CartLineRequest {
    /// Product to add or update
    pub product_uuid: Uuid,

    /// Units to add (POST) or the absolute quantity to set (PUT)
    pub quantity: u32,

    /// Anonymous session; ignored when a bearer token is sent
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Add To Cart Handler
///
/// Adds units of a product, merging into the existing line for that product.
#[endpoint(
    tags("cart"),
    summary = "Add To Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Line created or merged"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid quantity, payload or session, or not enough stock"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Invalid API token"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.add",
    skip(json, depot),
    fields(identity = tracing::field::Empty, product_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CartLineRequest>,
    depot: &mut Depot,
) -> Result<Json<CartLineResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();
    let identity = depot.cart_identity(request.session_id.as_deref())?;

    let span = tracing::Span::current();

    span.record("identity", tracing::field::display(&identity));
    span.record("product_uuid", tracing::field::display(request.product_uuid));

    let line = state
        .app
        .carts
        .add_or_merge(identity, request.product_uuid.into(), request.quantity)
        .await
        .map_err(into_status_error)?;

    tracing::info!(quantity = line.quantity, "cart line added");

    Ok(Json(line.into()))
}
