//! Update Cart Line Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};

use crate::{
    carts::{
        errors::into_status_error,
        handlers::{create::CartLineRequest, get::CartLineResponse},
    },
    extensions::*,
    state::State,
};

/// Update Cart Line Handler
///
/// Sets a line to an absolute quantity; zero removes the line.
#[endpoint(
    tags("cart"),
    summary = "Set Line Quantity",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Line updated", body = CartLineResponse),
        (status_code = StatusCode::NO_CONTENT, description = "Line removed"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid payload or session, or not enough stock"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Invalid API token"),
        (status_code = StatusCode::NOT_FOUND, description = "Cart or line not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.update",
    skip(json, depot, res),
    fields(identity = tracing::field::Empty, product_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CartLineRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<(), StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();
    let identity = depot.cart_identity(request.session_id.as_deref())?;

    let span = tracing::Span::current();

    span.record("identity", tracing::field::display(&identity));
    span.record("product_uuid", tracing::field::display(request.product_uuid));

    let line = state
        .app
        .carts
        .set_quantity(identity, request.product_uuid.into(), request.quantity)
        .await
        .map_err(into_status_error)?;

    match line {
        Some(line) => res.render(Json(CartLineResponse::from(line))),
        None => {
            res.status_code(StatusCode::NO_CONTENT);
        }
    }

    Ok(())
}
