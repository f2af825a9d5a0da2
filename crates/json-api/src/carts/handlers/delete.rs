//! Delete Cart Handler

use std::sync::Arc;

use salvo::{oapi::extract::QueryParam, prelude::*};
use uuid::Uuid;

use crate::{carts::errors::into_status_error, extensions::*, state::State};

/// Delete Cart Handler
///
/// Removes the line for `product_uuid`, or every line when it is omitted.
/// Deleting something that is already gone succeeds.
#[endpoint(
    tags("cart"),
    summary = "Remove Line Or Clear Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::NO_CONTENT, description = "Line removed or cart cleared"),
        (status_code = StatusCode::BAD_REQUEST, description = "Missing or malformed session_id or product_uuid"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Invalid API token"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.delete",
    skip(product_uuid, session_id, depot),
    fields(identity = tracing::field::Empty, product_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    product_uuid: QueryParam<Uuid, false>,
    session_id: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.cart_identity(session_id.into_inner().as_deref())?;

    let span = tracing::Span::current();

    span.record("identity", tracing::field::display(&identity));

    match product_uuid.into_inner() {
        Some(product) => {
            span.record("product_uuid", tracing::field::display(product));

            state
                .app
                .carts
                .remove_line(identity, product.into())
                .await
                .map_err(into_status_error)?;

            tracing::info!("cart line removed");
        }
        None => {
            state
                .app
                .carts
                .clear(identity)
                .await
                .map_err(into_status_error)?;

            tracing::info!("cart cleared");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
