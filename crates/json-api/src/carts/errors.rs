//! Errors

use salvo::http::StatusError;
use tracing::error;

use stride_app::domain::carts::CartsServiceError;

pub(crate) fn into_status_error(error: CartsServiceError) -> StatusError {
    match error {
        CartsServiceError::NotFound => StatusError::not_found().brief("Cart line not found"),
        CartsServiceError::ProductNotFound => StatusError::not_found().brief("Product not found"),
        CartsServiceError::OutOfStock {
            requested,
            available,
        } => StatusError::bad_request().brief(format!(
            "Requested {requested} but only {available} in stock"
        )),
        CartsServiceError::InvalidQuantity => {
            StatusError::bad_request().brief("Quantity must be at least 1")
        }
        CartsServiceError::AlreadyExists => StatusError::conflict().brief("Cart already exists"),
        CartsServiceError::InvalidReference
        | CartsServiceError::MissingRequiredData
        | CartsServiceError::InvalidData => StatusError::bad_request().brief("Invalid cart payload"),
        CartsServiceError::Sql(source) => {
            error!("cart storage error: {source}");

            StatusError::internal_server_error()
        }
        CartsServiceError::InvalidAmount(source) => {
            error!("cart amount out of range: {source}");

            StatusError::internal_server_error()
        }
    }
}
