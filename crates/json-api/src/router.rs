//! App Router

use salvo::Router;

use crate::{auth, carts, categories, healthcheck, observability, products};

/// Storefront routes. Catalog reads are public; cart routes resolve the
/// caller from an optional bearer token or a `session_id`.
pub(crate) fn app_router() -> Router {
    Router::new()
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(observability::metrics_handler))
        .push(
            Router::with_path("products")
                .get(products::index::handler)
                .push(Router::with_path("{product}").get(products::get::handler)),
        )
        .push(Router::with_path("categories").get(categories::index::handler))
        .push(
            Router::with_path("cart")
                .hoop(auth::middleware::handler)
                .get(carts::get::handler)
                .post(carts::create::handler)
                .put(carts::update::handler)
                .delete(carts::delete::handler),
        )
}
