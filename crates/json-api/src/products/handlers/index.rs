//! Product Index Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToParameters, ToSchema},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use stride_app::domain::products::query::{DEFAULT_PER_PAGE, ProductQuery, ProductSort};

use crate::{
    extensions::*,
    products::{errors::into_status_error, get::ProductResponse},
    state::State,
};

/// Catalog filters accepted on the query string.
#[derive(Debug, Default, Deserialize, ToParameters)]
#[salvo(parameters(default_parameter_in = Query))]
pub(crate) struct ProductFilters {
    /// Category slug
    category: Option<String>,

    /// Inclusive lower price bound in minor units
    min_price: Option<u64>,

    /// Inclusive upper price bound in minor units
    max_price: Option<u64>,

    /// Matched against product name and brand
    search: Option<String>,

    /// Comma separated sizes, e.g. `42,42.5`
    sizes: Option<String>,

    /// Only list products with stock on hand
    in_stock: Option<bool>,

    /// One of `newest`, `price_asc`, `price_desc` or `name`
    sort: Option<String>,

    page: Option<u32>,
    per_page: Option<u32>,
}

impl ProductFilters {
    fn into_query(self) -> Result<ProductQuery, StatusError> {
        let sort = self
            .sort
            .as_deref()
            .map(str::parse::<ProductSort>)
            .transpose()
            .map_err(|error| StatusError::bad_request().brief(error.to_string()))?
            .unwrap_or_default();

        let sizes = self
            .sizes
            .as_deref()
            .map(|sizes| {
                sizes
                    .split(',')
                    .map(str::trim)
                    .filter(|size| !size.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ProductQuery {
            category: self.category,
            min_price: self.min_price,
            max_price: self.max_price,
            search: self.search,
            sizes,
            in_stock: self.in_stock.unwrap_or(false),
            sort,
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(DEFAULT_PER_PAGE),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductsResponse {
    /// The requested page of products
    pub products: Vec<ProductResponse>,

    /// Matching products across all pages
    pub total: u64,

    pub page: u32,
    pub per_page: u32,
}

/// Product Index Handler
///
/// Returns a filtered, paginated page of the catalog.
#[endpoint(
    tags("products"),
    summary = "List Products",
    responses(
        (status_code = StatusCode::OK, description = "Page of products"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid filters or paging"),
    ),
)]
pub(crate) async fn handler(
    filters: ProductFilters,
    depot: &mut Depot,
) -> Result<Json<ProductsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let query = filters.into_query()?;

    let page = state
        .app
        .products
        .list_products(query)
        .await
        .map_err(into_status_error)?;

    Ok(Json(ProductsResponse {
        products: page.products.into_iter().map(Into::into).collect(),
        total: page.total,
        page: page.page,
        per_page: page.per_page,
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use stride_app::domain::products::{
        MockProductsService, ProductsServiceError,
        query::{ProductPage, ProductQueryError},
        records::ProductUuid,
    };

    use crate::test_helpers::{make_product, products_service};

    use super::*;

    fn make_service(repo: MockProductsService) -> Service {
        products_service(repo, Router::with_path("products").get(handler))
    }

    #[tokio::test]
    async fn test_index_uses_default_paging() -> TestResult {
        let mut repo = MockProductsService::new();

        repo.expect_list_products()
            .once()
            .withf(|query| *query == ProductQuery::default())
            .return_once(|query| {
                Ok(ProductPage {
                    products: vec![make_product(ProductUuid::new(), 8_999)],
                    total: 1,
                    page: query.page,
                    per_page: query.per_page,
                })
            });

        let mut res = TestClient::get("http://example.com/products")
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: ProductsResponse = res.take_json().await?;

        assert_eq!(body.products.len(), 1);
        assert_eq!(body.total, 1);
        assert_eq!(body.page, 1);
        assert_eq!(body.per_page, DEFAULT_PER_PAGE);

        Ok(())
    }

    #[tokio::test]
    async fn test_index_forwards_every_filter() -> TestResult {
        let mut repo = MockProductsService::new();

        repo.expect_list_products()
            .once()
            .withf(|query| {
                *query
                    == ProductQuery {
                        category: Some("trail".to_string()),
                        min_price: Some(5_000),
                        max_price: Some(20_000),
                        search: Some("cloud".to_string()),
                        sizes: vec!["42".to_string(), "42.5".to_string()],
                        in_stock: true,
                        sort: ProductSort::PriceDesc,
                        page: 3,
                        per_page: 12,
                    }
            })
            .return_once(|query| {
                Ok(ProductPage {
                    products: Vec::new(),
                    total: 30,
                    page: query.page,
                    per_page: query.per_page,
                })
            });

        let mut res = TestClient::get(
            "http://example.com/products?category=trail&min_price=5000&max_price=20000\
             &search=cloud&sizes=42,%2042.5,&in_stock=true&sort=price_desc&page=3&per_page=12",
        )
        .send(&make_service(repo))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: ProductsResponse = res.take_json().await?;

        assert!(body.products.is_empty());
        assert_eq!(body.total, 30);
        assert_eq!(body.page, 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_index_unknown_sort_returns_400() -> TestResult {
        let mut repo = MockProductsService::new();

        repo.expect_list_products().never();

        let res = TestClient::get("http://example.com/products?sort=cheapest")
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_index_rejected_query_returns_400() -> TestResult {
        let mut repo = MockProductsService::new();

        repo.expect_list_products().once().return_once(|_| {
            Err(ProductsServiceError::InvalidQuery(
                ProductQueryError::PerPageOutOfRange,
            ))
        });

        let res = TestClient::get("http://example.com/products?per_page=500")
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
