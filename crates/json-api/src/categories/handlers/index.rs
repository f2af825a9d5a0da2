//! Category Index Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stride_app::domain::categories::records::CategoryRecord;

use crate::{categories::errors::into_status_error, extensions::*, state::State};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CategoryResponse {
    pub uuid: Uuid,
    pub name: String,

    /// URL-safe identifier used by the product `category` filter
    pub slug: String,
}

impl From<CategoryRecord> for CategoryResponse {
    fn from(category: CategoryRecord) -> Self {
        CategoryResponse {
            uuid: category.uuid.into(),
            name: category.name,
            slug: category.slug,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CategoriesResponse {
    pub categories: Vec<CategoryResponse>,
}

/// Category Index Handler
///
/// Lists every category ordered by name.
#[endpoint(tags("categories"), summary = "List Categories")]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CategoriesResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let categories = state
        .app
        .categories
        .list_categories()
        .await
        .map_err(into_status_error)?;

    Ok(Json(CategoriesResponse {
        categories: categories.into_iter().map(Into::into).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use stride_app::domain::categories::{MockCategoriesService, records::CategoryUuid};

    use crate::test_helpers::categories_service;

    use super::*;

    fn make_category(name: &str, slug: &str) -> CategoryRecord {
        CategoryRecord {
            uuid: CategoryUuid::new(),
            name: name.to_string(),
            slug: slug.to_string(),
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
            deleted_at: None,
        }
    }

    fn make_service(repo: MockCategoriesService) -> Service {
        categories_service(repo, Router::with_path("categories").get(handler))
    }

    #[tokio::test]
    async fn test_index_lists_categories() -> TestResult {
        let mut repo = MockCategoriesService::new();

        repo.expect_list_categories().once().return_once(|| {
            Ok(vec![
                make_category("Basketball", "basketball"),
                make_category("Trail", "trail"),
            ])
        });

        let mut res = TestClient::get("http://example.com/categories")
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: CategoriesResponse = res.take_json().await?;
        let slugs: Vec<_> = body.categories.iter().map(|c| c.slug.as_str()).collect();

        assert_eq!(slugs, ["basketball", "trail"]);

        Ok(())
    }
}
