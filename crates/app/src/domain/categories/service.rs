//! Categories service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::PgPool;

use crate::domain::categories::{
    data::NewCategory, errors::CategoriesServiceError, records::CategoryRecord,
    repository::PgCategoriesRepository,
};

#[derive(Debug, Clone)]
pub struct PgCategoriesService {
    repository: PgCategoriesRepository,
}

impl PgCategoriesService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PgCategoriesRepository::new(pool),
        }
    }
}

#[async_trait]
impl CategoriesService for PgCategoriesService {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, CategoriesServiceError> {
        self.repository
            .list_categories()
            .await
            .map_err(Into::into)
    }

    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<CategoryRecord, CategoriesServiceError> {
        if !is_valid_slug(&category.slug) {
            return Err(CategoriesServiceError::InvalidSlug);
        }

        self.repository
            .create_category(category)
            .await
            .map_err(Into::into)
    }
}

#[automock]
#[async_trait]
pub trait CategoriesService: Send + Sync {
    /// Lists every live category ordered by name.
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, CategoriesServiceError>;

    /// Creates a category.
    async fn create_category(
        &self,
        category: NewCategory,
    ) -> Result<CategoryRecord, CategoriesServiceError>;
}

/// Lowercase ASCII words joined by single hyphens.
pub(crate) fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.split('-').all(|word| {
            !word.is_empty()
                && word
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        })
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{domain::categories::records::CategoryUuid, test::TestContext};

    use super::*;

    #[test]
    fn slug_validation() {
        assert!(is_valid_slug("running"));
        assert!(is_valid_slug("trail-running-2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Trail"));
        assert!(!is_valid_slug("trail--running"));
        assert!(!is_valid_slug("-trail"));
        assert!(!is_valid_slug("trail running"));
    }

    #[tokio::test]
    async fn created_categories_are_listed_by_name() -> TestResult {
        let ctx = TestContext::new().await;

        for (name, slug) in [("Trail", "trail"), ("Basketball", "basketball")] {
            ctx.categories
                .create_category(NewCategory {
                    uuid: CategoryUuid::new(),
                    name: name.to_string(),
                    slug: slug.to_string(),
                })
                .await?;
        }

        let categories = ctx.categories.list_categories().await?;
        let slugs: Vec<_> = categories.iter().map(|c| c.slug.as_str()).collect();

        assert_eq!(slugs, ["basketball", "trail"]);

        Ok(())
    }

    #[tokio::test]
    async fn create_category_with_bad_slug_is_rejected_before_storage() {
        let ctx = TestContext::new().await;

        let result = ctx
            .categories
            .create_category(NewCategory {
                uuid: CategoryUuid::new(),
                name: "Trail".to_string(),
                slug: "Trail Running".to_string(),
            })
            .await;

        assert!(
            matches!(result, Err(CategoriesServiceError::InvalidSlug)),
            "expected InvalidSlug, got {result:?}"
        );
    }
}
