//! Catalog listing filters.
//!
//! [`ProductQuery`] describes what the storefront listing asks for; the
//! builders here turn it into parameterised SQL. Every user-supplied value is
//! bound, never interpolated.

use std::str::FromStr;

use sqlx::{Postgres, QueryBuilder};
use thiserror::Error;

use crate::domain::products::records::ProductRecord;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 24;

/// Largest page a caller may request.
pub const MAX_PER_PAGE: u32 = 100;

const PRODUCT_COLUMNS: &str = "p.uuid, p.category_uuid, p.name, p.brand, p.price, p.stock, \
     p.sizes, p.created_at, p.updated_at, p.deleted_at";

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    fn order_by(self) -> &'static str {
        match self {
            Self::Newest => " ORDER BY p.created_at DESC, p.uuid DESC",
            Self::PriceAsc => " ORDER BY p.price ASC, p.uuid ASC",
            Self::PriceDesc => " ORDER BY p.price DESC, p.uuid ASC",
            Self::Name => " ORDER BY p.name ASC, p.uuid ASC",
        }
    }
}

impl FromStr for ProductSort {
    type Err = ProductQueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "newest" => Ok(Self::Newest),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "name" => Ok(Self::Name),
            _ => Err(ProductQueryError::UnknownSort(value.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductQueryError {
    #[error("page must be at least 1")]
    PageOutOfRange,

    #[error("per_page must be between 1 and {MAX_PER_PAGE}")]
    PerPageOutOfRange,

    #[error("min_price must not exceed max_price")]
    PriceRangeInverted,

    #[error("price bound is too large")]
    PriceOutOfRange,

    #[error("unknown sort order: {0}")]
    UnknownSort(String),
}

/// Catalog listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// Category slug to match exactly.
    pub category: Option<String>,

    /// Inclusive lower price bound, minor units.
    pub min_price: Option<u64>,

    /// Inclusive upper price bound, minor units.
    pub max_price: Option<u64>,

    /// Case-insensitive substring matched against name and brand.
    pub search: Option<String>,

    /// Matches products offered in any of these sizes.
    pub sizes: Vec<String>,

    /// Only products with stock on hand.
    pub in_stock: bool,

    pub sort: ProductSort,

    /// 1-based page number.
    pub page: u32,

    pub per_page: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: None,
            min_price: None,
            max_price: None,
            search: None,
            sizes: Vec::new(),
            in_stock: false,
            sort: ProductSort::default(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ProductQuery {
    /// Check paging and price bounds before any SQL is built.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ProductQueryError> {
        if self.page == 0 {
            return Err(ProductQueryError::PageOutOfRange);
        }

        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(ProductQueryError::PerPageOutOfRange);
        }

        for bound in [self.min_price, self.max_price].into_iter().flatten() {
            if i64::try_from(bound).is_err() {
                return Err(ProductQueryError::PriceOutOfRange);
            }
        }

        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(ProductQueryError::PriceRangeInverted);
        }

        Ok(())
    }

    /// Rows to skip for the requested page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| format!("%{}%", escape_like(term)))
    }

    fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|slug| !slug.is_empty())
    }
}

/// One page of listing results.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<ProductRecord>,

    /// Matching products across all pages.
    pub total: u64,

    pub page: u32,
    pub per_page: u32,
}

/// Build the page query: filters, ordering, limit and offset.
pub(crate) fn select_page(query: &ProductQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products p"));

    push_filters(&mut builder, query);

    builder.push(query.sort.order_by());
    builder.push(" LIMIT ");
    builder.push_bind(i64::from(query.per_page));
    builder.push(" OFFSET ");
    builder.push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));

    builder
}

/// Build the matching-row count for the same filters.
pub(crate) fn select_count(query: &ProductQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM products p");

    push_filters(&mut builder, query);

    builder
}

fn push_filters(builder: &mut QueryBuilder<'static, Postgres>, query: &ProductQuery) {
    if let Some(category) = query.category() {
        builder.push(" JOIN categories c ON c.uuid = p.category_uuid AND c.deleted_at IS NULL");
        builder.push(" WHERE p.deleted_at IS NULL AND c.slug = ");
        builder.push_bind(category.to_owned());
    } else {
        builder.push(" WHERE p.deleted_at IS NULL");
    }

    // Bounds were range-checked by `validate`; saturate rather than panic if not.
    if let Some(min_price) = query.min_price {
        builder.push(" AND p.price >= ");
        builder.push_bind(i64::try_from(min_price).unwrap_or(i64::MAX));
    }

    if let Some(max_price) = query.max_price {
        builder.push(" AND p.price <= ");
        builder.push_bind(i64::try_from(max_price).unwrap_or(i64::MAX));
    }

    if let Some(pattern) = query.search_pattern() {
        builder.push(" AND (p.name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR p.brand ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    let sizes: Vec<String> = query
        .sizes
        .iter()
        .map(|size| size.trim())
        .filter(|size| !size.is_empty())
        .map(str::to_owned)
        .collect();

    if !sizes.is_empty() {
        builder.push(" AND p.sizes && ");
        builder.push_bind(sizes);
    }

    if query.in_stock {
        builder.push(" AND p.stock > 0");
    }
}

/// Escape `LIKE` metacharacters so user input only ever matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());

    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }

        escaped.push(ch);
    }

    escaped
}
