//! Product Records

use jiff::Timestamp;

use crate::{domain::categories::records::CategoryUuid, uuids::TypedUuid};

/// Product UUID
pub type ProductUuid = TypedUuid<ProductRecord>;

/// Product Record
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub uuid: ProductUuid,
    pub category_uuid: CategoryUuid,
    pub name: String,
    pub brand: String,

    /// Price in minor currency units.
    pub price: u64,

    /// Units on hand; carts may not hold more than this.
    pub stock: u64,

    /// Size labels this product is offered in, e.g. `["8", "8.5", "9"]`.
    pub sizes: Vec<String>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}
