//! Cart Records

use jiff::Timestamp;

use crate::{
    domain::{products::records::ProductUuid, users::records::UserUuid},
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<CartRecord>;

/// Cart Record
#[derive(Debug, Clone)]
pub struct CartRecord {
    pub uuid: CartUuid,
    pub user_uuid: Option<UserUuid>,
    pub session_id: Option<String>,
    pub lines: Vec<CartLineRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartRecord {
    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of line totals in minor units.
    #[must_use]
    pub fn total_amount(&self) -> u64 {
        self.lines
            .iter()
            .map(CartLineRecord::line_total)
            .fold(0, u64::saturating_add)
    }
}

/// Cart Line UUID
pub type CartLineUuid = TypedUuid<CartLineRecord>;

/// Cart Line Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineRecord {
    pub uuid: CartLineUuid,
    pub cart_uuid: CartUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,

    /// Price per unit captured when the line was first added.
    pub unit_price: u64,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartLineRecord {
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.unit_price.saturating_mul(u64::from(self.quantity))
    }
}
