//! Cart lines and the derived totals read by the UI.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::ids::{LineId, ProductId, SessionId};

/// One product line. `quantity` is never zero; setting zero removes the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Stable while the line exists.
    pub line_id: LineId,

    /// The catalog product this line holds.
    pub product_id: ProductId,

    /// Units of the product.
    pub quantity: NonZeroU32,

    /// Price per unit in minor currency units, captured when the line was
    /// created or last synced.
    pub unit_price: u64,
}

impl CartLine {
    /// `unit_price * quantity`, saturating.
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.unit_price
            .saturating_mul(u64::from(self.quantity.get()))
    }
}

/// Sum of quantities across `lines`.
#[must_use]
pub fn item_count(lines: &[CartLine]) -> u64 {
    lines.iter().map(|line| u64::from(line.quantity.get())).sum()
}

/// Sum of `unit_price * quantity` across `lines`, in minor units.
#[must_use]
pub fn total_amount(lines: &[CartLine]) -> u64 {
    lines
        .iter()
        .map(CartLine::line_total)
        .fold(0, u64::saturating_add)
}

/// The document kept in local storage between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCart {
    /// The anonymous session the cart belongs to.
    pub session_id: SessionId,

    /// The projection as it was last saved.
    #[serde(default)]
    pub lines: Vec<CartLine>,
}
