//! Cart Data

use crate::domain::{
    carts::records::{CartLineUuid, CartUuid},
    products::records::ProductUuid,
};

/// New Cart Line Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartLine {
    pub uuid: CartLineUuid,
    pub cart_uuid: CartUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub unit_price: u64,
}
