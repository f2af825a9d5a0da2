//! Quantity rules applied before any cart line is written.

use crate::domain::carts::errors::CartsServiceError;

/// Reject a zero quantity for operations that must add at least one unit.
///
/// # Errors
///
/// Returns [`CartsServiceError::InvalidQuantity`] for `0`.
pub fn require_positive(quantity: u32) -> Result<u32, CartsServiceError> {
    if quantity == 0 {
        return Err(CartsServiceError::InvalidQuantity);
    }

    Ok(quantity)
}

/// Quantity a line ends up with when `added` units are merged into it.
///
/// # Errors
///
/// Returns [`CartsServiceError::OutOfStock`] if the sum overflows a line
/// quantity, since no product carries that much stock.
pub fn merged_quantity(existing: u32, added: u32, stock: u64) -> Result<u32, CartsServiceError> {
    existing
        .checked_add(added)
        .ok_or(CartsServiceError::OutOfStock {
            requested: u64::from(existing) + u64::from(added),
            available: stock,
        })
}

/// Check a line quantity against the units on hand.
///
/// # Errors
///
/// Returns [`CartsServiceError::OutOfStock`] when `requested` exceeds `stock`.
pub fn ensure_in_stock(requested: u32, stock: u64) -> Result<(), CartsServiceError> {
    if u64::from(requested) > stock {
        return Err(CartsServiceError::OutOfStock {
            requested: u64::from(requested),
            available: stock,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn zero_is_not_a_positive_quantity() {
        assert!(matches!(
            require_positive(0),
            Err(CartsServiceError::InvalidQuantity)
        ));
        assert!(matches!(require_positive(1), Ok(1)));
    }

    #[test]
    fn merging_adds_quantities() -> TestResult {
        assert_eq!(merged_quantity(2, 3, 10)?, 5);

        Ok(())
    }

    #[test]
    fn merging_past_u32_is_out_of_stock() {
        let result = merged_quantity(u32::MAX, 1, 50);

        assert!(matches!(
            result,
            Err(CartsServiceError::OutOfStock {
                requested: 4_294_967_296,
                available: 50
            })
        ));
    }

    #[test]
    fn stock_check_allows_exact_stock() {
        assert!(ensure_in_stock(3, 3).is_ok());
        assert!(ensure_in_stock(0, 0).is_ok());
    }

    #[test]
    fn stock_check_reports_requested_and_available() {
        assert!(matches!(
            ensure_in_stock(4, 3),
            Err(CartsServiceError::OutOfStock {
                requested: 4,
                available: 3
            })
        ));
    }
}
