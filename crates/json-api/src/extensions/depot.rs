//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn missing_depot_values_are_internal_errors() {
        let mut depot = Depot::new();

        assert_eq!(
            depot.obtain_or_500::<u32>().map_err(|e| e.code),
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        );

        depot.inject(7_u32);

        assert_eq!(depot.obtain_or_500::<u32>().ok(), Some(&7));
    }
}
