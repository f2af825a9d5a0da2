//! Category Errors

use salvo::http::StatusError;
use tracing::error;

use stride_app::domain::categories::CategoriesServiceError;

pub(crate) fn into_status_error(error: CategoriesServiceError) -> StatusError {
    match error {
        CategoriesServiceError::NotFound => StatusError::not_found().brief("Category not found"),
        CategoriesServiceError::AlreadyExists => {
            StatusError::conflict().brief("Category already exists")
        }
        CategoriesServiceError::InvalidSlug | CategoriesServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid category payload")
        }
        CategoriesServiceError::Sql(source) => {
            error!("category storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        let cases = [
            (CategoriesServiceError::NotFound, StatusCode::NOT_FOUND),
            (CategoriesServiceError::AlreadyExists, StatusCode::CONFLICT),
            (CategoriesServiceError::InvalidSlug, StatusCode::BAD_REQUEST),
            (CategoriesServiceError::InvalidData, StatusCode::BAD_REQUEST),
        ];

        for (error, expected) in cases {
            assert_eq!(into_status_error(error).code, expected);
        }
    }
}
