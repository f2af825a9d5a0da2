//! Result helper extensions for HTTP handlers.

use std::fmt::Display;

use salvo::prelude::StatusError;

pub(crate) trait ResultExt<T> {
    /// Answer 400 with the error as the brief.
    fn or_400(self) -> Result<T, StatusError>;
}

impl<T, E: Display> ResultExt<T> for Result<T, E> {
    fn or_400(self) -> Result<T, StatusError> {
        self.map_err(|error| StatusError::bad_request().brief(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn errors_become_bad_requests_with_their_message() {
        let status = Err::<(), _>("session id is too long").or_400().unwrap_err();

        assert_eq!(status.code, StatusCode::BAD_REQUEST);
        assert_eq!(status.brief, "session id is too long");
    }
}
