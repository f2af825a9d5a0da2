//! Request identity helpers.

use salvo::prelude::{Depot, StatusError};
use stride_app::domain::{
    carts::{CartIdentity, SessionId},
    users::records::UserUuid,
};

use crate::extensions::*;

/// Who a cart request acts for.
pub(crate) trait IdentityExt {
    fn insert_user_uuid(&mut self, user: UserUuid);

    /// The authenticated customer, if the request carried a valid token.
    fn user_uuid(&self) -> Option<UserUuid>;

    /// Resolve the cart owner: the authenticated customer, otherwise the
    /// anonymous `session_id`, which is then required.
    fn cart_identity(&self, session_id: Option<&str>) -> Result<CartIdentity, StatusError>;
}

impl IdentityExt for Depot {
    fn insert_user_uuid(&mut self, user: UserUuid) {
        self.inject(user);
    }

    fn user_uuid(&self) -> Option<UserUuid> {
        self.obtain::<UserUuid>().ok().copied()
    }

    fn cart_identity(&self, session_id: Option<&str>) -> Result<CartIdentity, StatusError> {
        if let Some(user) = self.user_uuid() {
            return Ok(CartIdentity::User(user));
        }

        let raw = session_id
            .ok_or_else(|| StatusError::bad_request().brief("session_id is required"))?;

        SessionId::parse(raw).map(CartIdentity::Session).or_400()
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn authenticated_user_wins_over_session() -> TestResult {
        let user = UserUuid::new();
        let mut depot = Depot::new();

        depot.insert_user_uuid(user);

        assert_eq!(
            depot.cart_identity(Some("guest-1"))?,
            CartIdentity::User(user)
        );

        Ok(())
    }

    #[test]
    fn anonymous_requests_need_a_valid_session() -> TestResult {
        let depot = Depot::new();

        assert_eq!(
            depot.cart_identity(Some("guest-1"))?,
            CartIdentity::Session(SessionId::parse("guest-1")?)
        );
        assert_eq!(
            depot.cart_identity(None).map(|_| ()).map_err(|e| e.code),
            Err(StatusCode::BAD_REQUEST)
        );
        assert_eq!(
            depot
                .cart_identity(Some("not a session"))
                .map(|_| ())
                .map_err(|e| e.code),
            Err(StatusCode::BAD_REQUEST)
        );

        Ok(())
    }
}
