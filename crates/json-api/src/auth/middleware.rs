//! Optional bearer authentication.
//!
//! Requests without an `Authorization` header pass through anonymously and
//! act on their session cart. A header that is present must carry a valid
//! API token.

use std::sync::Arc;

use salvo::{http::header::AUTHORIZATION, prelude::*};
use stride_app::{auth::AuthServiceError, domain::users::records::UserUuid};
use tracing::error;

use crate::{extensions::*, state::State};

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let user = match bearer_token(req) {
        Ok(None) => Ok(None),
        Ok(Some(token)) => authenticate(depot, &token).await.map(Some),
        Err(status) => Err(status),
    };

    match user {
        Ok(Some(user)) => depot.insert_user_uuid(user),
        Ok(None) => {}
        Err(status) => {
            res.render(status);
            ctrl.skip_rest();

            return;
        }
    }

    ctrl.call_next(req, depot, res).await;
}

/// `None` for anonymous requests; a present but unusable header is rejected.
fn bearer_token(req: &Request) -> Result<Option<String>, StatusError> {
    if !req.headers().contains_key(AUTHORIZATION) {
        return Ok(None);
    }

    extract_bearer_token(req)
        .map(|token| Some(token.to_owned()))
        .ok_or_else(|| StatusError::unauthorized().brief("Invalid Authorization header"))
}

async fn authenticate(depot: &Depot, token: &str) -> Result<UserUuid, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    state
        .app
        .auth
        .authenticate_bearer(token)
        .await
        .map_err(|auth_error| match auth_error {
            AuthServiceError::NotFound | AuthServiceError::InvalidReference => {
                StatusError::unauthorized().brief("Invalid API token")
            }
            AuthServiceError::Sql(source) => {
                error!("failed to look up api token: {source}");

                StatusError::internal_server_error()
            }
            AuthServiceError::Token(source) => {
                error!("failed to process api token: {source}");

                StatusError::internal_server_error()
            }
        })
}

fn extract_bearer_token(req: &Request) -> Option<&str> {
    let (scheme, token) = req
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .split_once(' ')?;

    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
