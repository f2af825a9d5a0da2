//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use stride_app::{
    auth::MockAuthService,
    context::AppContext,
    domain::{
        carts::{
            CartIdentity, MockCartsService, SessionId,
            records::{CartLineRecord, CartLineUuid, CartRecord, CartUuid},
        },
        categories::{MockCategoriesService, records::CategoryUuid},
        products::{
            MockProductsService,
            records::{ProductRecord, ProductUuid},
        },
        users::{MockUsersService, records::UserUuid},
    },
};
use uuid::Uuid;

use crate::{extensions::*, state::State};

pub(crate) const TEST_USER_UUID: UserUuid = UserUuid::from_uuid(Uuid::nil());

pub(crate) const TEST_SESSION: &str = "guest-session-1";

#[salvo::handler]
pub(crate) async fn inject_user(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_user_uuid(TEST_USER_UUID);
    ctrl.call_next(req, depot, res).await;
}

pub(crate) fn test_session() -> CartIdentity {
    SessionId::parse(TEST_SESSION).map_or_else(
        |error| unreachable!("test session id is valid: {error}"),
        CartIdentity::Session,
    )
}

/// Mocks that fail the test if any of their methods is called.
#[derive(Default)]
pub(crate) struct Mocks {
    pub(crate) products: MockProductsService,
    pub(crate) categories: MockCategoriesService,
    pub(crate) carts: MockCartsService,
    pub(crate) users: MockUsersService,
    pub(crate) auth: MockAuthService,
}

impl Mocks {
    pub(crate) fn into_state(self) -> Arc<State> {
        State::from_app_context(AppContext {
            products: Arc::new(self.products),
            categories: Arc::new(self.categories),
            carts: Arc::new(self.carts),
            users: Arc::new(self.users),
            auth: Arc::new(self.auth),
        })
    }
}

pub(crate) fn state_with_auth(auth: MockAuthService) -> Arc<State> {
    Mocks {
        auth,
        ..Mocks::default()
    }
    .into_state()
}

pub(crate) fn products_service(products: MockProductsService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(
                Mocks {
                    products,
                    ..Mocks::default()
                }
                .into_state(),
            ))
            .push(route),
    )
}

pub(crate) fn categories_service(categories: MockCategoriesService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(
                Mocks {
                    categories,
                    ..Mocks::default()
                }
                .into_state(),
            ))
            .push(route),
    )
}

/// Anonymous cart requests.
pub(crate) fn carts_service(carts: MockCartsService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(
                Mocks {
                    carts,
                    ..Mocks::default()
                }
                .into_state(),
            ))
            .push(route),
    )
}

/// Cart requests from [`TEST_USER_UUID`].
pub(crate) fn user_carts_service(carts: MockCartsService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(
                Mocks {
                    carts,
                    ..Mocks::default()
                }
                .into_state(),
            ))
            .hoop(inject_user)
            .push(route),
    )
}

pub(crate) fn make_product(uuid: ProductUuid, price: u64) -> ProductRecord {
    ProductRecord {
        uuid,
        category_uuid: CategoryUuid::from_uuid(Uuid::nil()),
        name: "Cloudrunner 2".to_string(),
        brand: "Stride".to_string(),
        price,
        stock: 12,
        sizes: vec!["42".to_string(), "43".to_string()],
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
        deleted_at: None,
    }
}

pub(crate) fn make_line(product: ProductUuid, quantity: u32, unit_price: u64) -> CartLineRecord {
    CartLineRecord {
        uuid: CartLineUuid::new(),
        cart_uuid: CartUuid::from_uuid(Uuid::nil()),
        product_uuid: product,
        quantity,
        unit_price,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn make_cart(lines: Vec<CartLineRecord>) -> CartRecord {
    CartRecord {
        uuid: CartUuid::from_uuid(Uuid::nil()),
        user_uuid: None,
        session_id: Some(TEST_SESSION.to_string()),
        lines,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}
