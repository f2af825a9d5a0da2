//! Carts service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{Span, debug, info};

use crate::{
    database::Db,
    domain::{
        carts::{
            data::NewCartLine,
            errors::CartsServiceError,
            identity::CartIdentity,
            policy,
            records::{CartLineRecord, CartLineUuid, CartRecord, CartUuid},
            repositories::{PgCartLinesRepository, PgCartsRepository},
        },
        products::{records::ProductUuid, repository::PgProductsRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    carts: PgCartsRepository,
    lines: PgCartLinesRepository,
    products: PgProductsRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts: PgCartsRepository::new(),
            lines: PgCartLinesRepository::new(),
            products: PgProductsRepository::new(),
        }
    }

    /// Fetch the owner's cart, creating an empty one on first contact. The
    /// returned row is locked for the rest of the transaction.
    async fn lock_or_create_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        identity: &CartIdentity,
    ) -> Result<CartRecord, CartsServiceError> {
        if let Some(cart) = self.carts.lock_cart(tx, identity).await? {
            return Ok(cart);
        }

        if let Some(cart) = self.carts.create_cart(tx, CartUuid::new(), identity).await? {
            debug!(cart_uuid = %cart.uuid, "created cart");

            return Ok(cart);
        }

        // Lost an insert race; the winner's row is visible now.
        self.carts
            .lock_cart(tx, identity)
            .await?
            .ok_or(CartsServiceError::NotFound)
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    #[tracing::instrument(
        name = "carts.service.get_cart",
        skip(self),
        fields(identity = %identity, cart_uuid = tracing::field::Empty),
        err
    )]
    async fn get_cart(&self, identity: CartIdentity) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let mut cart = match self.carts.find_cart(&mut tx, &identity).await? {
            Some(cart) => cart,
            None => self.lock_or_create_cart(&mut tx, &identity).await?,
        };

        Span::current().record("cart_uuid", tracing::field::display(cart.uuid));

        cart.lines = self.lines.get_cart_lines(&mut tx, cart.uuid).await?;

        tx.commit().await?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.add_or_merge",
        skip(self),
        fields(identity = %identity, product_uuid = %product, merged = tracing::field::Empty),
        err
    )]
    async fn add_or_merge(
        &self,
        identity: CartIdentity,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartLineRecord, CartsServiceError> {
        let quantity = policy::require_positive(quantity)?;

        let mut tx = self.db.begin().await?;

        let cart = self.lock_or_create_cart(&mut tx, &identity).await?;

        let product = self
            .products
            .lock_product(&mut tx, product)
            .await?
            .ok_or(CartsServiceError::ProductNotFound)?;

        let existing = self
            .lines
            .get_cart_line(&mut tx, cart.uuid, product.uuid)
            .await?;

        Span::current().record("merged", existing.is_some());

        let line = match existing {
            Some(line) => {
                let merged = policy::merged_quantity(line.quantity, quantity, product.stock)?;

                policy::ensure_in_stock(merged, product.stock)?;

                self.lines.update_quantity(&mut tx, line.uuid, merged).await?
            }
            None => {
                policy::ensure_in_stock(quantity, product.stock)?;

                self.lines
                    .create_cart_line(
                        &mut tx,
                        NewCartLine {
                            uuid: CartLineUuid::new(),
                            cart_uuid: cart.uuid,
                            product_uuid: product.uuid,
                            quantity,
                            unit_price: product.price,
                        },
                    )
                    .await?
            }
        };

        self.carts.touch_cart(&mut tx, cart.uuid).await?;

        tx.commit().await?;

        info!(
            cart_uuid = %cart.uuid,
            line_uuid = %line.uuid,
            quantity = line.quantity,
            "cart line saved"
        );

        Ok(line)
    }

    #[tracing::instrument(
        name = "carts.service.set_quantity",
        skip(self),
        fields(identity = %identity, product_uuid = %product),
        err
    )]
    async fn set_quantity(
        &self,
        identity: CartIdentity,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Option<CartLineRecord>, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self
            .carts
            .lock_cart(&mut tx, &identity)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        let line = self
            .lines
            .get_cart_line(&mut tx, cart.uuid, product)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        if quantity == 0 {
            self.lines.delete_cart_line(&mut tx, cart.uuid, product).await?;
            self.carts.touch_cart(&mut tx, cart.uuid).await?;

            tx.commit().await?;

            info!(cart_uuid = %cart.uuid, line_uuid = %line.uuid, "cart line removed");

            return Ok(None);
        }

        let product = self
            .products
            .lock_product(&mut tx, product)
            .await?
            .ok_or(CartsServiceError::ProductNotFound)?;

        policy::ensure_in_stock(quantity, product.stock)?;

        let line = self.lines.update_quantity(&mut tx, line.uuid, quantity).await?;

        self.carts.touch_cart(&mut tx, cart.uuid).await?;

        tx.commit().await?;

        info!(cart_uuid = %cart.uuid, line_uuid = %line.uuid, quantity, "cart line updated");

        Ok(Some(line))
    }

    #[tracing::instrument(
        name = "carts.service.remove_line",
        skip(self),
        fields(identity = %identity, product_uuid = %product),
        err
    )]
    async fn remove_line(
        &self,
        identity: CartIdentity,
        product: ProductUuid,
    ) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        if let Some(cart) = self.carts.lock_cart(&mut tx, &identity).await? {
            let removed = self.lines.delete_cart_line(&mut tx, cart.uuid, product).await?;

            if removed > 0 {
                self.carts.touch_cart(&mut tx, cart.uuid).await?;
            }
        }

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(
        name = "carts.service.clear",
        skip(self),
        fields(identity = %identity, removed = tracing::field::Empty),
        err
    )]
    async fn clear(&self, identity: CartIdentity) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        if let Some(cart) = self.carts.lock_cart(&mut tx, &identity).await? {
            let removed = self.lines.delete_cart_lines(&mut tx, cart.uuid).await?;

            Span::current().record("removed", removed);

            if removed > 0 {
                self.carts.touch_cart(&mut tx, cart.uuid).await?;
            }
        }

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(name = "carts.service.purge_abandoned", skip(self), err)]
    async fn purge_abandoned(&self, older_than: Timestamp) -> Result<u64, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let purged = self.carts.purge_abandoned(&mut tx, older_than).await?;

        tx.commit().await?;

        if purged > 0 {
            info!(purged, %older_than, "purged abandoned carts");
        }

        Ok(purged)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Returns the owner's cart with its lines, creating an empty cart on first contact.
    async fn get_cart(&self, identity: CartIdentity) -> Result<CartRecord, CartsServiceError>;

    /// Adds `quantity` units of a product, merging into an existing line for the
    /// same product. New lines capture the current product price.
    async fn add_or_merge(
        &self,
        identity: CartIdentity,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartLineRecord, CartsServiceError>;

    /// Sets a line to an absolute quantity. Zero removes the line and yields `None`.
    async fn set_quantity(
        &self,
        identity: CartIdentity,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Option<CartLineRecord>, CartsServiceError>;

    /// Removes the line for a product. Succeeds when nothing matched.
    async fn remove_line(
        &self,
        identity: CartIdentity,
        product: ProductUuid,
    ) -> Result<(), CartsServiceError>;

    /// Removes every line. Succeeds when the owner has no cart.
    async fn clear(&self, identity: CartIdentity) -> Result<(), CartsServiceError>;

    /// Deletes anonymous carts untouched since `older_than`. User carts are kept.
    async fn purge_abandoned(&self, older_than: Timestamp) -> Result<u64, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::{Span as JiffSpan, Timestamp};
    use testresult::TestResult;

    use crate::{
        domain::carts::identity::{SessionId, SessionIdError},
        test::{TestContext, helpers},
    };

    use super::*;

    fn guest(raw: &str) -> Result<CartIdentity, SessionIdError> {
        SessionId::parse(raw).map(CartIdentity::Session)
    }

    #[tokio::test]
    async fn get_cart_creates_empty_cart_once() -> TestResult {
        let ctx = TestContext::new().await;
        let identity = guest("first-visit")?;

        let first = ctx.carts.get_cart(identity.clone()).await?;
        let second = ctx.carts.get_cart(identity).await?;

        assert_eq!(first.uuid, second.uuid);
        assert_eq!(first.session_id.as_deref(), Some("first-visit"));
        assert!(first.lines.is_empty());
        assert_eq!(first.total_amount(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn adding_same_product_merges_into_one_line() -> TestResult {
        let ctx = TestContext::new().await;
        let category = helpers::create_category(&ctx, "running").await?;
        let product = helpers::create_product(&ctx, category.uuid, "Road Glide", 12_000, 5).await?;
        let identity = guest("merge")?;

        ctx.carts.add_or_merge(identity.clone(), product.uuid, 2).await?;
        let line = ctx.carts.add_or_merge(identity.clone(), product.uuid, 1).await?;

        assert_eq!(line.quantity, 3);

        let cart = ctx.carts.get_cart(identity).await?;

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.total_amount(), 36_000);

        Ok(())
    }

    #[tokio::test]
    async fn adding_beyond_stock_is_rejected_with_counts() -> TestResult {
        let ctx = TestContext::new().await;
        let category = helpers::create_category(&ctx, "running").await?;
        let product = helpers::create_product(&ctx, category.uuid, "Road Glide", 12_000, 3).await?;
        let identity = guest("stock")?;

        ctx.carts.add_or_merge(identity.clone(), product.uuid, 2).await?;

        let result = ctx.carts.add_or_merge(identity.clone(), product.uuid, 2).await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::OutOfStock {
                    requested: 4,
                    available: 3
                })
            ),
            "expected OutOfStock, got {result:?}"
        );

        let cart = ctx.carts.get_cart(identity).await?;

        assert_eq!(cart.item_count(), 2, "rejected add must not change the line");

        Ok(())
    }

    #[tokio::test]
    async fn adding_zero_or_unknown_product_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let identity = guest("rejects")?;

        let zero = ctx
            .carts
            .add_or_merge(identity.clone(), ProductUuid::new(), 0)
            .await;

        assert!(
            matches!(zero, Err(CartsServiceError::InvalidQuantity)),
            "expected InvalidQuantity, got {zero:?}"
        );

        let unknown = ctx
            .carts
            .add_or_merge(identity, ProductUuid::new(), 1)
            .await;

        assert!(
            matches!(unknown, Err(CartsServiceError::ProductNotFound)),
            "expected ProductNotFound, got {unknown:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn merged_lines_keep_their_price_snapshot() -> TestResult {
        let ctx = TestContext::new().await;
        let category = helpers::create_category(&ctx, "running").await?;
        let product = helpers::create_product(&ctx, category.uuid, "Road Glide", 12_000, 5).await?;
        let identity = guest("snapshot")?;

        ctx.carts.add_or_merge(identity.clone(), product.uuid, 1).await?;

        sqlx::query("UPDATE products SET price = 9000 WHERE uuid = $1")
            .bind(product.uuid.into_uuid())
            .execute(ctx.db.pool())
            .await?;

        let line = ctx.carts.add_or_merge(identity, product.uuid, 1).await?;

        assert_eq!(line.unit_price, 12_000);
        assert_eq!(line.line_total(), 24_000);

        Ok(())
    }

    #[tokio::test]
    async fn set_quantity_is_absolute_and_zero_removes() -> TestResult {
        let ctx = TestContext::new().await;
        let category = helpers::create_category(&ctx, "running").await?;
        let product = helpers::create_product(&ctx, category.uuid, "Road Glide", 12_000, 5).await?;
        let identity = guest("set")?;

        ctx.carts.add_or_merge(identity.clone(), product.uuid, 2).await?;

        let line = ctx
            .carts
            .set_quantity(identity.clone(), product.uuid, 4)
            .await?;

        assert_eq!(line.map(|l| l.quantity), Some(4));

        let removed = ctx
            .carts
            .set_quantity(identity.clone(), product.uuid, 0)
            .await?;

        assert!(removed.is_none());
        assert!(ctx.carts.get_cart(identity).await?.lines.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn set_quantity_on_missing_line_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let identity = guest("missing")?;

        let result = ctx
            .carts
            .set_quantity(identity, ProductUuid::new(), 2)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn remove_and_clear_are_idempotent() -> TestResult {
        let ctx = TestContext::new().await;
        let category = helpers::create_category(&ctx, "running").await?;
        let first = helpers::create_product(&ctx, category.uuid, "Road Glide", 12_000, 5).await?;
        let second = helpers::create_product(&ctx, category.uuid, "Tempo Flyer", 9_000, 5).await?;
        let identity = guest("idempotent")?;

        ctx.carts.remove_line(identity.clone(), first.uuid).await?;
        ctx.carts.clear(identity.clone()).await?;

        ctx.carts.add_or_merge(identity.clone(), first.uuid, 1).await?;
        ctx.carts.add_or_merge(identity.clone(), second.uuid, 1).await?;

        ctx.carts.remove_line(identity.clone(), first.uuid).await?;
        ctx.carts.remove_line(identity.clone(), first.uuid).await?;

        assert_eq!(ctx.carts.get_cart(identity.clone()).await?.lines.len(), 1);

        ctx.carts.clear(identity.clone()).await?;
        ctx.carts.clear(identity.clone()).await?;

        assert!(ctx.carts.get_cart(identity).await?.lines.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn user_and_session_carts_are_separate() -> TestResult {
        let ctx = TestContext::new().await;
        let category = helpers::create_category(&ctx, "running").await?;
        let product = helpers::create_product(&ctx, category.uuid, "Road Glide", 12_000, 5).await?;
        let user = helpers::create_user(&ctx, "runner@example.com").await?;

        ctx.carts
            .add_or_merge(CartIdentity::User(user.uuid), product.uuid, 1)
            .await?;

        let guest_cart = ctx.carts.get_cart(guest("anon")?).await?;
        let user_cart = ctx.carts.get_cart(CartIdentity::User(user.uuid)).await?;

        assert!(guest_cart.lines.is_empty());
        assert_eq!(user_cart.item_count(), 1);
        assert_eq!(user_cart.user_uuid, Some(user.uuid));

        Ok(())
    }

    #[tokio::test]
    async fn purge_abandoned_only_removes_stale_session_carts() -> TestResult {
        let ctx = TestContext::new().await;
        let user = helpers::create_user(&ctx, "keeper@example.com").await?;

        let stale = ctx.carts.get_cart(guest("stale")?).await?;
        ctx.carts.get_cart(CartIdentity::User(user.uuid)).await?;

        sqlx::query("UPDATE carts SET updated_at = now() - interval '40 days'")
            .execute(ctx.db.pool())
            .await?;

        ctx.carts.get_cart(guest("fresh")?).await?;

        let cutoff = Timestamp::now().checked_sub(JiffSpan::new().hours(24 * 30))?;
        let purged = ctx.carts.purge_abandoned(cutoff).await?;

        assert_eq!(purged, 1);

        let recreated = ctx.carts.get_cart(guest("stale")?).await?;

        assert_ne!(recreated.uuid, stale.uuid);

        let kept = ctx.carts.get_cart(CartIdentity::User(user.uuid)).await?;

        assert_eq!(kept.user_uuid, Some(user.uuid));

        Ok(())
    }
}
