//! Optimistic cart projection reconciled with the server cart.
//!
//! The UI reads and mutates the local projection synchronously. Once the
//! engine has synced with the server, every mutation is also pushed to the
//! server in the background. Pushes are never retried and a failed push never
//! rolls the projection back; failures are logged and published on the
//! [`SyncEvent`] channel so a UI can show a non-blocking notice. Local and
//! server carts may drift until the next [`CartEngine::sync_with_server`].

use std::{fmt, num::NonZeroU32, sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{
    runtime::Handle,
    sync::broadcast,
    task::JoinSet,
    time,
};
use tracing::{Instrument, debug, debug_span, info, warn};

use crate::{
    ids::{BearerToken, CartOwner, LineId, ProductId, SessionId},
    models::{self, CartLine, PersistedCart},
    remote::{RemoteCart, RemoteCartError, ServerCart},
    store::LocalStore,
};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const EVENT_CAPACITY: usize = 64;

/// Tunables for a [`CartEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Upper bound on every server call, after which it counts as failed.
    pub request_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Where the engine is in its hydrate and sync lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Constructed; local storage not read yet.
    Uninitialized,

    /// Projection loaded from local storage; mutations stay local.
    HydratedUnsynced,

    /// Fetching the server cart.
    Syncing,

    /// Reconciled at least once; mutations are pushed in the background.
    HydratedSynced,
}

/// A server call issued on behalf of the projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOperation {
    /// Add `quantity` units, merging into an existing line.
    AddOrMerge {
        /// Product being added.
        product: ProductId,
        /// Units added, not the merged total.
        quantity: NonZeroU32,
    },

    /// Set an absolute quantity.
    SetQuantity {
        /// Product whose line changes.
        product: ProductId,
        /// New quantity; zero removes the line.
        quantity: u32,
    },

    /// Remove the line for `product`.
    RemoveLine {
        /// Product whose line is removed.
        product: ProductId,
    },

    /// Remove every line.
    Clear,

    /// Read the whole server cart.
    Fetch,
}

impl CartOperation {
    /// Stable name used in logs and notices.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddOrMerge { .. } => "add_or_merge",
            Self::SetQuantity { .. } => "set_quantity",
            Self::RemoveLine { .. } => "remove_line",
            Self::Clear => "clear",
            Self::Fetch => "fetch",
        }
    }
}

/// Outcome of a server call, published to [`CartEngine::subscribe`] receivers.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// The projection was replaced by the server cart.
    Synced {
        /// Units in the replaced projection.
        item_count: u64,
    },

    /// A background push was acknowledged.
    Pushed(CartOperation),

    /// A server call failed. The projection was left as it was.
    Failed {
        /// The call that failed.
        operation: CartOperation,

        /// Why it failed.
        error: Arc<RemoteCartError>,
    },
}

/// Why [`CartEngine::sync_with_server`] left the projection alone.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The server cart could not be fetched.
    #[error("failed to fetch the server cart")]
    Remote(#[source] Arc<RemoteCartError>),

    /// The server reported a line the projection cannot hold.
    #[error("server cart has a zero quantity line for product {0}")]
    ZeroQuantity(ProductId),
}

/// The client's cart. One instance per client session, owned by whoever
/// drives the UI.
///
/// Background pushes run on `runtime` and are tracked by the engine; call
/// [`CartEngine::settle`] before dropping it or pending pushes are aborted.
pub struct CartEngine<S> {
    store: S,
    remote: Arc<dyn ServerCart>,
    runtime: Handle,
    settings: EngineSettings,
    session_id: SessionId,
    bearer: Option<BearerToken>,
    lines: Vec<CartLine>,
    state: SyncState,
    events: broadcast::Sender<SyncEvent>,
    in_flight: JoinSet<()>,
}

impl<S> fmt::Debug for CartEngine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartEngine")
            .field("session_id", &self.session_id)
            .field("signed_in", &self.bearer.is_some())
            .field("lines", &self.lines)
            .field("state", &self.state)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl<S: LocalStore<PersistedCart>> CartEngine<S> {
    /// Build an engine with a fresh session id. Nothing is read from `store`
    /// until [`CartEngine::hydrate`] or the first mutation.
    #[must_use]
    pub fn new(
        store: S,
        remote: Arc<dyn ServerCart>,
        runtime: Handle,
        settings: EngineSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            store,
            remote,
            runtime,
            settings,
            session_id: SessionId::generate(),
            bearer: None,
            lines: Vec::new(),
            state: SyncState::Uninitialized,
            events,
            in_flight: JoinSet::new(),
        }
    }

    /// Load the projection from local storage. A first run keeps the freshly
    /// generated session id and persists it; an unreadable document is
    /// discarded.
    pub fn hydrate(&mut self) {
        match self.store.load() {
            Ok(Some(persisted)) => {
                self.session_id = persisted.session_id;
                self.lines = persisted.lines;
            }
            Ok(None) => {
                self.lines.clear();
                self.persist();
            }
            Err(error) => {
                warn!(%error, "discarding unreadable local cart");
                self.lines.clear();
                self.persist();
            }
        }

        self.state = SyncState::HydratedUnsynced;

        debug!(
            session_id = %self.session_id,
            lines = self.lines.len(),
            "cart hydrated"
        );
    }

    fn ensure_hydrated(&mut self) {
        if self.state == SyncState::Uninitialized {
            self.hydrate();
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// The anonymous session this client owns.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Whether mutations go to a customer's cart rather than the session's.
    pub fn is_signed_in(&self) -> bool {
        self.bearer.is_some()
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `product`, if the projection holds one.
    pub fn line(&self, product: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product)
    }

    /// Sum of `unit_price * quantity`, in minor units.
    pub fn get_total(&self) -> u64 {
        models::total_amount(&self.lines)
    }

    /// Sum of line quantities.
    pub fn item_count(&self) -> u64 {
        models::item_count(&self.lines)
    }

    /// The local store backing the projection.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Observe background sync outcomes. Events published before the call are
    /// not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Add units of `product`, merging into its existing line if there is one.
    /// A merged line keeps the price it already had. An add that would push
    /// the merged quantity past `u32::MAX` is refused and leaves the cart as
    /// it was.
    pub fn add_line(&mut self, product: ProductId, unit_price: u64, quantity: NonZeroU32) {
        self.ensure_hydrated();

        match self.lines.iter_mut().find(|line| line.product_id == product) {
            Some(line) => {
                let Some(merged) = line.quantity.checked_add(quantity.get()) else {
                    warn!(
                        %product,
                        current = line.quantity.get(),
                        added = quantity.get(),
                        "refusing add; merged quantity would overflow"
                    );
                    return;
                };

                line.quantity = merged;
            }
            None => self.lines.push(CartLine {
                line_id: LineId::generate(),
                product_id: product,
                quantity,
                unit_price,
            }),
        }

        self.persist();
        self.push(CartOperation::AddOrMerge { product, quantity });
    }

    /// Set an absolute quantity. Zero removes the line; a product with no
    /// local line is ignored.
    pub fn update_quantity(&mut self, product: ProductId, quantity: u32) {
        self.ensure_hydrated();

        let Some(quantity) = NonZeroU32::new(quantity) else {
            self.remove_line(product);
            return;
        };

        let Some(line) = self.lines.iter_mut().find(|line| line.product_id == product) else {
            debug!(%product, "no local line to update");
            return;
        };

        line.quantity = quantity;

        self.persist();
        self.push(CartOperation::SetQuantity {
            product,
            quantity: quantity.get(),
        });
    }

    /// Drop the line for `product`. Removing an absent line still pushes, so
    /// the server converges.
    pub fn remove_line(&mut self, product: ProductId) {
        self.ensure_hydrated();

        self.lines.retain(|line| line.product_id != product);

        self.persist();
        self.push(CartOperation::RemoveLine { product });
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.ensure_hydrated();

        self.lines.clear();

        self.persist();
        self.push(CartOperation::Clear);
    }

    /// Switch to the signed-in customer's cart. The projection is kept until
    /// the next [`CartEngine::sync_with_server`] replaces it.
    pub fn sign_in(&mut self, token: BearerToken) {
        self.ensure_hydrated();

        self.bearer = Some(token);
        self.state = SyncState::HydratedUnsynced;
    }

    /// Return to the anonymous session cart.
    pub fn sign_out(&mut self) {
        self.ensure_hydrated();

        self.bearer = None;
        self.state = SyncState::HydratedUnsynced;
    }

    /// Wait for every background push issued so far.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            if let Err(error) = joined {
                warn!(%error, "cart sync task did not complete");
            }
        }
    }

    /// Replace the projection with the server cart for the current owner.
    /// Anything mutated locally and not yet pushed is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the server cart cannot be fetched in time or
    /// is malformed. The projection is left untouched and the engine stays
    /// unsynced.
    pub async fn sync_with_server(&mut self) -> Result<(), SyncError> {
        self.ensure_hydrated();
        self.settle().await;

        self.state = SyncState::Syncing;

        let fetched = time::timeout(
            self.settings.request_timeout,
            self.remote.get_cart(self.owner()),
        )
        .await
        .unwrap_or(Err(RemoteCartError::Timeout));

        let lines = match fetched {
            Ok(cart) => lines_from_remote(cart),
            Err(error) => Err(SyncError::Remote(Arc::new(error))),
        };

        match lines {
            Ok(lines) => {
                self.lines = lines;
                self.state = SyncState::HydratedSynced;
                self.persist();

                info!(
                    signed_in = self.bearer.is_some(),
                    item_count = self.item_count(),
                    total = self.get_total(),
                    "cart synced with server"
                );

                publish(
                    &self.events,
                    SyncEvent::Synced {
                        item_count: self.item_count(),
                    },
                );

                Ok(())
            }
            Err(error) => {
                self.state = SyncState::HydratedUnsynced;

                warn!(%error, "cart sync failed; keeping local cart");

                if let SyncError::Remote(remote) = &error {
                    publish(
                        &self.events,
                        SyncEvent::Failed {
                            operation: CartOperation::Fetch,
                            error: Arc::clone(remote),
                        },
                    );
                }

                Err(error)
            }
        }
    }

    fn owner(&self) -> CartOwner {
        match &self.bearer {
            Some(token) => CartOwner::User(token.clone()),
            None => CartOwner::Session(self.session_id.clone()),
        }
    }

    fn persist(&mut self) {
        let document = PersistedCart {
            session_id: self.session_id.clone(),
            lines: self.lines.clone(),
        };

        if let Err(error) = self.store.save(&document) {
            warn!(%error, "failed to persist local cart");
        }
    }

    fn push(&mut self, operation: CartOperation) {
        if self.state != SyncState::HydratedSynced {
            debug!(operation = operation.name(), "not synced yet; keeping change local");
            return;
        }

        while self.in_flight.try_join_next().is_some() {}

        let remote = Arc::clone(&self.remote);
        let owner = self.owner();
        let events = self.events.clone();
        let timeout = self.settings.request_timeout;
        let span = debug_span!("cart.sync.push", operation = operation.name());

        self.in_flight.spawn_on(
            async move {
                let result = time::timeout(timeout, apply(remote.as_ref(), owner, &operation))
                    .await
                    .unwrap_or(Err(RemoteCartError::Timeout));

                match result {
                    Ok(()) => {
                        debug!("server acknowledged cart change");
                        publish(&events, SyncEvent::Pushed(operation));
                    }
                    Err(error) => {
                        warn!(%error, ?operation, "cart sync failed; local cart kept");
                        publish(
                            &events,
                            SyncEvent::Failed {
                                operation,
                                error: Arc::new(error),
                            },
                        );
                    }
                }
            }
            .instrument(span),
            &self.runtime,
        );
    }
}

async fn apply(
    remote: &dyn ServerCart,
    owner: CartOwner,
    operation: &CartOperation,
) -> Result<(), RemoteCartError> {
    match *operation {
        CartOperation::AddOrMerge { product, quantity } => {
            remote.add_or_merge(owner, product, quantity).await
        }
        CartOperation::SetQuantity { product, quantity } => {
            remote.set_quantity(owner, product, quantity).await
        }
        CartOperation::RemoveLine { product } => remote.remove_line(owner, product).await,
        CartOperation::Clear => remote.clear(owner).await,
        CartOperation::Fetch => remote.get_cart(owner).await.map(drop),
    }
}

fn lines_from_remote(cart: RemoteCart) -> Result<Vec<CartLine>, SyncError> {
    cart.lines
        .into_iter()
        .map(|line| {
            let product_id = ProductId::from_uuid(line.product_uuid);

            Ok(CartLine {
                line_id: LineId::from_uuid(line.uuid),
                product_id,
                quantity: NonZeroU32::new(line.quantity)
                    .ok_or(SyncError::ZeroQuantity(product_id))?,
                unit_price: line.unit_price,
            })
        })
        .collect()
}

fn publish(events: &broadcast::Sender<SyncEvent>, event: SyncEvent) {
    if events.send(event).is_err() {
        debug!("no sync event subscribers");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use testresult::TestResult;
    use tokio::sync::Notify;
    use uuid::Uuid;

    use crate::{
        remote::{MockServerCart, RemoteCartLine},
        store::{JsonFileStore, MemoryStore},
    };

    use super::*;

    type TestEngine = CartEngine<MemoryStore<PersistedCart>>;

    fn engine(remote: impl ServerCart + 'static) -> TestEngine {
        engine_with(remote, EngineSettings::default())
    }

    fn engine_with(remote: impl ServerCart + 'static, settings: EngineSettings) -> TestEngine {
        let mut engine = CartEngine::new(
            MemoryStore::new(),
            Arc::new(remote),
            Handle::current(),
            settings,
        );

        engine.hydrate();
        engine
    }

    fn expect_empty_server_cart(remote: &mut MockServerCart) {
        remote
            .expect_get_cart()
            .times(1)
            .returning(|_| Ok(RemoteCart::default()));
    }

    fn product() -> ProductId {
        ProductId::from_uuid(Uuid::now_v7())
    }

    fn qty(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[tokio::test]
    async fn repeated_adds_merge_into_one_line() {
        let mut engine = engine(MockServerCart::new());
        let shoe = product();

        for n in [1, 2, 3, 4] {
            engine.add_line(shoe, 8_999, qty(n));
        }

        assert_eq!(engine.lines().len(), 1);
        assert_eq!(engine.line(shoe).map(|l| l.quantity.get()), Some(10));
    }

    #[tokio::test]
    async fn merged_lines_keep_their_first_price() {
        let mut engine = engine(MockServerCart::new());
        let shoe = product();

        engine.add_line(shoe, 8_999, qty(1));
        engine.add_line(shoe, 7_500, qty(1));

        assert_eq!(engine.get_total(), 2 * 8_999);
    }

    #[tokio::test]
    async fn add_then_zero_walkthrough() {
        let mut engine = engine(MockServerCart::new());
        let shoe = product();

        engine.add_line(shoe, 1_000, qty(2));

        assert_eq!(engine.item_count(), 2);
        assert_eq!(engine.get_total(), 2_000);

        engine.add_line(shoe, 1_000, qty(1));

        assert_eq!(engine.item_count(), 3);
        assert_eq!(engine.get_total(), 3_000);

        engine.update_quantity(shoe, 0);

        assert_eq!(engine.item_count(), 0);
        assert!(engine.line(shoe).is_none(), "line should be removed");
    }

    #[tokio::test]
    async fn totals_follow_every_mutation() {
        let mut engine = engine(MockServerCart::new());
        let (trail, court, road) = (product(), product(), product());

        engine.add_line(trail, 12_000, qty(1));
        engine.add_line(court, 9_500, qty(2));
        engine.add_line(road, 4_999, qty(3));

        assert_eq!(engine.item_count(), 6);
        assert_eq!(engine.get_total(), 12_000 + 19_000 + 14_997);

        engine.update_quantity(court, 5);

        assert_eq!(engine.item_count(), 9);
        assert_eq!(engine.get_total(), 12_000 + 47_500 + 14_997);

        engine.remove_line(trail);

        assert_eq!(engine.item_count(), 8);
        assert_eq!(engine.get_total(), 47_500 + 14_997);

        engine.clear();

        assert_eq!(engine.item_count(), 0);
        assert_eq!(engine.get_total(), 0);
    }

    #[tokio::test]
    async fn updating_a_missing_line_does_nothing() -> TestResult {
        let mut remote = MockServerCart::new();

        expect_empty_server_cart(&mut remote);
        remote.expect_set_quantity().never();

        let mut engine = engine(remote);

        engine.sync_with_server().await?;
        engine.update_quantity(product(), 3);
        engine.settle().await;

        assert!(engine.lines().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn unsynced_mutations_stay_local() {
        // no expectations: any server call would panic the push task
        let mut engine = engine(MockServerCart::new());
        let shoe = product();

        engine.add_line(shoe, 1_000, qty(1));
        engine.update_quantity(shoe, 4);
        engine.remove_line(shoe);
        engine.clear();
        engine.settle().await;

        assert_eq!(engine.state(), SyncState::HydratedUnsynced);
    }

    #[tokio::test]
    async fn clearing_an_empty_cart_is_harmless() -> TestResult {
        let mut remote = MockServerCart::new();

        expect_empty_server_cart(&mut remote);
        remote.expect_clear().times(2).returning(|_| Ok(()));

        let mut engine = engine(remote);

        engine.sync_with_server().await?;

        let mut events = engine.subscribe();

        engine.clear();
        engine.clear();
        engine.settle().await;

        assert!(engine.lines().is_empty());

        for _ in 0..2 {
            let event = events.recv().await?;

            assert!(
                matches!(event, SyncEvent::Pushed(CartOperation::Clear)),
                "expected a clear acknowledgement, got {event:?}"
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn sync_replaces_the_local_projection() -> TestResult {
        let server_line = RemoteCartLine {
            uuid: Uuid::now_v7(),
            product_uuid: Uuid::now_v7(),
            quantity: 2,
            unit_price: 6_500,
            line_total: 13_000,
        };

        let mut remote = MockServerCart::new();
        let returned = server_line.clone();

        remote.expect_get_cart().times(1).returning(move |_| {
            Ok(RemoteCart {
                lines: vec![returned.clone()],
                item_count: 2,
                total_amount: 13_000,
            })
        });

        let mut engine = engine(remote);
        let local_only = product();

        engine.add_line(local_only, 1_000, qty(5));
        engine.sync_with_server().await?;

        assert_eq!(engine.state(), SyncState::HydratedSynced);
        assert_eq!(
            engine.lines(),
            [CartLine {
                line_id: LineId::from_uuid(server_line.uuid),
                product_id: ProductId::from_uuid(server_line.product_uuid),
                quantity: qty(2),
                unit_price: 6_500,
            }]
        );
        assert!(engine.line(local_only).is_none(), "local line should be gone");
        assert_eq!(
            engine.store().value().map(|doc| doc.lines.len()),
            Some(1),
            "synced projection should be persisted"
        );

        Ok(())
    }

    #[tokio::test]
    async fn synced_mutations_push_to_the_owner_session() -> TestResult {
        let mut remote = MockServerCart::new();
        let shoe = product();

        expect_empty_server_cart(&mut remote);
        remote
            .expect_add_or_merge()
            .withf(move |owner, product, quantity| {
                matches!(owner, CartOwner::Session(_)) && *product == shoe && quantity.get() == 2
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        remote
            .expect_set_quantity()
            .withf(move |_, product, quantity| *product == shoe && *quantity == 7)
            .times(1)
            .returning(|_, _, _| Ok(()));
        remote
            .expect_remove_line()
            .withf(move |_, product| *product == shoe)
            .times(1)
            .returning(|_, _| Ok(()));

        let mut engine = engine(remote);

        engine.sync_with_server().await?;
        engine.add_line(shoe, 1_000, qty(2));
        engine.update_quantity(shoe, 7);
        engine.update_quantity(shoe, 0);
        engine.settle().await;

        assert!(engine.lines().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn overflowing_merge_is_refused_and_not_pushed() -> TestResult {
        let mut remote = MockServerCart::new();
        let shoe = product();

        expect_empty_server_cart(&mut remote);
        remote
            .expect_add_or_merge()
            .withf(|_, _, quantity| quantity.get() == u32::MAX)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut engine = engine(remote);

        engine.sync_with_server().await?;
        engine.add_line(shoe, 100, qty(u32::MAX));

        let saves = engine.store().saves();

        engine.add_line(shoe, 100, qty(1));
        engine.settle().await;

        assert_eq!(engine.line(shoe).map(|l| l.quantity.get()), Some(u32::MAX));
        assert_eq!(engine.store().saves(), saves, "refused add must not persist");

        Ok(())
    }

    #[tokio::test]
    async fn failed_push_keeps_local_state_and_reports() -> TestResult {
        let mut remote = MockServerCart::new();
        let shoe = product();

        expect_empty_server_cart(&mut remote);
        remote
            .expect_add_or_merge()
            .times(1)
            .returning(|_, _, _| Err(RemoteCartError::Rejected("out of stock".to_string())));

        let mut engine = engine(remote);

        engine.sync_with_server().await?;

        let mut events = engine.subscribe();

        engine.add_line(shoe, 1_000, qty(3));
        engine.settle().await;

        assert_eq!(engine.item_count(), 3, "failed push must not roll back");

        let event = events.recv().await?;

        assert!(
            matches!(
                &event,
                SyncEvent::Failed {
                    operation: CartOperation::AddOrMerge { product, .. },
                    error,
                } if *product == shoe && matches!(**error, RemoteCartError::Rejected(_))
            ),
            "expected a failed add event, got {event:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn failed_sync_keeps_projection_and_state() {
        let mut remote = MockServerCart::new();

        remote
            .expect_get_cart()
            .times(1)
            .returning(|_| Err(RemoteCartError::UnexpectedStatus(503)));

        let mut engine = engine(remote);
        let mut events = engine.subscribe();
        let shoe = product();

        engine.add_line(shoe, 1_000, qty(1));

        let result = engine.sync_with_server().await;

        assert!(
            matches!(result, Err(SyncError::Remote(_))),
            "expected a remote error, got {result:?}"
        );
        assert_eq!(engine.state(), SyncState::HydratedUnsynced);
        assert_eq!(engine.item_count(), 1);
        assert!(
            matches!(
                events.try_recv(),
                Ok(SyncEvent::Failed {
                    operation: CartOperation::Fetch,
                    ..
                })
            ),
            "sync failure should be published"
        );
    }

    #[tokio::test]
    async fn zero_quantity_server_lines_are_rejected() {
        let mut remote = MockServerCart::new();

        remote.expect_get_cart().times(1).returning(|_| {
            Ok(RemoteCart {
                lines: vec![RemoteCartLine {
                    uuid: Uuid::now_v7(),
                    product_uuid: Uuid::now_v7(),
                    quantity: 0,
                    unit_price: 1_000,
                    line_total: 0,
                }],
                item_count: 0,
                total_amount: 0,
            })
        });

        let mut engine = engine(remote);
        let result = engine.sync_with_server().await;

        assert!(
            matches!(result, Err(SyncError::ZeroQuantity(_))),
            "expected ZeroQuantity, got {result:?}"
        );
        assert_eq!(engine.state(), SyncState::HydratedUnsynced);
    }

    /// Holds every add until released.
    #[derive(Default)]
    struct GatedServerCart {
        release: Notify,
        acknowledged: AtomicBool,
    }

    #[async_trait]
    impl ServerCart for Arc<GatedServerCart> {
        async fn get_cart(&self, _owner: CartOwner) -> Result<RemoteCart, RemoteCartError> {
            Ok(RemoteCart::default())
        }

        async fn add_or_merge(
            &self,
            _owner: CartOwner,
            _product: ProductId,
            _quantity: NonZeroU32,
        ) -> Result<(), RemoteCartError> {
            self.release.notified().await;
            self.acknowledged.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn set_quantity(
            &self,
            _owner: CartOwner,
            _product: ProductId,
            _quantity: u32,
        ) -> Result<(), RemoteCartError> {
            Ok(())
        }

        async fn remove_line(
            &self,
            _owner: CartOwner,
            _product: ProductId,
        ) -> Result<(), RemoteCartError> {
            Ok(())
        }

        async fn clear(&self, _owner: CartOwner) -> Result<(), RemoteCartError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn reads_reflect_mutations_before_the_server_answers() -> TestResult {
        let gate = Arc::new(GatedServerCart::default());
        let mut engine = engine(Arc::clone(&gate));

        engine.sync_with_server().await?;
        engine.add_line(product(), 2_500, qty(2));

        assert_eq!(engine.item_count(), 2);
        assert_eq!(engine.get_total(), 5_000);
        assert!(
            !gate.acknowledged.load(Ordering::SeqCst),
            "server should not have answered yet"
        );

        gate.release.notify_one();
        engine.settle().await;

        assert!(gate.acknowledged.load(Ordering::SeqCst));

        Ok(())
    }

    #[tokio::test]
    async fn slow_pushes_time_out_without_rollback() -> TestResult {
        let gate = Arc::new(GatedServerCart::default());
        let mut engine = engine_with(
            Arc::clone(&gate),
            EngineSettings {
                request_timeout: Duration::from_millis(20),
            },
        );

        engine.sync_with_server().await?;

        let mut events = engine.subscribe();

        engine.add_line(product(), 2_500, qty(1));
        engine.settle().await;

        assert_eq!(engine.item_count(), 1);

        let event = events.recv().await?;

        assert!(
            matches!(&event, SyncEvent::Failed { error, .. } if matches!(**error, RemoteCartError::Timeout)),
            "expected a timeout, got {event:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn hydrate_restores_persisted_cart() {
        let session_id = SessionId::generate();
        let line = CartLine {
            line_id: LineId::generate(),
            product_id: product(),
            quantity: qty(2),
            unit_price: 3_000,
        };

        let mut engine = CartEngine::new(
            MemoryStore::with_value(PersistedCart {
                session_id: session_id.clone(),
                lines: vec![line.clone()],
            }),
            Arc::new(MockServerCart::new()),
            Handle::current(),
            EngineSettings::default(),
        );

        assert_eq!(engine.state(), SyncState::Uninitialized);

        engine.hydrate();

        assert_eq!(engine.state(), SyncState::HydratedUnsynced);
        assert_eq!(engine.session_id(), &session_id);
        assert_eq!(engine.lines(), [line]);
        assert_eq!(engine.get_total(), 6_000);
    }

    #[tokio::test]
    async fn first_run_persists_a_new_session() {
        let engine = engine(MockServerCart::new());

        assert_eq!(engine.store().saves(), 1);
        assert_eq!(
            engine.store().value().map(|doc| &doc.session_id),
            Some(engine.session_id())
        );
    }

    #[tokio::test]
    async fn mutations_hydrate_on_demand() {
        let mut engine = CartEngine::new(
            MemoryStore::new(),
            Arc::new(MockServerCart::new()),
            Handle::current(),
            EngineSettings::default(),
        );

        engine.add_line(product(), 1_000, qty(1));

        assert_eq!(engine.state(), SyncState::HydratedUnsynced);
        assert_eq!(engine.item_count(), 1);
    }

    #[tokio::test]
    async fn corrupt_local_cart_starts_fresh() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("cart.json");

        std::fs::write(&path, "{ not json")?;

        let mut engine = CartEngine::new(
            JsonFileStore::<PersistedCart>::new(&path),
            Arc::new(MockServerCart::new()),
            Handle::current(),
            EngineSettings::default(),
        );

        engine.hydrate();

        assert!(engine.lines().is_empty());

        let repaired = engine.store().load()?;

        assert_eq!(
            repaired.map(|doc| doc.session_id),
            Some(engine.session_id().clone())
        );

        Ok(())
    }

    #[tokio::test]
    async fn signing_in_switches_the_synced_owner() -> TestResult {
        let mut remote = MockServerCart::new();

        remote
            .expect_get_cart()
            .withf(|owner| matches!(owner, CartOwner::Session(_)))
            .times(1)
            .returning(|_| Ok(RemoteCart::default()));
        remote
            .expect_get_cart()
            .withf(|owner| matches!(owner, CartOwner::User(token) if token.expose() == "st_v1_abc.def"))
            .times(1)
            .returning(|_| Ok(RemoteCart::default()));
        remote
            .expect_add_or_merge()
            .withf(|owner, _, _| matches!(owner, CartOwner::User(_)))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut engine = engine(remote);

        engine.sync_with_server().await?;
        engine.sign_in(BearerToken::new("st_v1_abc.def"));

        assert_eq!(engine.state(), SyncState::HydratedUnsynced);
        assert!(engine.is_signed_in());

        engine.sync_with_server().await?;
        engine.add_line(product(), 1_000, qty(1));
        engine.settle().await;

        engine.sign_out();

        assert!(!engine.is_signed_in());
        assert_eq!(engine.state(), SyncState::HydratedUnsynced);

        Ok(())
    }
}
