use std::{num::NonZeroU32, sync::Arc};

use stride_cart::{
    config::CartClientConfig,
    engine::{CartEngine, CartOperation, SyncEvent},
    ids::ProductId,
    models::PersistedCart,
    remote::{HttpServerCart, RemoteCartError},
    store::{JsonFileStore, LocalStore},
};
use tokio::{
    runtime::Handle,
    sync::broadcast::{Receiver, error::TryRecvError},
};
use tracing::warn;

use crate::cli::Command;

pub(crate) async fn run(
    config: &CartClientConfig,
    offline: bool,
    command: Command,
) -> Result<(), String> {
    let remote = HttpServerCart::new(config.server_url.as_str(), config.request_timeout())
        .map_err(|error| format!("failed to build HTTP client: {error}"))?;

    let mut engine = CartEngine::new(
        JsonFileStore::new(config.cart_path()),
        Arc::new(remote.clone()),
        Handle::current(),
        config.engine_settings(),
    );

    engine.hydrate();

    if let Some(token) = config.bearer() {
        engine.sign_in(token);
    }

    let mut events = engine.subscribe();

    if !offline && let Err(error) = engine.sync_with_server().await {
        warn!(%error, "working from the local cart");
    }

    match command {
        Command::Show | Command::Sync | Command::Wishlist { .. } => {}
        Command::Add {
            product,
            quantity,
            price,
        } => {
            let quantity =
                NonZeroU32::new(quantity).ok_or("quantity must be at least 1".to_string())?;
            let unit_price = unit_price(&remote, offline, product, price).await?;

            engine.add_line(product, unit_price, quantity);
        }
        Command::Set { product, quantity } => engine.update_quantity(product, quantity),
        Command::Remove { product } => engine.remove_line(product),
        Command::Clear => engine.clear(),
    }

    engine.settle().await;

    for (operation, error) in drain_failures(&mut events) {
        eprintln!(
            "warning: {} was not saved to the server ({error}); the local cart keeps it",
            operation.name()
        );
    }

    print_cart(&engine);

    Ok(())
}

async fn unit_price(
    remote: &HttpServerCart,
    offline: bool,
    product: ProductId,
    price: Option<u64>,
) -> Result<u64, String> {
    match (price, offline) {
        (Some(price), _) => Ok(price),
        (None, true) => Err("--price is required when offline".to_string()),
        (None, false) => remote
            .get_product(product)
            .await
            .map(|found| found.price)
            .map_err(|error| format!("failed to look up product {product}: {error}")),
    }
}

fn print_cart<S: LocalStore<PersistedCart>>(engine: &CartEngine<S>) {
    println!("session: {}", engine.session_id());
    println!("state: {:?}", engine.state());

    for line in engine.lines() {
        println!(
            "{}  x{}  @ {}  = {}",
            line.product_id,
            line.quantity,
            format_amount(line.unit_price),
            format_amount(line.line_total())
        );
    }

    println!("items: {}", engine.item_count());
    println!("total: {}", format_amount(engine.get_total()));
}

/// Every failure still buffered. A lagged receiver skips the overwritten
/// events and keeps reading.
fn drain_failures(events: &mut Receiver<SyncEvent>) -> Vec<(CartOperation, Arc<RemoteCartError>)> {
    let mut failures = Vec::new();

    loop {
        match events.try_recv() {
            Ok(SyncEvent::Failed { operation, error }) => failures.push((operation, error)),
            Ok(_) => {}
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "some sync notices were dropped");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }

    failures
}

fn format_amount(minor: u64) -> String {
    format!("{}.{:02}", minor / 100, minor % 100)
}
