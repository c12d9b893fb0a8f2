//! # Cart Demo
//!
//! Sizes a label text the way the live preview does, then walks a cart
//! through add and remove, submits the order when an order webhook is
//! configured, and clears the cart.
//!
//! ## Usage
//! ```bash
//! # Offline, against the in-memory cart
//! cargo run -p label-cart --bin cart-demo -- --text "Müller"
//!
//! # Against the shop configured in storefront.toml / TONNENTEXT_* env
//! cargo run -p label-cart --bin cart-demo -- --config ./storefront.toml
//! ```
//!
//! Log output is controlled with `RUST_LOG` (default `info`).

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use label_cart::{
    CartBackend, CartPoller, CartStore, FileSessionStorage, InMemoryBackend,
    MemorySessionStorage, OrderSubmitter, SessionStorage, StorefrontClient, StorefrontConfig,
};
use label_core::label::CartSnapshot;
use label_core::print::PrintLayout;
use label_core::sizing::{DeterministicTextMeasurer, SizingState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Preview box of the configurator, in CSS pixels.
const PREVIEW_WIDTH: f64 = 300.0;
const PREVIEW_PADDING: f64 = 16.0;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut text = String::from("Müller");
    let mut config_path: Option<PathBuf> = None;
    let mut offline = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--text" | "-t" => {
                if i + 1 < args.len() {
                    text = args[i + 1].clone();
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--offline" => offline = true,
            "--help" | "-h" => {
                println!("Tonnentext Cart Demo");
                println!();
                println!("Usage: cart-demo [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -t, --text <TEXT>    Label text (default: Müller)");
                println!("  -c, --config <PATH>  storefront.toml location");
                println!("      --offline        Use the in-memory cart even if a shop is configured");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    preview(&text);

    let config = StorefrontConfig::load_or_default(config_path);
    if config.is_configured() && !offline {
        info!(domain = %config.storefront.store_domain, "Using Storefront API");
        let client = StorefrontClient::new(&config)?;
        let storage: Arc<dyn SessionStorage> = match FileSessionStorage::in_data_dir() {
            Some(storage) => Arc::new(storage),
            None => Arc::new(MemorySessionStorage::new()),
        };
        let store = Arc::new(CartStore::from_config(client, storage, &config));
        run_cart(store, &config, &text).await?;
    } else {
        info!("No shop configured, using the in-memory cart");
        let store = Arc::new(CartStore::from_config(
            InMemoryBackend::default(),
            MemorySessionStorage::new(),
            &config,
        ));
        run_cart(store, &config, &text).await?;
    }

    Ok(())
}

fn preview(text: &str) {
    let measurer = DeterministicTextMeasurer::default();
    let mut state = SizingState::default();
    state.set_text(text);
    let size = state.refit(&measurer, PREVIEW_WIDTH, PREVIEW_PADDING);

    println!("Preview");
    println!("=======");
    println!("Text:      {}", state.text());
    println!("Size:      {:.0}px / {:.2}pt", size.px, size.pt);
    if state.increase(&measurer, PREVIEW_WIDTH, PREVIEW_PADDING) {
        println!("Step +1:   {:.0}px", state.current().px);
    } else {
        println!("Step +1:   at the largest size that fits");
    }
    if state.decrease(&measurer, PREVIEW_WIDTH, PREVIEW_PADDING) {
        println!("Step -1:   {:.0}px", state.current().px);
    }

    if let Ok(config) = state.configuration(1) {
        let layout = PrintLayout::for_configuration(&config);
        println!(
            "Print:     {:.1}pt on {:.0}x{:.0}pt",
            layout.font_size_pt, layout.page_width_pt, layout.page_height_pt
        );
    }
    println!();
}

async fn run_cart<B, S>(
    store: Arc<CartStore<B, S>>,
    config: &StorefrontConfig,
    text: &str,
) -> Result<(), Box<dyn std::error::Error>>
where
    B: CartBackend + 'static,
    S: SessionStorage + 'static,
{
    let (poller, handle) = CartPoller::new(Arc::clone(&store), config.poll_interval());
    let task = tokio::spawn(poller.run());

    println!("Cart");
    println!("====");
    let cart_id = store.ensure_session().await?;
    println!("Session:   {}", cart_id);

    let measurer = DeterministicTextMeasurer::default();
    let mut state = SizingState::default();
    state.set_text(text);
    state.refit(&measurer, PREVIEW_WIDTH, PREVIEW_PADDING);

    let first = state.configuration(2)?;
    print_snapshot(&format!("+ {} x2", first.text()), &store.add(&first).await?);

    state.set_text("15A");
    state.refit(&measurer, PREVIEW_WIDTH, PREVIEW_PADDING);
    let second = state.configuration(1)?;
    let snapshot = store.add(&second).await?;
    print_snapshot("+ 15A x1", &snapshot);

    if let Some(item) = snapshot.items.first() {
        print_snapshot(&format!("- {}", item.configuration.text()), &store.remove_item(item).await?);
    }

    if config.is_order_configured() {
        let submitter = OrderSubmitter::new(config)?;
        let checkout = store.checkout_data(None).await?;
        match submitter.submit(&checkout).await {
            Ok(receipt) => println!(
                "Order:     {} {}",
                receipt.order_id.as_deref().unwrap_or("(no id)"),
                receipt.pdf_url.as_deref().unwrap_or("")
            ),
            Err(e) => warn!(error = %e, retryable = e.is_retryable(), "Order not submitted"),
        }
    } else {
        println!("Order:     no order webhook configured");
    }

    print_snapshot("clear", &store.clear().await?);

    if let Some(url) = store.checkout_url().await {
        println!("Checkout:  {}", url);
    }

    handle.refresh().await?;
    tokio::task::yield_now().await;
    if let Some(published) = handle.current() {
        println!("Poller:    {} items", published.total_quantity);
    }

    handle.shutdown().await?;
    let _ = task.await;
    Ok(())
}

fn print_snapshot(action: &str, snapshot: &CartSnapshot) {
    println!(
        "{:<18} {:>2} items  {} {}",
        action,
        snapshot.total_quantity,
        snapshot.total_price.to_decimal_string(),
        snapshot.currency_code
    );
}
