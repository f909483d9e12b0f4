//! FAQ example binary
//!
//! Usage: `faq [categories] [language]`, e.g. `faq account,billing de`.

use anyhow::Context;
use composable_fetch::StateTree;
use composable_fetch_runtime::Store;
use faq::{FaqQuery, FaqSource, faq_slice};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "faq=debug,composable_fetch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let categories = args.next().unwrap_or_else(|| "account,billing,shipping".to_string());
    let language = args.next().unwrap_or_else(|| "en".to_string());
    let query = FaqQuery::new(categories.split(',').map(str::trim), language);

    let source = FaqSource::bundled().context("loading bundled FAQ")?;
    let faq = faq_slice(source);
    let store = Store::new(StateTree::new(), faq.reducer(), ());

    println!("=== FAQ: {} ({}) ===\n", query.categories.join(", "), query.language);

    // Two identical requests in flight share one fetch
    let (first, second) = tokio::join!(
        faq.api_call(&store, query.clone()),
        faq.api_call(&store, query.clone()),
    );
    let entries = first.context("fetching FAQ")?;
    anyhow::ensure!(second.as_ref().ok() == Some(&entries), "deduplicated call diverged");

    for entry in &entries {
        println!("[{:>3}] {} ({})", entry.popularity, entry.question, entry.category);
        println!("      {}", entry.answer);
    }

    // Served from state this time
    let cached = faq.api_call(&store, query.clone()).await.context("reading cached FAQ")?;
    let slot = faq.slot_key(&query);
    let (fetching, error) = store
        .state(|tree| (faq.fetching_status(tree, slot.as_ref()), faq.error(tree, slot.as_ref())))
        .await;

    println!("\nslot:      {}", slot.map(|slot| slot.to_string()).unwrap_or_default());
    println!("fetching:  {fetching:?}");
    println!("error:     {error:?}");
    println!("cached:    {} entries", cached.len());

    store
        .shutdown(std::time::Duration::from_secs(1))
        .await
        .context("shutting down store")?;
    Ok(())
}
