use std::sync::Arc;

use prepkart_checkout::SandboxGateway;
use prepkart_client::Storefront;
use prepkart_store::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prepkart_client=debug,prepkart_checkout=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("starting prepkart storefront against {}", config.api.base_url);

    // The demo binary has no embedding shell, so the hosted widget is
    // replaced by the sandbox gateway.
    let storefront = Storefront::from_config(config, Arc::new(SandboxGateway))
        .map_err(|e| anyhow::anyhow!(e))?;

    match storefront.auth.restore().await? {
        Some(user) => tracing::info!(user_id = user.id, "restored session for {}", user.name),
        None => tracing::info!("no local session, browsing as guest"),
    }

    let items = storefront
        .load_catalog()
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!("loaded {} catalog items", items.len());

    for item in &items {
        tracing::info!(
            id = item.id,
            paid = item.paid,
            image = %storefront.image_for(item),
            "{} (INR {})",
            item.title,
            item.price
        );
    }

    Ok(())
}
