use std::sync::Arc;

use anyhow::Context;

use adminpanel_client::{ChannelNavigator, ClientConfig, ClientContext, RestoreOutcome, SessionLifecycle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    adminpanel_observability::init();

    let config = ClientConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        api_url = %config.api_url,
        refresh = ?config.refresh_interval,
        flag_file = ?config.flag_file(),
        "starting session client"
    );

    let (navigator, mut routes) = ChannelNavigator::channel();
    let ctx = ClientContext::from_config(&config, Arc::new(navigator))
        .context("failed to build client context")?;

    let lifecycle = SessionLifecycle::new(ctx.clone(), config.refresh_interval);
    lifecycle.activate();

    match lifecycle.restore().await {
        RestoreOutcome::Restored(user) => {
            tracing::info!(user_id = %user.id, name = %user.full_name(), "signed in")
        }
        RestoreOutcome::NoPriorSession => tracing::info!("no previous session; sign in first"),
        RestoreOutcome::Expired { flag_cleared } => {
            tracing::info!(flag_cleared, "previous session expired")
        }
        RestoreOutcome::Unchanged => tracing::warn!("could not reach the API to restore the session"),
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
            Some(route) = routes.recv() => {
                tracing::info!(%route, "navigate");
            }
        }
    }

    lifecycle.shutdown();
    Ok(())
}
