use std::sync::Arc;

use tokio::time;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use status_sentinel::config::Config;
use status_sentinel::core::{
    run_cycle, run_shutdown_cycle, ChatClient, Context, DiscordClient, Doctor, Notifier, Probe,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "status_sentinel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = match Config::load() {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::error!("configuration error: {err}");
            std::process::exit(1);
        }
    };
    tracing::info!(
        "monitoring {} every {:?}",
        cfg.target_label,
        cfg.check_interval
    );

    let client = Arc::new(DiscordClient::new(cfg.token.clone(), cfg.channel_id.clone()));
    // Without a resolvable channel no cycle can publish anything.
    if let Err(err) = client.resolve_channel().await {
        tracing::error!("cannot resolve channel {}: {err}", cfg.channel_id);
        std::process::exit(1);
    }

    let ctx = Context {
        probe: Probe::new(
            cfg.target.clone(),
            cfg.connect_timeout,
            cfg.log_freshness,
            cfg.maintenance_file.clone(),
        ),
        doctor: Doctor::new(cfg.thresholds),
        notifier: Notifier::new(client, cfg.alert_policy, cfg.alert_delete_after),
        state_file: cfg.state_file.clone(),
        target_label: cfg.target_label.clone(),
    };

    // First tick fires immediately, then on the fixed period. A failed
    // cycle is logged and the next one runs regardless.
    let mut interval = time::interval(cfg.check_interval);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(err) = run_cycle(&ctx).await {
                    tracing::error!("cycle failed: {err}");
                }
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown requested, publishing final state");
                if let Err(err) = run_shutdown_cycle(&ctx).await {
                    tracing::error!("final cycle failed: {err}");
                }
                break;
            }
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
