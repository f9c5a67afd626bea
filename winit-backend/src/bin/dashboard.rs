use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};
use winit_backend::config::DashboardConfig;
use winit_backend::presenter::{render, HttpRangeSource, Presenter, TimeWindow};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cfg = DashboardConfig::from_env()?;
    info!(api_url = %cfg.api_url, window = %cfg.window, "Starting winit-dashboard");

    let source = HttpRangeSource::new(&cfg.api_url, Duration::from_secs(10))?;
    let presenter = Arc::new(Presenter::new(Arc::new(source)));
    let mut updates = presenter.subscribe();
    let handle = Arc::clone(&presenter).start(cfg.window, Duration::from_secs(cfg.refresh_secs));

    println!("Commands: 1h | 6h | 24h to switch window, r to refresh, q to quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                print!("{}", render(&presenter.snapshot().await));
            }
            line = lines.next_line(), if stdin_open => {
                let Ok(Some(line)) = line else {
                    // stdin closed; keep polling until ctrl-c
                    stdin_open = false;
                    continue;
                };
                match line.trim() {
                    "" => {}
                    "q" => break,
                    "r" => handle.refresh(),
                    other => match other.parse::<TimeWindow>() {
                        Ok(window) => handle.set_window(window),
                        Err(e) => warn!("{}", e),
                    },
                }
            }
        }
    }

    handle.stop().await;
    Ok(())
}
