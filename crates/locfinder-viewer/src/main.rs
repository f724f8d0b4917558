//! locfinder-viewer - headless live location map
//!
//! Keeps one `/location` push stream open for the current viewport and logs
//! every marker it renders. Each line on stdin of the form
//! `<latitude> <longitude>` (or `<latitude>,<longitude>`) is treated as the
//! user panning the map and the viewport settling there.
//!
//! Usage:
//!   locfinder-viewer [config.toml]
//!
//! If no config file is provided, the defaults from `config.rs` are used.

mod config;

use locfinder_client::SseStreamFactory;
use locfinder_core::{Coordinate, MapSurface};
use locfinder_map::{HeadlessMapSurface, SubscriptionCoordinator, SurfaceController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ViewerConfig;

/// Parsed command-line arguments
struct Args {
    /// Viewer config file (TOML)
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let mut result = Args { config_path: None };

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                result.config_path = Some(arg.to_string());
            }
            _ => {
                tracing::warn!("Unknown argument: {}", arg);
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"locfinder-viewer - headless live location map

Usage: locfinder-viewer [config.toml]

Type "<latitude> <longitude>" on stdin to move the viewport.

Options:
  -h, --help    Print this help message
"#
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "locfinder_viewer=info,locfinder_map=debug,locfinder_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = parse_args();

    let config = match args.config_path {
        Some(ref path) => {
            tracing::info!("Loading config from: {}", path);
            ViewerConfig::load(path).map_err(anyhow::Error::msg)?
        }
        None => {
            tracing::info!("No config file provided, using defaults");
            ViewerConfig::default()
        }
    };
    config.validate().map_err(anyhow::Error::msg)?;

    let mut surface = HeadlessMapSurface::new();
    surface.initialize(&config.map_options());
    let controller = surface.controller();

    let factory = SseStreamFactory::with_config(&config.server.url, config.connect_timeout())?;
    tracing::info!("Streaming locations from {}", factory.base_url());

    let coordinator = SubscriptionCoordinator::new(factory, surface, config.viewport_state());

    tokio::spawn(read_viewport_commands(controller));

    tokio::select! {
        _ = coordinator.run() => {
            tracing::info!("Input closed, stopping");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping");
        }
    }

    Ok(())
}

/// Turn stdin lines into "viewport settled" notifications
async fn read_viewport_commands(controller: SurfaceController) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_coordinate(&line) {
                Ok(Some(center)) => {
                    controller.settle_at(center);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Ignoring input '{}': {}", line.trim(), e),
            },
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    controller.detach();
}

/// Parse `<latitude> <longitude>` or `<latitude>,<longitude>`; blank lines yield `None`
fn parse_coordinate(line: &str) -> Result<Option<Coordinate>, String> {
    let parts: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();

    match parts.as_slice() {
        [] => Ok(None),
        [latitude, longitude] => {
            let latitude: f64 = latitude
                .parse()
                .map_err(|_| format!("invalid latitude '{}'", latitude))?;
            let longitude: f64 = longitude
                .parse()
                .map_err(|_| format!("invalid longitude '{}'", longitude))?;
            let center = Coordinate::new(latitude, longitude);
            center.validate().map_err(|e| e.to_string())?;
            Ok(Some(center))
        }
        _ => Err("expected '<latitude> <longitude>'".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate_forms() {
        assert_eq!(
            parse_coordinate("37.80 -122.40").unwrap(),
            Some(Coordinate::new(37.80, -122.40))
        );
        assert_eq!(
            parse_coordinate(" 37.80, -122.40 ").unwrap(),
            Some(Coordinate::new(37.80, -122.40))
        );
        assert_eq!(parse_coordinate("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_coordinate_rejects_garbage() {
        assert!(parse_coordinate("north south").is_err());
        assert!(parse_coordinate("1 2 3").is_err());
        assert!(parse_coordinate("95 10").is_err());
    }
}
