//! `elfos` – command-line entry point.
//!
//! This binary is the ignition switch for the control hierarchy.  It:
//!
//! 1. Initialises structured logging (and optional OTLP export) via
//!    `elfos-runtime::telemetry`.
//! 2. Checks for `~/.elfos/config.toml`; writes the default demo
//!    configuration on first run.
//! 3. Builds the control tree from the configuration and starts every
//!    component loop.
//! 4. Intercepts **Ctrl-C** and performs a cooperative shutdown: stop flag
//!    for the sensors, `Release` for every worker.

mod config;

use colored::Colorize;
use std::sync::mpsc;
use tracing::warn;

use elfos_runtime::NodeFactory;

fn main() {
    // Structured logging first; user-facing output below stays on println!
    // for UX consistency.  Set ELFOS_LOG_FORMAT=json for aggregator-ready
    // output, OTEL_EXPORTER_OTLP_ENDPOINT for span export.
    let _telemetry = elfos_runtime::init_tracing("elfos");

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  First run – demo config written to {}",
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Could not write demo config".yellow(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using the default demo configuration.");
            config::Config::default()
        }
    };

    let spec = match cfg.into_tree_spec() {
        Ok(spec) => spec,
        Err(e) => {
            println!("{}: {}", "Invalid configuration".red(), e);
            std::process::exit(1);
        }
    };

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!(
            "{}",
            "⚠  Ctrl-C received – initiating graceful shutdown …"
                .yellow()
                .bold()
        );
        let _ = shutdown_tx.send(());
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    // The runtime is created only after init_tracing; the telemetry layer
    // must not depend on an ambient Tokio runtime.
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            println!("{}: {}", "Runtime error".red(), e);
            std::process::exit(1);
        }
    };

    runtime.block_on(async {
        let tree = match NodeFactory::new().build(spec) {
            Ok(tree) => tree,
            Err(e) => {
                println!("{}: {}", "Tree assembly failed".red(), e);
                std::process::exit(1);
            }
        };
        println!(
            "  Control tree assembled: {} node(s).",
            tree.nodes().len().to_string().bold()
        );

        let running = tree.start();
        println!("{}", "  ✓ All component loops running.".green());
        println!("  Type lines on stdin; Ctrl-C (or EOF + Ctrl-C) to exit.\n");

        // Park until the Ctrl-C handler fires (or is unavailable and the
        // sending half was dropped).
        let _ = tokio::task::spawn_blocking(move || shutdown_rx.recv()).await;

        running.stop().await;
        println!("{}", "  ✓ Control tree stopped.".green());
    });

    println!("{}", "  ✓ Exiting.".green());
}

fn print_banner() {
    println!();
    println!("{}", "  ┌─────────────────────────────┐".cyan());
    println!(
        "{}{}{}",
        "  │ ".cyan(),
        " elfOS · control hierarchy  ".bold(),
        "│".cyan()
    );
    println!("{}", "  └─────────────────────────────┘".cyan());
    println!();
}
