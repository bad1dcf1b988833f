// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod env;
pub mod errors;
pub mod exec;
pub mod host;
pub mod logging;
pub mod native;
pub mod schedule;
pub mod setup;
pub mod task;
pub mod types;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::engine::{ConsoleStatus, EngineContext, RunEvent, RunLoop, StopFlag, WorkerDispatcher};
use crate::host::{SystemPower, reboot_if_scheduled};
use crate::native::NativeSubsystems;
use crate::schedule::{Scheduler, load_schedule};
use crate::setup::TomlJobSource;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - job loading and scheduling
/// - the run loop with its blocking worker
/// - session-end handling
/// - the end-of-run reboot
pub async fn run(args: CliArgs, cfg: ConfigFile) -> Result<()> {
    let ctx = EngineContext::new();

    let source = TomlJobSource::from_config(&cfg);
    let scheduler = load_schedule(&source, cfg.config.bad_entry, cfg.config.exclusivity)?;
    if scheduler.is_empty() {
        info!("no jobs to run");
        return Ok(());
    }

    if args.dry_run {
        print_dry_run(&scheduler);
        return Ok(());
    }

    if cfg.config.ignore_session_end {
        info!("session end will not stop the run");
    } else {
        watch_session_end(ctx.stop.clone());
    }

    let native = NativeSubsystems::platform(&cfg.config);
    let (tx, rx) = mpsc::channel::<RunEvent>(64);
    let dispatcher = WorkerDispatcher::new(tx, ctx.clone(), native);

    let run_loop = RunLoop::new(
        scheduler.into_sequence(ctx.stop.clone()),
        rx,
        ConsoleStatus::new(),
        dispatcher,
        ctx.clone(),
    );
    run_loop.run().await?;

    let suppress = cfg.config.suppress_reboot || args.no_reboot;
    reboot_if_scheduled(&ctx, suppress, &SystemPower);
    Ok(())
}

/// Set the stop flag when the session ends. The running job is never
/// interrupted.
fn watch_session_end(stop: StopFlag) {
    tokio::spawn(async move {
        session_end().await;
        warn!("session is ending; no further jobs will start");
        stop.request();
    });
}

#[cfg(unix)]
async fn session_end() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "failed to listen for SIGTERM");
            ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(windows)]
async fn session_end() {
    use tokio::signal::windows::{ctrl_logoff, ctrl_shutdown};

    match (ctrl_logoff(), ctrl_shutdown()) {
        (Ok(mut logoff), Ok(mut shutdown)) => {
            tokio::select! {
                _ = ctrl_c() => {}
                _ = logoff.recv() => {}
                _ = shutdown.recv() => {}
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "failed to listen for session end");
            ctrl_c().await;
        }
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Simple dry-run output: print the jobs in run order.
fn print_dry_run(scheduler: &Scheduler) {
    println!("provisioner dry-run");
    println!("  exclusivity = {:?}", scheduler.rule());
    println!();

    println!("jobs ({}):", scheduler.len());
    for task in scheduler.tasks() {
        let descriptor = task.descriptor();
        println!("  - [{}] {}", task.order_key() as i64, task.name());
        println!("      kind: {}", descriptor.kind);
        println!("      file: {}", descriptor.file);
        if let Some(ref parameters) = descriptor.parameters {
            println!("      parameters: {parameters}");
        }
        println!("      directory: {}", task.directory().display());
        if descriptor.exclusive {
            println!("      exclusive: true");
        }
        println!("      reboot: {:?}", descriptor.reboot);
    }
}
