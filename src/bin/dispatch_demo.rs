//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Small command line driver for the dispatcher. It subscribes a handful of handlers covering
// every subscription kind, emits the requested events with `emit_async`, and prints the outcome.
//--------------------------------------------------------------------------------------------------

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde_json::Value;
use tracing::{Level, info, warn};

use event_dispatch::{Dispatcher, DispatcherConfig, Handler};

/// Command line arguments for the demo
#[derive(Parser, Debug)]
#[command(author, version, about = "Emit events through an in-process dispatcher")]
struct Args {
    /// Event names to emit, in order
    #[arg(short, long = "event", required = true)]
    events: Vec<String>,

    /// JSON payload attached to every event
    #[arg(short, long, default_value = "{}")]
    payload: String,

    /// JSON config file; the environment is used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fail emissions nobody listens to (overrides the environment)
    #[arg(long)]
    throw_on_no_listeners: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

fn build_dispatcher(config: DispatcherConfig) -> Result<Dispatcher<Value>> {
    let dispatcher = Dispatcher::with_config(config);

    let audit = Handler::wildcard(|name: &str, payload: &Value| {
        info!("[audit] {} {}", name, payload);
        Ok(())
    });
    dispatcher.subscribe("*", &audit)?;

    let users = Handler::wildcard(|name: &str, _: &Value| {
        println!("user lifecycle event: {}", name);
        Ok(())
    });
    dispatcher.subscribe("user.*", &users)?;

    let failures = Handler::wildcard(|name: &str, payload: &Value| {
        Err(anyhow!("{} reported a failure: {}", name, payload))
    });
    dispatcher.subscribe("*.failed", &failures)?;

    let welcome = Handler::new(|payload: &Value| {
        println!("welcome mail queued for {}", payload);
        Ok(())
    });
    dispatcher.subscribe_once("user.created", &welcome)?;

    let indexer = Handler::new_async(|payload: Value| async move {
        tokio::time::sleep(Duration::from_millis(25)).await;
        println!("search index updated with {}", payload);
        Ok(())
    });
    dispatcher.subscribe("user.updated", &indexer)?;

    Ok(dispatcher)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_target(false)
        .init();

    let mut config = match &args.config {
        Some(path) => DispatcherConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => DispatcherConfig::try_from_env()?,
    };
    if args.throw_on_no_listeners {
        config = config.with_throw_on_no_listeners(true);
    }

    let payload: Value = serde_json::from_str(&args.payload)
        .with_context(|| format!("payload is not valid JSON: {}", args.payload))?;
    let dispatcher = build_dispatcher(config)?;

    for event in &args.events {
        match dispatcher.emit_async(event, payload.clone()) {
            Ok(completion) => match completion.await {
                Ok(()) => println!("{}: ok", event),
                Err(err) => {
                    warn!("{} failed: {:#}", event, err);
                    println!("{}: {}", event, err);
                }
            },
            Err(err) => println!("{}: rejected ({})", event, err),
        }
    }

    Ok(())
}
