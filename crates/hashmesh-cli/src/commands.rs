use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use hashmesh_resolver::ReplicationEvent;
use hashmesh_source::{CacheStore, FsSource};
use hashmesh_types::{BackendId, ContentHash, HashedObject};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::cli::*;
use crate::config::{CliConfig, Node};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(&cli.config)?;
    debug!(config = %cli.config.display(), backends = config.backends.len(), "loaded config");
    let node = Node::build(&config).await?;
    match cli.command {
        Command::Get(args) => cmd_get(&node, args, &cli.format).await,
        Command::Create(args) => cmd_create(&node, args, &cli.format).await,
        Command::Sources(args) => cmd_sources(&node, args, &cli.format).await,
        Command::Backends => cmd_backends(&node, &config, &cli.format).await,
    }
}

async fn cmd_get(node: &Node, args: GetArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let hash: ContentHash = args.hash.parse()?;
    let found = node.resolver.get(&hash).await;
    match (format, found) {
        (OutputFormat::Json, found) => {
            println!("{}", json!({ "hash": hash, "object": found }));
        }
        (OutputFormat::Text, Some(object)) => {
            println!("{}", serde_json::to_string_pretty(&object)?);
        }
        (OutputFormat::Text, None) => {
            println!("{} {} not found on any source", "✗".red().bold(), hash.short().yellow());
        }
    }
    Ok(())
}

async fn cmd_create(node: &Node, args: CreateArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let payload: Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", args.file.display()))?;
    let target = args.target.map(BackendId::new).transpose()?;

    let backends = node.resolver.resolver().all_sources().await?;
    let mut replication = node.resolver.subscribe_replication();

    let created = node
        .resolver
        .optimistic_create_in(
            target.as_ref(),
            |fs: Arc<FsSource>| async move { fs.insert(payload).await },
            |fs: Arc<FsSource>, object: HashedObject| async move {
                let stored = fs.put(&object).await;
                stored.map(|()| object.id)
            },
        )
        .await?;
    info!(hash = %created.id, file = %args.file.display(), "created object");

    let expected = backends.len().saturating_sub(1);
    let mut events = Vec::with_capacity(expected);
    let deadline = tokio::time::sleep(Duration::from_secs(args.wait));
    tokio::pin!(deadline);
    while events.len() < expected {
        tokio::select! {
            received = replication.recv() => match received {
                Ok(event) => events.push(event),
                Err(_) => break,
            },
            _ = &mut deadline => break,
        }
    }
    let failed = events.iter().filter(|event| event.is_failure()).count();
    info!(
        hash = %created.id,
        replicated = events.len() - failed,
        failed,
        pending = expected - events.len(),
        "replication report"
    );
    if events.len() < expected {
        warn!(hash = %created.id, waited_secs = args.wait, "replication still pending");
    }

    if *format == OutputFormat::Json {
        let report: Vec<Value> = events
            .iter()
            .map(|event| match event {
                ReplicationEvent::Replicated { backend, .. } => {
                    json!({ "backend": backend, "ok": true })
                }
                ReplicationEvent::Failed {
                    backend, reason, ..
                } => json!({ "backend": backend, "ok": false, "reason": reason }),
            })
            .collect();
        println!("{}", json!({ "hash": created.id, "replication": report }));
        return Ok(());
    }

    println!("{} Created {}", "✓".green().bold(), created.id.to_string().yellow());
    for event in &events {
        match event {
            ReplicationEvent::Replicated { backend, .. } => {
                println!("  {} {}", "replicated:".green(), backend);
            }
            ReplicationEvent::Failed {
                backend, reason, ..
            } => {
                println!("  {} {} ({})", "failed:".red(), backend, reason);
            }
        }
    }
    if events.len() < expected {
        println!(
            "  {} {} replication(s) still pending",
            "…".dimmed(),
            expected - events.len()
        );
    }
    Ok(())
}

async fn cmd_sources(node: &Node, args: SourcesArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let hash: ContentHash = args.hash.parse()?;
    let found = node.resolver.resolver().get(&hash).await.is_some();
    let known = node.local_index.lookup(&hash)?.unwrap_or_default();

    if *format == OutputFormat::Json {
        println!("{}", json!({ "hash": hash, "found": found, "sources": known }));
        return Ok(());
    }
    if !found {
        println!("{} {} not found on any source", "✗".red().bold(), hash.short().yellow());
    }
    for id in known {
        println!("  {}", id.to_string().cyan());
    }
    Ok(())
}

async fn cmd_backends(node: &Node, config: &CliConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let backends = node.resolver.resolver().all_sources().await?;
    let default = config.resolver.default_target.select(&backends).cloned();

    if *format == OutputFormat::Json {
        println!("{}", json!({ "backends": backends, "default_target": default }));
        return Ok(());
    }
    for (id, dir) in backends.iter().zip(config.backends.iter().map(|b| &b.dir)) {
        let marker = if Some(id) == default.as_ref() { "*".green().bold() } else { " ".normal() };
        println!("{} {} {}", marker, id.to_string().bold(), dir.display().to_string().dimmed());
    }
    println!("cache: {}", config.cache_dir.display());
    Ok(())
}
