//! `feedwatch` — poll RSS feeds from the terminal and print new articles.
//!
//! * `feedwatch run` loads the feeds file, polls every source on a timer and
//!   prints each new article with its source, marking it read as it goes.
//! * `feedwatch add | remove | list` edit and inspect the feeds file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use feedwatch::config::{Settings, DEFAULT_CONFIG_FILE};
use feedwatch::{
    persist, poll, Article, FnSubscriber, Reader, ReaderError, RssFetcher, Source, SourceRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "feedwatch", about = "Poll RSS feeds and show new articles")]
struct Cli {
    /// Path to the settings file.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll all feeds until interrupted.
    Run,
    /// Add a feed to the feeds file.
    Add {
        name: String,
        url: String,
        /// Tag to attach; may be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Remove a feed from the feeds file.
    Remove { name: String },
    /// List configured feeds.
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;

    match cli.command {
        Command::Run => run(&settings).await,
        Command::Add { name, url, tags } => {
            let source = tags.into_iter().fold(Source::new(name, url), Source::with_tag);
            persist::edit(&settings.feeds_path, |registry| Ok(registry.add(source)?))
        }
        Command::Remove { name } => persist::edit(&settings.feeds_path, |registry| {
            if !registry.remove(&name) {
                anyhow::bail!("no feed named `{name}`");
            }
            Ok(())
        }),
        Command::List => {
            let path = &settings.feeds_path;
            let sources = persist::load_existing(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let registry = SourceRegistry::create(sources)?;
            for source in registry.all() {
                let tags: Vec<&str> = source.tags.iter().map(String::as_str).collect();
                if tags.is_empty() {
                    println!("{}\t{}", source.name, source.url);
                } else {
                    println!("{}\t{}\t[{}]", source.name, source.url, tags.join(", "));
                }
            }
            Ok(())
        }
    }
}

fn load_sources(settings: &Settings) -> Vec<Source> {
    persist::load(&settings.feeds_path).unwrap_or_else(|| {
        warn!(
            path = %settings.feeds_path.display(),
            "feeds file not loaded, starting with no feeds"
        );
        Vec::new()
    })
}

async fn run(settings: &Settings) -> Result<()> {
    let fetcher = RssFetcher::new(settings.fetch_timeout(), &settings.user_agent)?;
    let reader = Reader::create(load_sources(settings), Arc::new(fetcher))?;

    // The subscriber only forwards; printing and marking read happen below,
    // off the update task.
    let (items_tx, mut items_rx) = mpsc::unbounded_channel::<Vec<Article>>();
    reader
        .subscribe(Arc::new(FnSubscriber::new("console", move |items: &[Article]| {
            items_tx.send(items.to_vec()).context("console display is gone")
        })))
        .await?;

    let (handle, mut reports) = poll::spawn(reader.clone(), settings.poll_interval());
    info!(interval = ?settings.poll_interval(), "polling started, Ctrl-C to stop");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            Some(report) = reports.recv() => {
                for failure in &report.fetch_failures {
                    eprintln!("feed not loaded: {}: {}", failure.source, failure.error);
                }
            }
            Some(items) = items_rx.recv() => show_batch(&reader, &items).await,
        }
    }

    // A cycle may still be in flight; keep showing what it delivers until
    // the poll task has stopped, then flush whatever is left in the channel.
    handle.shutdown();
    let join = handle.join();
    tokio::pin!(join);
    loop {
        tokio::select! {
            biased;
            Some(items) = items_rx.recv() => show_batch(&reader, &items).await,
            _ = &mut join => break,
        }
    }
    while let Ok(items) = items_rx.try_recv() {
        show_batch(&reader, &items).await;
    }
    Ok(())
}

async fn show_batch(reader: &Reader, items: &[Article]) {
    println!("New {} articles available!", items.len());
    for item in items {
        show_item(reader, item).await;
    }
}

async fn show_item(reader: &Reader, item: &Article) {
    let source = match reader.try_find_source(&item.uri).await {
        Ok(found) => found.map(|s| s.name),
        // Batches drained after shutdown still carry their owner.
        Err(ReaderError::Closed) => Some(item.source.clone()),
        Err(e) => {
            warn!(uri = %item.uri, error = %e, "source lookup failed");
            Some(item.source.clone())
        }
    }
    .unwrap_or_else(|| "(unknown source)".to_string());

    println!();
    println!("[{source}] {}", item.title);
    println!("  {}", item.published.format("%Y-%m-%d %H:%M"));
    println!("  {}", item.description.as_deref().unwrap_or("(no description)"));
    if let Some(link) = &item.link {
        println!("  {link}");
    }

    match reader.read_item(item, Utc::now()).await {
        Ok(()) => {}
        Err(ReaderError::Closed) => debug!(uri = %item.uri, "reader closed, not marking read"),
        Err(e) => warn!(uri = %item.uri, error = %e, "could not mark article read"),
    }
}
