use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use twilight_model::id::marker::GuildMarker;
use twilight_model::id::Id;

use basalt::{BasaltCache, Event};

/// Decodes newline-delimited node event payloads and prints the events.
#[derive(Parser, Debug)]
#[command(name = "basalt-test", version)]
struct Args {
    /// Guild to register a player for; events for other guilds fail to resolve.
    #[arg(long = "guild", env = "BASALT_GUILDS", value_delimiter = ',')]
    guilds: Vec<Id<GuildMarker>>,

    /// File to read payloads from instead of stdin.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Print events as JSON instead of their display form.
    #[arg(long)]
    json: bool,
}

#[derive(Debug)]
struct DemoPlayer {
    guild_id: Id<GuildMarker>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let cache = Arc::new(BasaltCache::default());
    for guild_id in &args.guilds {
        cache.insert(*guild_id, DemoPlayer { guild_id: *guild_id });
    }
    tracing::info!(players = cache.len(), "Player cache ready");

    match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Couldn't open {}", path.display()))?;
            run(BufReader::new(file), &cache, args.json).await
        }
        None => run(BufReader::new(tokio::io::stdin()), &cache, args.json).await,
    }
}

async fn run<R>(reader: R, cache: &BasaltCache<DemoPlayer>, json: bool) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let (mut decoded, mut failed) = (0usize, 0usize);

    while let Some(line) = lines.next_line().await.context("Couldn't read payload")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match basalt::decode_str(line, |id| cache.player(id)) {
            Ok(event) => {
                decoded += 1;
                log_event(&event);
                if json {
                    println!("{}", serde_json::to_string(&event)?);
                } else {
                    println!("{}", event);
                }
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(error = %e, "Dropping payload");
            }
        }
    }

    tracing::info!(decoded, failed, "Input exhausted");
    Ok(())
}

fn log_event(event: &Event<Arc<DemoPlayer>>) {
    match event {
        Event::TrackEnd(e) => tracing::info!(
            guild_id = %e.player().guild_id,
            reason = %e.reason(),
            may_start_next = e.reason().may_start_next(),
            "Track ended"
        ),
        Event::WebsocketClosed(e) => tracing::info!(
            guild_id = e.guild_id(),
            code = e.code(),
            by_remote = e.by_remote(),
            "Voice websocket closed"
        ),
        _ => tracing::info!(
            guild_id = event.guild_id(),
            event_type = %event.event_type(),
            "Event decoded"
        ),
    }
}
