use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};

use legend_cache::config::TrackerConfig;
use legend_cache::fake_provider::FixtureProvider;
use legend_cache::provider::{BridgeProvider, StatsProvider};
use legend_cache::{CacheStore, IngestionOrchestrator, PurgeService, QueryService, logging};

const USAGE: &str = "usage:
  legend_cache ingest <player> [--platform PC] [--db PATH]
  legend_cache get <player> <legend> <kills|wins|damage> [--db PATH]
  legend_cache list <player> [--db PATH]
  legend_cache remove <player> <legend> [--db PATH]";

enum Command {
    Ingest { player: String },
    Get { player: String, legend: String, stat: String },
    List { player: String },
    Remove { player: String, legend: String },
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut cfg = TrackerConfig::from_env();
    if let Some(platform) = parse_flag(&args, "--platform") {
        cfg.platform = platform.to_ascii_uppercase();
    }
    let command = parse_command(&args)?;

    let db_path = parse_flag(&args, "--db")
        .map(PathBuf::from)
        .or_else(|| cfg.db_path.clone())
        .context("unable to resolve sqlite path; pass --db or set LEGEND_DB_PATH")?;
    let store = Arc::new(CacheStore::open(&db_path)?);

    match command {
        Command::Ingest { player } => {
            let provider = build_provider(&cfg)?;
            let orchestrator = IngestionOrchestrator::new(provider, store, cfg.platform.clone());
            let result = orchestrator
                .run(&player)
                .with_context(|| format!("ingest failed for {player}"))?;
            println!("Ingest complete for {}", result.player);
            println!("DB: {}", db_path.display());
            println!("Legends processed: {}", result.legends_processed);
            println!("Inserted: {}  Updated: {}", result.inserted, result.updated);
            if result.skipped_entries > 0 {
                println!("Skipped stat entries: {}", result.skipped_entries);
            }
        }
        Command::Get {
            player,
            legend,
            stat,
        } => {
            let reading = QueryService::new(store).get_stat(&player, &legend, &stat)?;
            println!("{reading}");
        }
        Command::List { player } => {
            let rows = QueryService::new(store).legends(&player)?;
            if rows.is_empty() {
                println!("No cached legends for {player}. Run an ingest first.");
            }
            for row in rows {
                println!(
                    "{:<14} kills={:<8} wins={:<6} damage={:<10} as of {}",
                    row.legend_name,
                    row.kills,
                    row.wins,
                    row.damage,
                    row.recorded_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Remove { player, legend } => {
            PurgeService::new(store).remove(&player, &legend)?;
            println!("{legend}'s data has been deleted for {player}.");
        }
    }

    Ok(())
}

fn build_provider(cfg: &TrackerConfig) -> Result<Box<dyn StatsProvider>> {
    if let Some(path) = cfg.fixture_path.as_ref() {
        return Ok(Box::new(FixtureProvider::new(path.clone())));
    }
    let provider = BridgeProvider::from_config(cfg)
        .context("set APEX_API_KEY (or APEX_FIXTURE_PATH for offline use)")?;
    Ok(Box::new(provider))
}

fn parse_command(args: &[String]) -> Result<Command> {
    let positional = positional_args(args);
    let Some((name, rest)) = positional.split_first() else {
        return Err(anyhow!("missing command\n{USAGE}"));
    };
    let arg = |idx: usize, what: &str| {
        rest.get(idx)
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("missing {what}\n{USAGE}"))
    };

    match *name {
        "ingest" => Ok(Command::Ingest {
            player: arg(0, "player")?,
        }),
        "get" => Ok(Command::Get {
            player: arg(0, "player")?,
            legend: arg(1, "legend")?,
            stat: arg(2, "stat key")?,
        }),
        "list" => Ok(Command::List {
            player: arg(0, "player")?,
        }),
        "remove" => Ok(Command::Remove {
            player: arg(0, "player")?,
            legend: arg(1, "legend")?,
        }),
        other => Err(anyhow!("unknown command {other:?}\n{USAGE}")),
    }
}

fn positional_args(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--db" || arg == "--platform" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
