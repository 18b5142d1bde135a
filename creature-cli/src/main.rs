//! Creature CLI
//!
//! Command-line front end for the creature read-through cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use creature_cache::{CacheConfig, CachingCreatureRepo, CreatureStore, LockMode};
use creature_core::types::{Creature, CreatureId, CreatureLookupResult};
use creature_store::{FileCreatureStore, MemoryCreatureStore};

/// Creature - read-through cached creature lookups
#[derive(Parser)]
#[command(name = "creature")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Cache TTL in milliseconds (defaults to CREATURE_CACHE_TTL_MS or 60000)
    #[arg(long, global = true)]
    ttl_ms: Option<u64>,

    /// Fetch lock granularity: per-key or global
    #[arg(long, global = true)]
    lock_mode: Option<LockMode>,

    /// Backing store
    #[arg(long, global = true, value_enum, default_value_t = StoreKind::File)]
    store: StoreKind,

    /// Store file (file store only)
    #[arg(long, global = true, default_value = "creatures.db")]
    path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    /// Process-local, forgotten on exit
    Memory,
    /// Persisted to --path
    File,
    /// libSQL database from CREATURE_DB_URL (needs the `sql` feature)
    Sql,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a creature and read it back through the cache
    Create {
        /// Creature name
        #[arg(short, long)]
        name: String,
        /// Creature description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Look a creature up by id
    Get {
        /// Creature id
        #[arg(allow_negative_numbers = true)]
        id: CreatureId,
        /// Number of lookups to make
        #[arg(short, long, default_value = "1")]
        repeat: usize,
        /// Pause between lookups in milliseconds
        #[arg(long, default_value = "0")]
        interval_ms: u64,
    },

    /// Hammer the cache with concurrent lookups against a slow store
    Bench {
        /// Number of concurrent callers
        #[arg(short, long, default_value = "1000")]
        callers: usize,
        /// Number of distinct creatures the callers spread over
        #[arg(short, long, default_value = "4")]
        keys: usize,
        /// Simulated store latency in milliseconds
        #[arg(long, default_value = "50")]
        latency_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "creature=debug,creature_cache=debug,creature_store=debug,info"
    } else {
        "creature=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cache_config(&cli);

    match cli.command {
        Commands::Create { name, description } => {
            cmd_create(cli.store, &cli.path, config, &name, &description).await
        }
        Commands::Get {
            id,
            repeat,
            interval_ms,
        } => cmd_get(cli.store, &cli.path, config, id, repeat, interval_ms).await,
        Commands::Bench {
            callers,
            keys,
            latency_ms,
        } => cmd_bench(config, callers, keys, latency_ms).await,
    }
}

/// Environment first, command-line flags on top.
fn cache_config(cli: &Cli) -> CacheConfig {
    let mut config = CacheConfig::from_env();
    if let Some(ttl_ms) = cli.ttl_ms {
        config = config.with_ttl(Duration::from_millis(ttl_ms));
    }
    if let Some(lock_mode) = cli.lock_mode {
        config = config.with_lock_mode(lock_mode);
    }
    config
}

/// A store opened for one command, plus a handle to flush it if it persists.
struct OpenedStore {
    store: Arc<dyn CreatureStore>,
    file: Option<Arc<FileCreatureStore>>,
}

impl OpenedStore {
    async fn open(kind: StoreKind, path: &Path) -> Result<Self> {
        match kind {
            StoreKind::Memory => Ok(Self {
                store: Arc::new(MemoryCreatureStore::new()),
                file: None,
            }),
            StoreKind::File => {
                let file = Arc::new(
                    FileCreatureStore::open(path)
                        .await
                        .with_context(|| format!("Failed to open store file {}", path.display()))?,
                );
                Ok(Self {
                    store: file.clone(),
                    file: Some(file),
                })
            }
            StoreKind::Sql => Self::open_sql().await,
        }
    }

    #[cfg(feature = "sql")]
    async fn open_sql() -> Result<Self> {
        let config = creature_store::SqlConfig::from_env();
        let sql = creature_store::SqlCreatureStore::connect(&config)
            .await
            .context("Failed to connect to creature database")?;
        Ok(Self {
            store: Arc::new(sql),
            file: None,
        })
    }

    #[cfg(not(feature = "sql"))]
    async fn open_sql() -> Result<Self> {
        anyhow::bail!("this build has no SQL support; rebuild with `--features sql`")
    }

    async fn flush(&self) -> Result<()> {
        if let Some(file) = &self.file {
            file.flush().await.context("Failed to save store file")?;
        }
        Ok(())
    }
}

/// Create a creature
async fn cmd_create(
    kind: StoreKind,
    path: &Path,
    config: CacheConfig,
    name: &str,
    description: &str,
) -> Result<()> {
    println!("{} {}", "🐾 Creating creature:".cyan().bold(), name);

    let opened = OpenedStore::open(kind, path).await?;
    let cache = CachingCreatureRepo::with_config(opened.store.clone(), config);

    let creature = cache
        .create_creature(name, description)
        .await
        .context("Failed to create creature")?;
    opened.flush().await?;

    print_creature(&creature);

    // Read it back: the create already populated the cache
    let lookup = cache.get_creature(creature.id).await?;
    let stats = cache.stats();
    println!(
        "\n   {} found={} store lookups={}",
        "Read-back:".dimmed(),
        lookup.is_found(),
        stats.misses
    );

    Ok(())
}

/// Look a creature up, possibly repeatedly
async fn cmd_get(
    kind: StoreKind,
    path: &Path,
    config: CacheConfig,
    id: CreatureId,
    repeat: usize,
    interval_ms: u64,
) -> Result<()> {
    println!(
        "{} {} (ttl {:?}, {} locks)",
        "🔍 Looking up creature".cyan().bold(),
        id,
        config.ttl(),
        config.lock_mode
    );

    let opened = OpenedStore::open(kind, path).await?;
    let cache = CachingCreatureRepo::with_config(opened.store.clone(), config);

    for attempt in 1..=repeat.max(1) {
        if attempt > 1 && interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        }

        let misses_before = cache.stats().misses;
        let start = Instant::now();
        let lookup = cache
            .get_creature(id)
            .await
            .with_context(|| format!("Failed to look up creature {}", id))?;
        let elapsed = start.elapsed();
        let source = if cache.stats().misses > misses_before {
            "store".yellow()
        } else {
            "cache".green()
        };

        println!("\n   #{} from {} in {:?}", attempt, source, elapsed);
        match lookup {
            CreatureLookupResult::Found(creature) => print_creature(&creature),
            CreatureLookupResult::NotFound => println!("   {}", "No such creature.".yellow()),
        }
    }

    Ok(())
}

/// Concurrent lookups against a slow store
async fn cmd_bench(config: CacheConfig, callers: usize, keys: usize, latency_ms: u64) -> Result<()> {
    let keys = keys.max(1);
    println!(
        "{} {} callers over {} creatures ({} locks, {}ms store latency)",
        "📊 Benchmarking".cyan().bold(),
        callers,
        keys,
        config.lock_mode,
        latency_ms
    );

    let memory = MemoryCreatureStore::with_capacity(keys);
    let mut ids = Vec::with_capacity(keys);
    for i in 0..keys {
        let creature = memory
            .create_creature(&format!("creature_{}", i), "benchmark subject")
            .await?;
        ids.push(creature.id);
    }

    let store = SlowStore {
        inner: memory,
        latency: Duration::from_millis(latency_ms),
    };
    let cache = Arc::new(CachingCreatureRepo::with_config(store, config));

    let pb = ProgressBar::new(callers as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let mut tasks = JoinSet::new();
    for i in 0..callers {
        let cache = cache.clone();
        let id = ids[i % keys];
        tasks.spawn(async move { cache.get_creature(id).await });
    }

    let mut found = 0usize;
    while let Some(result) = tasks.join_next().await {
        if result??.is_found() {
            found += 1;
        }
        pb.inc(1);
    }
    pb.finish();
    let elapsed = start.elapsed();

    let stats = cache.stats();
    println!("\n{}", "📈 Results:".green().bold());
    println!("   Lookups:        {}", callers);
    println!("   Found:          {}", found);
    println!("   Store fetches:  {}", stats.misses);
    println!("   Cache hits:     {}", stats.hits);
    println!("   Wall time:      {:?}", elapsed);

    if stats.misses as usize == keys.min(callers) {
        println!("   {} One store fetch per creature", "✅".green());
    } else {
        println!(
            "   {} Expected {} store fetches, saw {}",
            "❌".red(),
            keys.min(callers),
            stats.misses
        );
    }

    Ok(())
}

fn print_creature(creature: &Creature) {
    println!("   {} {}", "Id:".dimmed(), creature.id);
    println!("   {} {}", "Name:".dimmed(), creature.name);
    println!("   {} {}", "Description:".dimmed(), creature.description);
}

/// Memory store with an artificial delay on lookups.
struct SlowStore {
    inner: MemoryCreatureStore,
    latency: Duration,
}

#[async_trait]
impl CreatureStore for SlowStore {
    async fn create_creature(&self, name: &str, description: &str) -> creature_core::Result<Creature> {
        self.inner.create_creature(name, description).await
    }

    async fn get_creature(&self, id: CreatureId) -> creature_core::Result<CreatureLookupResult> {
        tokio::time::sleep(self.latency).await;
        self.inner.get_creature(id).await
    }
}
