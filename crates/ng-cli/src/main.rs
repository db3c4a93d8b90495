//! NoGamble CLI
//!
//! Developer tool for classifying locations, refreshing the cached blocklist
//! and exporting TypeScript bindings for the extension glue.

#[cfg(feature = "e2e")]
mod e2e;
mod fetch;

use std::path::Path;
use std::time::Instant;

use clap::{Parser, Subcommand};
use ts_rs::TS;

use ng_core::blocklist::{BlocklistSource, CategoryEntry};
use ng_core::cache::CachePolicy;
use ng_core::config::EngineConfig;
use ng_core::controller::classify;
use ng_core::{extract_category, extract_channel, SuppressionPolicy};

use crate::fetch::{cached_blocklist, FileStore, RemoteSource, DEFAULT_API};

#[derive(Parser)]
#[command(name = "ng-cli")]
#[command(about = "NoGamble blocklist and classification tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract channel / category identities from paths or hrefs
    Classify {
        /// Paths or hrefs to classify
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Refresh the cached blocklist from the API
    Fetch {
        /// Blocklist API base URL
        #[arg(long, default_value = DEFAULT_API)]
        api: String,

        /// Cache file
        #[arg(short, long, default_value = "nogamble-cache.json")]
        cache: String,

        /// Ignore the freshness window
        #[arg(short, long)]
        force: bool,
    },

    /// Show the page mode of a location against the cached blocklist
    Check {
        /// Location to check
        location: String,

        /// Cache file
        #[arg(short, long, default_value = "nogamble-cache.json")]
        cache: String,
    },

    /// Export TypeScript definitions for the engine configuration
    Bindings {
        /// Output directory
        #[arg(short, long, default_value = "bindings")]
        out: String,
    },

    /// Run the extension end-to-end checks in Chrome
    #[cfg(feature = "e2e")]
    E2e {
        /// WebDriver endpoint
        #[arg(long, default_value = "http://localhost:9515")]
        chromedriver_url: String,

        /// Unpacked extension directory
        #[arg(long)]
        extension_path: String,

        /// Blocked channel whose page must show the overlay
        #[arg(long, default_value = "trainwreckstv")]
        channel: String,

        /// Run Chrome headless
        #[arg(long)]
        headless: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Classify { paths } => cmd_classify(&paths),
        Commands::Fetch { api, cache, force } => cmd_fetch(&api, &cache, force),
        Commands::Check { location, cache } => cmd_check(&location, &cache),
        Commands::Bindings { out } => cmd_bindings(&out),
        #[cfg(feature = "e2e")]
        Commands::E2e {
            chromedriver_url,
            extension_path,
            channel,
            headless,
        } => e2e::run_e2e(e2e::E2eOptions {
            chromedriver_url,
            extension_path,
            channel,
            headless,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_classify(paths: &[String]) -> Result<(), String> {
    for path in paths {
        let channel = extract_channel(path);
        let category = extract_category(path);
        match (channel, category) {
            (Some(handle), _) => println!("{:<48} channel  {}", path, handle),
            (None, Some(slug)) => println!("{:<48} category {}", path, slug),
            (None, None) => println!("{:<48} -", path),
        }
    }
    Ok(())
}

fn cmd_fetch(api: &str, cache: &str, force: bool) -> Result<(), String> {
    let start = Instant::now();
    let store = FileStore::open(Path::new(cache))?;
    let policy = if force {
        CachePolicy { ttl_ms: 0 }
    } else {
        CachePolicy::default()
    };

    let source = RemoteSource::new(api, store, policy)?;
    let blocklist = source.snapshot();

    println!("Blocklist from '{}' (cache '{}')", api, cache);
    for (key, origin) in source.origins() {
        println!("  {:<12} {:?}", key, origin);
    }
    println!("  Channels:    {}", blocklist.channel_count());
    println!("  Categories:  {}", blocklist.category_count());
    println!("  Time:        {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);

    Ok(())
}

fn cmd_check(location: &str, cache: &str) -> Result<(), String> {
    let store = FileStore::open(Path::new(cache))?;
    let blocklist = cached_blocklist(store);
    if blocklist.channel_count() == 0 {
        eprintln!("Warning: no cached channels in '{}', run `ng-cli fetch` first", cache);
    }

    let mode = classify(location, &blocklist);
    println!("{}", mode.label());
    Ok(())
}

fn cmd_bindings(out: &str) -> Result<(), String> {
    let out = Path::new(out);
    EngineConfig::export_all_to(out).map_err(|e| format!("Failed to export bindings: {}", e))?;
    CategoryEntry::export_all_to(out).map_err(|e| format!("Failed to export bindings: {}", e))?;
    SuppressionPolicy::export_all_to(out).map_err(|e| format!("Failed to export bindings: {}", e))?;
    println!("Exported TypeScript bindings to '{}'", out.display());
    Ok(())
}
