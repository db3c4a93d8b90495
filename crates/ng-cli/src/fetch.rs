//! Remote blocklist source with an on-disk cache.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use ng_core::blocklist::{Blocklist, BlocklistSource, CategoryEntry};
use ng_core::cache::{
    BlocklistCache, CachePolicy, KeyValueStore, Origin, CATEGORIES_KEY, CHANNELS_KEY,
};
use ng_core::EngineError;
use serde::de::DeserializeOwned;

pub const DEFAULT_API: &str = "https://www.nogamblettv.app/api";

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

/// Key-value store persisted as one JSON object.
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open `path`; a missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self, String> {
        let entries = match fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| format!("Invalid cache file '{}': {}", path.display(), e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(format!("Failed to read '{}': {}", path.display(), e)),
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    fn persist(&self) -> Result<(), String> {
        let text = serde_json::to_string_pretty(&self.entries).map_err(|e| e.to_string())?;
        fs::write(&self.path, text).map_err(|e| e.to_string())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> ng_core::error::Result<()> {
        self.entries.insert(key.to_string(), value);
        self.persist().map_err(|reason| EngineError::CacheStore {
            key: key.to_string(),
            reason,
        })
    }
}

/// Blocklist API behind the cache: fresh entries are served from disk, stale
/// or missing ones are fetched, and a failed fetch falls back to whatever
/// was cached last.
pub struct RemoteSource {
    api: String,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    cache: RefCell<BlocklistCache<FileStore>>,
    origins: RefCell<Vec<(&'static str, Origin)>>,
}

impl RemoteSource {
    pub fn new(api: &str, store: FileStore, policy: CachePolicy) -> Result<Self, String> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;
        Ok(Self {
            api: api.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            runtime,
            cache: RefCell::new(BlocklistCache::new(store, policy)),
            origins: RefCell::new(Vec::new()),
        })
    }

    /// Where each resolved list came from, in resolution order.
    pub fn origins(&self) -> Vec<(&'static str, Origin)> {
        self.origins.borrow().clone()
    }

    fn resolve<T>(&self, key: &'static str) -> T
    where
        T: serde::Serialize + DeserializeOwned + Default,
    {
        let url = format!("{}/{}", self.api, key);
        let (value, origin) = self.cache.borrow_mut().resolve(key, now_ms(), || {
            self.runtime.block_on(fetch_json::<T>(&self.client, &url))
        });
        self.origins.borrow_mut().push((key, origin));
        value
    }
}

async fn fetch_json<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T, String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("GET {} failed: {}", url, e))?
        .error_for_status()
        .map_err(|e| format!("GET {} failed: {}", url, e))?;
    response
        .json::<T>()
        .await
        .map_err(|e| format!("Invalid response from {}: {}", url, e))
}

impl BlocklistSource for RemoteSource {
    fn blocked_channels(&self) -> HashSet<String> {
        self.resolve::<Vec<String>>(CHANNELS_KEY)
            .into_iter()
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect()
    }

    fn blocked_categories(&self) -> HashMap<String, String> {
        self.resolve::<Vec<CategoryEntry>>(CATEGORIES_KEY)
            .into_iter()
            .map(|entry| (entry.slug.to_lowercase(), entry.name))
            .collect()
    }
}

/// Blocklist from the cache file alone, stale or not. No network access.
pub fn cached_blocklist(store: FileStore) -> Blocklist {
    let cache = BlocklistCache::new(store, CachePolicy::default());
    let channels = cache
        .entry::<Vec<String>>(CHANNELS_KEY)
        .map(|entry| entry.value)
        .unwrap_or_default();
    let categories = cache
        .entry::<Vec<CategoryEntry>>(CATEGORIES_KEY)
        .map(|entry| entry.value)
        .unwrap_or_default();
    Blocklist::with_default_categories(channels, categories)
}
