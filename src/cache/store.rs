//! Path Cache Module
//!
//! Persistent nested key-value store addressed by [`CachePath`]s.

use std::collections::HashSet;

use chrono::Local;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::cache::snapshot::{Snapshot, SnapshotRead};
use crate::cache::template::{self, LINKS_KEY};
use crate::cache::{tree, CachePath, CacheStats};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Path Cache ==
/// The crawler's persistent state: seen links, jail state and cookies.
#[derive(Debug)]
pub struct PathCache {
    /// Root mapping of the cache tree
    root: Map<String, Value>,
    /// Where the tree is persisted
    snapshot: Snapshot,
    /// Activity counters for this run
    stats: CacheStats,
}

impl PathCache {
    // == Load ==
    /// Loads the cache from the snapshot named by the configuration.
    pub fn load(config: &Config) -> Self {
        Self::load_from(Snapshot::new(config.snapshot_path(), config.dry_run))
    }

    /// Loads the cache from `snapshot`.
    ///
    /// A missing or unreadable snapshot yields the template; a snapshot
    /// missing some template keys gets them backfilled.
    pub fn load_from(snapshot: Snapshot) -> Self {
        if snapshot.is_dry_run() {
            info!("Loading cache in dry-run mode.");
        }

        let now = Local::now().naive_local();
        let root = match snapshot.read() {
            SnapshotRead::Loaded(mut root) => {
                debug!("Loaded {} from disk.", snapshot.path().display());
                for key in template::backfill(&mut root, now) {
                    debug!("Adding missing key {} to cache.", key);
                }
                root
            }
            SnapshotRead::Missing => {
                warn!(
                    "{} does not exist, starting from the cache template",
                    snapshot.path().display()
                );
                template::template(now)
            }
            SnapshotRead::Corrupt(reason) => {
                warn!(
                    "Could not read {} ({}), starting from the cache template",
                    snapshot.path().display(),
                    reason
                );
                template::template(now)
            }
        };

        Self {
            root,
            snapshot,
            stats: CacheStats::new(),
        }
    }

    /// A template cache that is never written to disk.
    pub fn ephemeral() -> Self {
        Self {
            root: template::template(Local::now().naive_local()),
            snapshot: Snapshot::new(crate::config::SNAPSHOT_FILE, true),
            stats: CacheStats::new(),
        }
    }

    // == Get ==
    /// Retrieves the value at `path`.
    ///
    /// Fails with `KeyNotFound` if any segment is absent.
    pub fn get(&mut self, path: &CachePath) -> Result<&Value> {
        match tree::lookup(&self.root, path.segments()) {
            Some(value) => {
                self.stats.record_hit();
                Ok(value)
            }
            None => {
                self.stats.record_miss();
                Err(CacheError::KeyNotFound(path.to_string()))
            }
        }
    }

    // == Has ==
    /// True if the container at `path` holds `value`. Lookup failures yield false.
    pub fn has(&mut self, value: &Value, path: &CachePath) -> bool {
        match self.get(path) {
            Ok(container) => tree::contains(container, value),
            Err(_) => {
                debug!("Didn't find {} in {}", value, path);
                false
            }
        }
    }

    /// True if anything is stored at `path`.
    pub fn has_key(&mut self, path: &CachePath) -> bool {
        self.get(path).is_ok()
    }

    // == Set ==
    /// Writes `value` at `path`, keeping every sibling subtree.
    ///
    /// Persists immediately when `commit` is set.
    pub fn set(&mut self, value: Value, path: &CachePath, commit: bool) -> Result<()> {
        debug!("Setting new cache value for key {}", path);
        let head = path.head().to_string();
        let existing = self.root.remove(&head);
        let merged = tree::graft(existing, path.tail(), value);
        self.root.insert(head, merged);

        if commit {
            self.save()?;
        }
        Ok(())
    }

    // == Append ==
    /// Appends `value` unless the sequence at `path` already holds it.
    ///
    /// Returns whether the value was appended.
    pub fn append_unique(&mut self, value: Value, path: &CachePath, commit: bool) -> Result<bool> {
        if self.has(&value, path) {
            debug!("Value {} already exists in cache.", value);
            self.stats.record_duplicate_skip();
            return Ok(false);
        }
        self.append(value, path, commit)?;
        Ok(true)
    }

    /// Appends `value` to the container at `path`.
    ///
    /// Like containers are concatenated, anything else is pushed onto a
    /// sequence. The path must already exist.
    pub fn append(&mut self, value: Value, path: &CachePath, commit: bool) -> Result<()> {
        debug!("Appending {} to {}", value, path);
        let target = match tree::lookup_mut(&mut self.root, path.segments()) {
            Some(target) => target,
            None => {
                self.stats.record_miss();
                return Err(CacheError::KeyNotFound(format!(
                    "cannot append to missing key {}",
                    path
                )));
            }
        };

        match (target, value) {
            (Value::Array(items), Value::Array(more)) => items.extend(more),
            (Value::Object(map), Value::Object(more)) => map.extend(more),
            (Value::Array(items), other) => items.push(other),
            (existing, _) => {
                error!("Error trying to append to {} in cache", path);
                return Err(CacheError::AppendTypeError {
                    path: path.to_string(),
                    kind: tree::kind_name(existing),
                });
            }
        }
        self.stats.record_append();

        if commit {
            self.save()?;
        }
        Ok(())
    }

    // == Reset ==
    /// Restores one template subtree to its default and persists.
    ///
    /// Refuses keys outside the template.
    pub fn reset(&mut self, key: &str) -> Result<()> {
        let default = template::default_for(key, Local::now().naive_local())
            .ok_or_else(|| CacheError::InvalidKey(key.to_string()))?;
        warn!("Resetting {} key in cache.", key);
        self.root.insert(key.to_string(), default);
        self.save()
    }

    // == Dedupe ==
    /// Removes duplicate elements from every sequence in the cache.
    ///
    /// Top-level sequences and sequences one level below a top-level mapping
    /// are deduped; everything else is left alone. Returns the number of
    /// elements removed.
    pub fn dedupe(&mut self) -> usize {
        template::backfill(&mut self.root, Local::now().naive_local());

        let mut removed = 0;
        for (key, value) in self.root.iter_mut() {
            let count = tree::dedupe_subtree(value);
            if count > 0 {
                info!("Deduped {} items in {}", count, key);
            }
            removed += count;
        }

        self.stats.record_dedupe(removed);
        info!("Deduped {} items", removed);
        removed
    }

    // == Clean Key ==
    /// Keeps only the entries of the mapping at `path` whose key is in
    /// `known`, then persists. Returns how many entries were evicted.
    pub fn clean_key<S: AsRef<str>>(&mut self, known: &[S], path: &CachePath) -> Result<usize> {
        let cached = match self.get(path)? {
            Value::Object(map) => map.clone(),
            _ => return Err(CacheError::NotAMapping(path.to_string())),
        };

        let known: HashSet<&str> = known.iter().map(AsRef::as_ref).collect();
        let before = cached.len();
        let cleaned: Map<String, Value> = cached
            .into_iter()
            .filter(|(key, _)| known.contains(key.as_str()))
            .collect();
        let removed = before - cleaned.len();

        info!("Cleaned {} stale entries from {}", removed, path);
        self.set(Value::Object(cleaned), path, true)?;
        Ok(removed)
    }

    // == Save ==
    /// Writes the whole cache to its snapshot. No-op in dry-run mode.
    ///
    /// A failed write is logged loudly; the in-memory state is kept.
    pub fn save(&mut self) -> Result<()> {
        match self.snapshot.write(&self.root) {
            Ok(()) => {
                self.stats.record_save();
                Ok(())
            }
            Err(err) => {
                error!("{}", err);
                Err(err)
            }
        }
    }

    // == Accessors ==
    /// The cache tree as it currently stands in memory.
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Total number of links recorded across all feeds.
    pub fn link_count(&self) -> usize {
        self.root
            .get(LINKS_KEY)
            .and_then(Value::as_object)
            .map(|feeds| {
                feeds
                    .values()
                    .filter_map(Value::as_array)
                    .map(Vec::len)
                    .sum()
            })
            .unwrap_or(0)
    }
}
