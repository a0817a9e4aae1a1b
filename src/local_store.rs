//! Typed persistence facade over the app's logical collections.
//!
//! Each collection lives under its own stable key and is exposed as a small
//! capability handle borrowed from [`PersistentStore`]:
//!
//! | Handle              | Key                   | Encoding          | Default        |
//! |---------------------|-----------------------|-------------------|----------------|
//! | [`Favorites`]       | `vayara_favorites`    | JSON string array | empty          |
//! | [`History`]         | `vayara_history`      | JSON string array | empty          |
//! | [`RecentSearches`]  | `vayara_searches`     | JSON string array | empty          |
//! | [`Language`]        | `vayara_language`     | raw string        | fallback code  |
//! | [`SubscriptionStore`] | `vayara_subscription` | JSON record     | free tier      |
//! | [`Stats`]           | `vayara_stats`        | JSON record       | all zero       |
//! | [`LaunchMarker`]    | `vayara_has_launched` | `"true"`          | not set        |
//!
//! Reads never fail. Missing or undecodable data is reported as the
//! collection's default. A failed write is logged, kept in an in-memory
//! overlay for the rest of the session, and flips [`PersistentStore::is_degraded`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::app_response::AppResponse;
use crate::product_model::{Subscription, UserStats};

pub const FAVORITES_KEY: &str = "vayara_favorites";
pub const HISTORY_KEY: &str = "vayara_history";
pub const SEARCHES_KEY: &str = "vayara_searches";
pub const LANGUAGE_KEY: &str = "vayara_language";
pub const SUBSCRIPTION_KEY: &str = "vayara_subscription";
pub const STATS_KEY: &str = "vayara_stats";
pub const LAUNCH_MARKER_KEY: &str = "vayara_has_launched";

pub const HISTORY_LIMIT: usize = 50;
pub const SEARCHES_LIMIT: usize = 10;
pub const DEFAULT_LANGUAGE: &str = "en";

/// Raw string storage the store is built on.
pub trait StoreBackend {
    fn read(&self, key: &str) -> Result<Option<String>, AppResponse>;

    fn write(&self, key: &str, value: &str) -> Result<(), AppResponse>;

    fn remove(&self, key: &str) -> Result<(), AppResponse>;

    fn flush(&self) -> Result<(), AppResponse> {
        Ok(())
    }
}

/// Process-local backend. Used by tests and by hosts that do not want disk
/// persistence.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw value, bypassing any encoding. Handy for simulating data
    /// written by another client build.
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        self
    }
}

impl StoreBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, AppResponse> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), AppResponse> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppResponse> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Overlay entry for a key whose last write did not reach the backend.
#[derive(Debug, Clone)]
enum Pending {
    Value(String),
    Removed,
}

pub struct PersistentStore {
    backend: Box<dyn StoreBackend>,
    overlay: RefCell<HashMap<&'static str, Pending>>,
    degraded: Cell<bool>,
    fallback_language: String,
}

impl PersistentStore {
    pub fn new(backend: Box<dyn StoreBackend>) -> Self {
        Self::with_fallback_language(backend, DEFAULT_LANGUAGE)
    }

    pub fn with_fallback_language(backend: Box<dyn StoreBackend>, fallback_language: &str) -> Self {
        Self {
            backend,
            overlay: RefCell::new(HashMap::new()),
            degraded: Cell::new(false),
            fallback_language: fallback_language.to_string(),
        }
    }

    /// True once any write has failed during this session.
    pub fn is_degraded(&self) -> bool {
        self.degraded.get()
    }

    pub fn flush(&self) -> Result<(), AppResponse> {
        self.backend.flush()
    }

    pub fn favorites(&self) -> Favorites<'_> {
        Favorites { store: self }
    }

    pub fn history(&self) -> History<'_> {
        History { store: self }
    }

    pub fn searches(&self) -> RecentSearches<'_> {
        RecentSearches { store: self }
    }

    pub fn language(&self) -> Language<'_> {
        Language { store: self }
    }

    pub fn subscription(&self) -> SubscriptionStore<'_> {
        SubscriptionStore { store: self }
    }

    pub fn stats(&self) -> Stats<'_> {
        Stats { store: self }
    }

    pub fn launch_marker(&self) -> LaunchMarker<'_> {
        LaunchMarker { store: self }
    }

    fn read_raw(&self, key: &'static str) -> Option<String> {
        if let Some(pending) = self.overlay.borrow().get(key) {
            return match pending {
                Pending::Value(value) => Some(value.clone()),
                Pending::Removed => None,
            };
        }

        match self.backend.read(key) {
            Ok(value) => value,
            Err(e) => {
                debug!("Read of {key} failed, treating as empty: {e}");
                None
            }
        }
    }

    fn write_raw(&self, key: &'static str, value: String) {
        match self.backend.write(key, &value) {
            Ok(()) => {
                self.overlay.borrow_mut().remove(key);
            }
            Err(e) => {
                warn!("Write of {key} failed, keeping value in memory for this session: {e}");
                self.degraded.set(true);
                self.overlay.borrow_mut().insert(key, Pending::Value(value));
            }
        }
    }

    fn remove_raw(&self, key: &'static str) {
        match self.backend.remove(key) {
            Ok(()) => {
                self.overlay.borrow_mut().remove(key);
            }
            Err(e) => {
                warn!("Removal of {key} failed, masking it in memory for this session: {e}");
                self.degraded.set(true);
                self.overlay.borrow_mut().insert(key, Pending::Removed);
            }
        }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &'static str) -> Option<T> {
        let raw = self.read_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Stored value under {key} is not decodable, using default: {e}");
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &'static str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.write_raw(key, json),
            Err(e) => warn!("Could not encode value for {key}: {e}"),
        }
    }

    /// Stored list with repeats dropped (first occurrence wins), cut to
    /// `limit` when given. Data written by other clients may break either rule.
    fn read_list(&self, key: &'static str, limit: Option<usize>) -> Vec<String> {
        let stored: Vec<String> = self.read_json(key).unwrap_or_default();
        let mut items = unique_in_order(stored);
        if let Some(limit) = limit {
            items.truncate(limit);
        }
        items
    }

    /// Dedup-and-promote insert shared by history and recent searches.
    fn push_front_bounded(&self, key: &'static str, item: &str, limit: usize) {
        let mut items = self.read_list(key, Some(limit));
        items.retain(|existing| existing != item);
        items.insert(0, item.to_string());
        items.truncate(limit);
        self.write_json(key, &items);
    }
}

fn unique_in_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut unique: Vec<String> = Vec::new();
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

pub struct Favorites<'a> {
    store: &'a PersistentStore,
}

impl Favorites<'_> {
    pub fn get(&self) -> Vec<String> {
        self.store.read_list(FAVORITES_KEY, None)
    }

    /// Replaces the set. Duplicates in `ids` are dropped, first occurrence wins.
    pub fn set(&self, ids: &[String]) {
        let unique = unique_in_order(ids.iter().cloned());
        self.store.write_json(FAVORITES_KEY, &unique);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get().iter().any(|existing| existing == id)
    }

    pub fn add(&self, id: &str) {
        let mut ids = self.get();
        if ids.iter().any(|existing| existing == id) {
            return;
        }
        ids.push(id.to_string());
        self.store.write_json(FAVORITES_KEY, &ids);
    }

    pub fn remove(&self, id: &str) {
        let mut ids = self.get();
        let before = ids.len();
        ids.retain(|existing| existing != id);
        if ids.len() != before {
            self.store.write_json(FAVORITES_KEY, &ids);
        }
    }

    /// Flips membership and returns `true` if `id` is now a favorite.
    pub fn toggle(&self, id: &str) -> bool {
        if self.contains(id) {
            self.remove(id);
            false
        } else {
            self.add(id);
            true
        }
    }
}

pub struct History<'a> {
    store: &'a PersistentStore,
}

impl History<'_> {
    /// Most recent first.
    pub fn get(&self) -> Vec<String> {
        self.store.read_list(HISTORY_KEY, Some(HISTORY_LIMIT))
    }

    pub fn set(&self, ids: &[String]) {
        let mut bounded = unique_in_order(ids.iter().cloned());
        bounded.truncate(HISTORY_LIMIT);
        self.store.write_json(HISTORY_KEY, &bounded);
    }

    pub fn add(&self, id: &str) {
        self.store.push_front_bounded(HISTORY_KEY, id, HISTORY_LIMIT);
    }

    pub fn clear(&self) {
        self.store.remove_raw(HISTORY_KEY);
    }
}

pub struct RecentSearches<'a> {
    store: &'a PersistentStore,
}

impl RecentSearches<'_> {
    /// Most recent first.
    pub fn get(&self) -> Vec<String> {
        self.store.read_list(SEARCHES_KEY, Some(SEARCHES_LIMIT))
    }

    pub fn set(&self, queries: &[String]) {
        let mut bounded = unique_in_order(queries.iter().cloned());
        bounded.truncate(SEARCHES_LIMIT);
        self.store.write_json(SEARCHES_KEY, &bounded);
    }

    pub fn add(&self, query: &str) {
        self.store.push_front_bounded(SEARCHES_KEY, query, SEARCHES_LIMIT);
    }

    pub fn remove(&self, query: &str) {
        let mut queries = self.get();
        let before = queries.len();
        queries.retain(|existing| existing != query);
        if queries.len() != before {
            self.store.write_json(SEARCHES_KEY, &queries);
        }
    }
}

pub struct Language<'a> {
    store: &'a PersistentStore,
}

impl Language<'_> {
    /// The persisted code, or the fallback when none was ever chosen.
    pub fn get(&self) -> String {
        self.stored()
            .unwrap_or_else(|| self.store.fallback_language.clone())
    }

    /// The persisted code only; `None` means the user never picked one.
    pub fn stored(&self) -> Option<String> {
        self.store
            .read_raw(LANGUAGE_KEY)
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
    }

    pub fn set(&self, code: &str) {
        self.store.write_raw(LANGUAGE_KEY, code.to_string());
    }
}

pub struct SubscriptionStore<'a> {
    store: &'a PersistentStore,
}

impl SubscriptionStore<'_> {
    pub fn get(&self) -> Subscription {
        self.store.read_json(SUBSCRIPTION_KEY).unwrap_or_default()
    }

    pub fn set(&self, subscription: &Subscription) {
        self.store.write_json(SUBSCRIPTION_KEY, subscription);
    }
}

pub struct Stats<'a> {
    store: &'a PersistentStore,
}

impl Stats<'_> {
    pub fn get(&self) -> UserStats {
        self.store.read_json(STATS_KEY).unwrap_or_default()
    }

    /// Wholesale overwrite; the counters are computed by the caller.
    pub fn update(&self, stats: &UserStats) {
        self.store.write_json(STATS_KEY, stats);
    }

    pub fn set(&self, stats: &UserStats) {
        self.update(stats);
    }
}

pub struct LaunchMarker<'a> {
    store: &'a PersistentStore,
}

impl LaunchMarker<'_> {
    pub fn is_set(&self) -> bool {
        self.store
            .read_raw(LAUNCH_MARKER_KEY)
            .is_some_and(|value| value.trim() == "true")
    }

    pub fn mark(&self) {
        self.store.write_raw(LAUNCH_MARKER_KEY, "true".to_string());
    }
}
