//! Query parameter state kept in sync across the URL, memory and durable
//! storage.
//!
//! The store never touches the address bar itself. State changes queue
//! [`NavigationCommand`]s that a driver applies on its next turn with
//! [`ParamStore::flush`], then reports the resulting URL back through
//! [`ParamStore::on_navigate`].

mod navigation;
mod query;

pub use navigation::{History, NavigationCommand, NavigationError, Navigator};
pub use query::{ParamValue, QueryParams, join_location, query_pairs, split_location};

use std::collections::{HashSet, VecDeque};

use crate::storage::KeyValueStore;

/// Storage key of the persisted parameter snapshot
pub const STORAGE_KEY: &str = "docs_query_params";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Replace the history entry instead of pushing one
    pub replace: bool,
    /// Merge the patch into current state instead of replacing it
    pub preserve_others: bool,
}

impl UpdateOptions {
    pub fn replace() -> Self {
        Self {
            replace: true,
            ..Self::default()
        }
    }

    pub fn exclusive(mut self) -> Self {
        self.preserve_others = false;
        self
    }
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            replace: false,
            preserve_others: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Uninitialized,
    Synchronized { pathname: String, params: QueryParams },
}

/// Per-session parameter store
pub struct ParamStore<S> {
    storage: S,
    phase: Phase,
    pending: VecDeque<NavigationCommand>,
}

impl<S: KeyValueStore> ParamStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            phase: Phase::Uninitialized,
            pending: VecDeque::new(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn is_synchronized(&self) -> bool {
        matches!(self.phase, Phase::Synchronized { .. })
    }

    /// Current state, `None` before mount
    pub fn params(&self) -> Option<&QueryParams> {
        match &self.phase {
            Phase::Synchronized { params, .. } => Some(params),
            Phase::Uninitialized => None,
        }
    }

    pub fn pathname(&self) -> Option<&str> {
        match &self.phase {
            Phase::Synchronized { pathname, .. } => Some(pathname),
            Phase::Uninitialized => None,
        }
    }

    /// Load state from `location` and the stored snapshot. Every key named in
    /// the URL wins, even with an empty value.
    pub fn mount(&mut self, location: &str) {
        let (pathname, query) = split_location(location);
        let snapshot = self.load_snapshot();
        let params = merge_with_url(query, &snapshot);

        self.reconcile(pathname, query, &snapshot);
        self.phase = Phase::Synchronized {
            pathname: pathname.to_string(),
            params,
        };
        self.persist();
    }

    /// Handle a navigation to `location`, including back/forward.
    ///
    /// Snapshot keys missing from the URL are put back into it with a replace;
    /// keys already in the URL are left alone.
    pub fn on_navigate(&mut self, location: &str) {
        if !self.is_synchronized() {
            self.mount(location);
            return;
        }

        let (pathname, query) = split_location(location);
        let snapshot = self.load_snapshot();
        let params = merge_with_url(query, &snapshot);

        self.reconcile(pathname, query, &snapshot);
        let changed = params != snapshot;
        self.phase = Phase::Synchronized {
            pathname: pathname.to_string(),
            params,
        };
        if changed {
            self.persist();
        }
    }

    /// Apply `patch`; empty or absent values delete their keys
    pub fn update<I, K, V>(&mut self, patch: I, options: UpdateOptions)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        let Phase::Synchronized { pathname, params } = &mut self.phase else {
            tracing::debug!("Ignoring parameter update before mount");
            return;
        };

        let mut next = if options.preserve_others {
            params.clone()
        } else {
            QueryParams::new()
        };
        for (key, value) in patch {
            next.set(key, value);
        }

        let url = join_location(pathname, &next.to_query_string());
        *params = next;
        self.pending.push_back(NavigationCommand {
            url,
            replace: options.replace,
        });
        self.persist();
    }

    pub fn remove<K: AsRef<str>>(&mut self, keys: &[K]) {
        self.update(
            keys.iter().map(|k| (k.as_ref(), ParamValue::Absent)),
            UpdateOptions::replace(),
        );
    }

    /// Drop all parameters, navigate to the bare path and erase the snapshot
    pub fn clear(&mut self) {
        let Phase::Synchronized { pathname, params } = &mut self.phase else {
            return;
        };

        *params = QueryParams::new();
        self.pending.push_back(NavigationCommand::replace(pathname.clone()));
        if let Err(e) = self.storage.erase(STORAGE_KEY) {
            tracing::warn!("Failed to clear stored query params: {}", e);
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params()?.get(key)
    }

    /// Best-effort write of the current state as the session ends
    pub fn before_unload(&mut self) {
        if self.is_synchronized() {
            self.persist();
        }
    }

    pub fn pending(&self) -> impl Iterator<Item = &NavigationCommand> {
        self.pending.iter()
    }

    pub fn take_pending(&mut self) -> Vec<NavigationCommand> {
        self.pending.drain(..).collect()
    }

    /// Apply queued navigations in order. Failures are logged and dropped;
    /// in-memory state stays as it is.
    pub fn flush<N: Navigator>(&mut self, navigator: &mut N) -> usize {
        let mut applied = 0;
        while let Some(command) = self.pending.pop_front() {
            match navigator.navigate(&command) {
                Ok(()) => applied += 1,
                Err(e) => tracing::warn!("Failed to update URL: {}", e),
            }
        }
        applied
    }

    fn reconcile(&mut self, pathname: &str, query: &str, snapshot: &QueryParams) {
        let mut pairs = query_pairs(query);
        let present: HashSet<String> = pairs.iter().map(|(k, _)| k.clone()).collect();

        let mut restored = false;
        for (key, value) in snapshot.iter() {
            if present.contains(key) {
                continue;
            }
            for v in value.values() {
                pairs.push((key.to_string(), v.to_string()));
            }
            restored = true;
        }

        if restored {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&pairs)
                .finish();
            tracing::debug!("Restoring stored query params into {}", pathname);
            self.pending
                .push_back(NavigationCommand::replace(join_location(pathname, &query)));
        }
    }

    fn load_snapshot(&self) -> QueryParams {
        let stored = match self.storage.read(STORAGE_KEY) {
            Ok(Some(stored)) => stored,
            Ok(None) => return QueryParams::new(),
            Err(e) => {
                tracing::warn!("Failed to read stored query params: {}", e);
                return QueryParams::new();
            }
        };

        serde_json::from_str(&stored).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse stored query params: {}", e);
            QueryParams::new()
        })
    }

    fn persist(&mut self) {
        let Some(params) = self.params() else {
            return;
        };
        let json = match serde_json::to_string(params) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to encode query params: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.write(STORAGE_KEY, &json) {
            tracing::warn!("Failed to save query params: {}", e);
        }
    }
}

/// Snapshot keys the URL does not name, overlaid by the URL's own values.
/// A key present with an empty value shadows the snapshot and stays unset.
fn merge_with_url(query: &str, snapshot: &QueryParams) -> QueryParams {
    let mut base = snapshot.clone();
    for (key, _) in query_pairs(query) {
        base.remove(&key);
    }
    QueryParams::from_query(query).overlay(&base)
}
