use std::collections::HashSet;

use crate::error::PinError;
use crate::kv::KeyValueStore;
use crate::model::{PinList, PinnedRepository, RepoId};

pub const DEFAULT_KEY_PREFIX: &str = "pinned:";

/// Ordered, duplicate-free pin lists, one serialized blob per username.
///
/// Every mutation reads the whole list and writes it back. There is no
/// version check between the two, so concurrent mutations for the same user
/// can overwrite each other (last write wins).
pub struct PinStore<K> {
    kv: K,
    key_prefix: String,
}

impl<K: KeyValueStore> PinStore<K> {
    pub fn new(kv: K) -> Self {
        Self::with_prefix(kv, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(kv: K, key_prefix: &str) -> Self {
        PinStore {
            kv,
            key_prefix: key_prefix.to_string(),
        }
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    fn key(&self, username: &str) -> Result<String, PinError> {
        if username.trim().is_empty() {
            return Err(PinError::validation("Username is required"));
        }
        Ok(format!("{}{}", self.key_prefix, username))
    }

    async fn load(&self, key: &str) -> Result<PinList, PinError> {
        match self.kv.get(key).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| PinError::Corrupt {
                key: key.to_string(),
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, key: &str, pins: &PinList) -> Result<(), PinError> {
        let raw = serde_json::to_string(pins).map_err(PinError::Encode)?;
        self.kv.put(key, raw).await?;
        Ok(())
    }

    /// A username that was never written has an empty list.
    pub async fn get(&self, username: &str) -> Result<PinList, PinError> {
        let key = self.key(username)?;
        self.load(&key).await
    }

    /// Appends `repo` unless its id is already pinned, in which case the
    /// stored entry wins and nothing is written.
    pub async fn add(&self, username: &str, repo: PinnedRepository) -> Result<PinList, PinError> {
        if repo.id.is_blank() {
            return Err(PinError::validation("Invalid repository data"));
        }

        let key = self.key(username)?;
        let mut pins = self.load(&key).await?;

        if pins.iter().any(|pin| pin.id == repo.id) {
            tracing::debug!(username, repo_id = %repo.id, "repository already pinned");
            return Ok(pins);
        }

        pins.push(repo);
        self.save(&key, &pins).await?;
        Ok(pins)
    }

    pub async fn remove(&self, username: &str, repo_id: &str) -> Result<PinList, PinError> {
        let repo_id = RepoId::parse(repo_id)?;
        let key = self.key(username)?;

        let mut pins = self.load(&key).await?;
        pins.retain(|pin| pin.id != repo_id);

        self.save(&key, &pins).await?;
        Ok(pins)
    }

    /// Puts existing entries in the order of `repo_ids`. Unknown ids are
    /// ignored; entries missing from `repo_ids` keep their relative order
    /// after the ones that were named.
    pub async fn reorder(&self, username: &str, repo_ids: &[RepoId]) -> Result<PinList, PinError> {
        let key = self.key(username)?;
        let current = self.load(&key).await?;

        let mut slots: Vec<Option<PinnedRepository>> = current.into_iter().map(Some).collect();
        let mut seen = HashSet::new();
        let mut reordered = Vec::with_capacity(slots.len());

        for id in repo_ids {
            let canonical = id.canonical();
            if !seen.insert(canonical.clone()) {
                continue;
            }
            let found = slots
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|pin| pin.id.canonical() == canonical));
            if let Some(pin) = found.and_then(Option::take) {
                reordered.push(pin);
            }
        }
        reordered.extend(slots.into_iter().flatten());

        self.save(&key, &reordered).await?;
        Ok(reordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KvError;
    use crate::kv::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct CountingStore {
        inner: MemoryStore,
        writes: Arc<AtomicUsize>,
    }

    impl KeyValueStore for CountingStore {
        async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: String) -> Result<(), KvError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.put(key, value).await
        }
    }

    fn repo(value: serde_json::Value) -> PinnedRepository {
        PinnedRepository::from_json(Some(value)).unwrap()
    }

    fn ids(pins: &PinList) -> Vec<String> {
        pins.iter().map(|p| p.id.canonical()).collect()
    }

    async fn seeded(names: &[&str]) -> PinStore<MemoryStore> {
        let store = PinStore::new(MemoryStore::new());
        for name in names {
            store.add("octocat", repo(json!({ "id": name }))).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn unknown_user_has_empty_list() {
        let store = PinStore::new(MemoryStore::new());
        assert!(store.get("never-seen").await.unwrap().is_empty());
        assert!(store.kv().is_empty());
    }

    #[tokio::test]
    async fn add_appends_and_persists_under_prefixed_key() {
        let store = PinStore::new(MemoryStore::new());
        store.add("octocat", repo(json!({"id": 1, "name": "x"}))).await.unwrap();
        let pins = store.add("octocat", repo(json!({"id": 2}))).await.unwrap();

        assert_eq!(ids(&pins), vec!["1", "2"]);
        let raw = store.kv().get("pinned:octocat").await.unwrap().unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&raw).unwrap(),
            json!([{"id": 1, "name": "x"}, {"id": 2}])
        );
    }

    #[tokio::test]
    async fn duplicate_add_keeps_first_entry_and_skips_write() {
        let kv = CountingStore::default();
        let store = PinStore::new(kv.clone());

        store.add("octocat", repo(json!({"id": 1, "name": "first"}))).await.unwrap();
        store.add("octocat", repo(json!({"id": 1, "name": "second"}))).await.unwrap();
        let pins = store.add("octocat", repo(json!({"id": "1"}))).await.unwrap();

        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].name(), Some("first"));
        assert_eq!(kv.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn add_rejects_blank_id() {
        let store = PinStore::new(MemoryStore::new());
        let err = store
            .add("octocat", PinnedRepository::new(RepoId::Text(" ".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, PinError::Validation { .. }));
    }

    #[tokio::test]
    async fn empty_username_is_rejected() {
        let store = PinStore::new(MemoryStore::new());
        assert!(matches!(
            store.get("  ").await.unwrap_err(),
            PinError::Validation { .. }
        ));
    }

    #[tokio::test]
    async fn remove_matches_numeric_ids_given_as_text() {
        let store = PinStore::new(MemoryStore::new());
        store.add("octocat", repo(json!({"id": 7}))).await.unwrap();
        store.add("octocat", repo(json!({"id": 8}))).await.unwrap();

        let pins = store.remove("octocat", "7").await.unwrap();
        assert_eq!(ids(&pins), vec!["8"]);
        assert_eq!(ids(&store.get("octocat").await.unwrap()), vec!["8"]);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = seeded(&["a", "b"]).await;

        let once = store.remove("octocat", "a").await.unwrap();
        let twice = store.remove("octocat", "a").await.unwrap();
        assert_eq!(once, twice);

        let untouched = store.remove("octocat", "missing").await.unwrap();
        assert_eq!(ids(&untouched), vec!["b"]);
    }

    #[tokio::test]
    async fn remove_requires_an_id() {
        let store = seeded(&["a"]).await;
        assert!(matches!(
            store.remove("octocat", "").await.unwrap_err(),
            PinError::Validation { .. }
        ));
    }

    #[tokio::test]
    async fn reorder_persists_requested_order() {
        let store = seeded(&["a", "b", "c"]).await;
        let order = [
            RepoId::Text("b".into()),
            RepoId::Text("a".into()),
            RepoId::Text("c".into()),
        ];

        store.reorder("octocat", &order).await.unwrap();
        assert_eq!(ids(&store.get("octocat").await.unwrap()), vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn reorder_ignores_unknown_and_appends_omitted_entries() {
        let store = seeded(&["a", "b", "c", "d"]).await;
        let order = [
            RepoId::Text("c".into()),
            RepoId::Text("zzz".into()),
            RepoId::Text("a".into()),
            RepoId::Text("c".into()),
        ];

        let pins = store.reorder("octocat", &order).await.unwrap();
        assert_eq!(ids(&pins), vec!["c", "a", "b", "d"]);
    }

    #[tokio::test]
    async fn reorder_of_empty_list_stays_empty() {
        let store = PinStore::new(MemoryStore::new());
        let pins = store.reorder("octocat", &[RepoId::Numeric(1)]).await.unwrap();
        assert!(pins.is_empty());
    }

    #[tokio::test]
    async fn corrupt_record_is_an_error_not_an_empty_list() {
        let kv = MemoryStore::new();
        kv.put("pinned:octocat", "not json".to_string()).await.unwrap();
        let store = PinStore::new(kv);

        assert!(matches!(
            store.get("octocat").await.unwrap_err(),
            PinError::Corrupt { .. }
        ));
        assert!(matches!(
            store.add("octocat", repo(json!({"id": 1}))).await.unwrap_err(),
            PinError::Corrupt { .. }
        ));
        assert_eq!(
            store.kv().get("pinned:octocat").await.unwrap().as_deref(),
            Some("not json")
        );
    }

    #[tokio::test]
    async fn custom_prefix_namespaces_keys() {
        let store = PinStore::with_prefix(MemoryStore::new(), "pins/");
        store.add("octocat", repo(json!({"id": 1}))).await.unwrap();
        assert!(store.kv().get("pins/octocat").await.unwrap().is_some());
        assert!(store.kv().get("pinned:octocat").await.unwrap().is_none());
    }
}
