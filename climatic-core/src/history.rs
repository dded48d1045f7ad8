//! Most-recent-first log of location searches.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::{
    model::{NewSearch, SearchHistoryEntry, now_millis},
    query::{QueryCache, QueryClient, QueryKey},
    store::{KeyValueStore, read_or_default, write_value},
};

pub const HISTORY_KEY: &str = "search-history";
pub const MAX_HISTORY: usize = 10;

/// Sole writer of the `search-history` key. Repeated searches are kept.
pub struct SearchHistory {
    store: Arc<dyn KeyValueStore>,
    client: QueryClient,
    entries: Vec<SearchHistoryEntry>,
    view: QueryCache<Vec<SearchHistoryEntry>>,
}

impl SearchHistory {
    pub fn new(store: Arc<dyn KeyValueStore>, client: QueryClient) -> Self {
        let entries = read_or_default(store.as_ref(), HISTORY_KEY, Vec::new());
        let view = QueryCache::new(None).listen(&client);

        Self {
            store,
            client,
            entries,
            view,
        }
    }

    pub fn history(&self) -> Vec<SearchHistoryEntry> {
        self.view
            .read(&QueryKey::search_history(), || self.entries.clone())
    }

    pub fn add(&mut self, search: NewSearch) -> Vec<SearchHistoryEntry> {
        tracing::info!(query = %search.query, "Recording search");

        self.entries.insert(
            0,
            SearchHistoryEntry {
                query: search.query,
                name: search.name,
                state: search.state,
                country: search.country,
                lat: search.lat,
                lon: search.lon,
                searched_at: now_millis(),
            },
        );
        self.entries.truncate(MAX_HISTORY);

        self.commit();
        self.entries.clone()
    }

    pub fn clear(&mut self) -> Vec<SearchHistoryEntry> {
        tracing::info!("Clearing search history");
        self.entries.clear();
        self.commit();
        Vec::new()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.client.subscribe()
    }

    fn commit(&self) {
        write_value(self.store.as_ref(), HISTORY_KEY, &self.entries);
        self.client.invalidate(&QueryKey::search_history());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn search(query: &str) -> NewSearch {
        NewSearch {
            query: query.to_string(),
            name: query.to_string(),
            state: None,
            country: "GB".to_string(),
            lat: 51.5072,
            lon: -0.1276,
        }
    }

    fn setup() -> (Arc<MemoryStore>, SearchHistory) {
        let store = Arc::new(MemoryStore::new());
        let history = SearchHistory::new(store.clone(), QueryClient::new());
        (store, history)
    }

    fn queries(entries: &[SearchHistoryEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.query.as_str()).collect()
    }

    #[test]
    fn starts_empty() {
        let (_, history) = setup();
        assert!(history.history().is_empty());
    }

    #[test]
    fn newest_search_comes_first_then_clear_empties() {
        let (store, mut history) = setup();

        history.add(search("London"));
        history.add(search("Paris"));
        assert_eq!(queries(&history.history()), vec!["Paris", "London"]);

        assert!(history.clear().is_empty());
        assert!(history.history().is_empty());
        assert_eq!(store.raw(HISTORY_KEY).as_deref(), Some("[]"));
    }

    #[test]
    fn repeated_searches_are_not_deduplicated() {
        let (_, mut history) = setup();
        history.add(search("London"));
        let list = history.add(search("London"));
        assert_eq!(queries(&list), vec!["London", "London"]);
    }

    #[test]
    fn history_is_capped_to_most_recent() {
        let (_, mut history) = setup();
        for i in 0..15 {
            history.add(search(&format!("q{i}")));
        }

        let list = history.history();
        assert_eq!(list.len(), MAX_HISTORY);
        assert_eq!(list[0].query, "q14");
        assert_eq!(list[MAX_HISTORY - 1].query, "q5");
    }

    #[test]
    fn survives_reload_from_same_store() {
        let (store, mut history) = setup();
        history.add(search("London"));

        let reloaded = SearchHistory::new(store, QueryClient::new());
        assert_eq!(queries(&reloaded.history()), vec!["London"]);
    }

    #[test]
    fn persisted_entries_match_memory() {
        let (store, mut history) = setup();
        history.add(search("London"));
        let list = history.add(search("Paris"));

        let persisted: Vec<SearchHistoryEntry> = read_or_default(store.as_ref(), HISTORY_KEY, Vec::new());
        assert_eq!(persisted, list);

        let reloaded = SearchHistory::new(store, QueryClient::new());
        assert_eq!(reloaded.history(), list);
    }

    #[test]
    fn every_mutation_invalidates() {
        let (_, mut history) = setup();
        let mut events = history.subscribe();

        history.add(search("London"));
        history.clear();

        assert_eq!(events.try_recv().expect("add"), QueryKey::search_history());
        assert_eq!(events.try_recv().expect("clear"), QueryKey::search_history());
    }
}
