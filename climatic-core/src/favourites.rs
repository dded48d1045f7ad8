//! User-pinned cities, persisted under the `favourites` key.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::{
    model::{FavouriteCity, NewFavourite, now_millis},
    query::{QueryCache, QueryClient, QueryKey},
    store::{KeyValueStore, read_or_default, write_value},
};

pub const FAVOURITES_KEY: &str = "favourites";

/// Oldest entries are evicted beyond this many favourites.
pub const MAX_FAVOURITES: usize = 10;

/// Sole writer of the `favourites` key.
pub struct Favourites {
    store: Arc<dyn KeyValueStore>,
    client: QueryClient,
    items: Vec<FavouriteCity>,
    view: QueryCache<Vec<FavouriteCity>>,
}

impl Favourites {
    pub fn new(store: Arc<dyn KeyValueStore>, client: QueryClient) -> Self {
        let items = read_or_default(store.as_ref(), FAVOURITES_KEY, Vec::new());
        let view = QueryCache::new(None).listen(&client);

        Self {
            store,
            client,
            items,
            view,
        }
    }

    /// Current favourites, oldest first.
    pub fn favourites(&self) -> Vec<FavouriteCity> {
        self.view
            .read(&QueryKey::favourites(), || self.items.clone())
    }

    /// Pin a city. A city whose id is already present is left alone.
    pub fn add(&mut self, candidate: NewFavourite) -> Vec<FavouriteCity> {
        let id = candidate.id();
        if self.items.iter().any(|city| city.id == id) {
            tracing::debug!(%id, "City is already a favourite");
            return self.items.clone();
        }

        tracing::info!(%id, name = %candidate.name, "Adding favourite");
        self.items.push(FavouriteCity {
            id,
            name: candidate.name,
            lat: candidate.lat,
            lon: candidate.lon,
            country: candidate.country,
            state: candidate.state,
            added_at: now_millis(),
        });

        if self.items.len() > MAX_FAVOURITES {
            let excess = self.items.len() - MAX_FAVOURITES;
            self.items.drain(..excess);
        }

        self.commit();
        self.items.clone()
    }

    /// Unpin by id. Unknown ids are not an error.
    pub fn remove(&mut self, id: &str) -> Vec<FavouriteCity> {
        tracing::info!(%id, "Removing favourite");
        self.items.retain(|city| city.id != id);
        self.commit();
        self.items.clone()
    }

    /// Exact coordinate match, no tolerance.
    pub fn is_favourite(&self, lat: f64, lon: f64) -> bool {
        self.items
            .iter()
            .any(|city| city.lat == lat && city.lon == lon)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.client.subscribe()
    }

    fn commit(&self) {
        write_value(self.store.as_ref(), FAVOURITES_KEY, &self.items);
        self.client.invalidate(&QueryKey::favourites());
    }
}
