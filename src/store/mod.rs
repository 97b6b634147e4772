//! Normalized in-memory entity stores
//!
//! One keyed collection per entity type, each a cache over server-owned
//! truth. Records are only ever replaced whole; the three merge operations
//! (`replace_all`, `upsert`, `remove`) are idempotent per id, which is what
//! makes concurrent poll- and push-driven deliveries safe without locking:
//! the last snapshot to arrive wins, regardless of which was logically
//! newer.

use dashmap::DashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::debug;

use crate::types::{Holding, Order, Portfolio, Stock, User, Watchlist};

const CHANGE_BUFFER: usize = 256;

/// A record that lives in an [`EntityStore`], keyed by its server id.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> i64;
}

impl Entity for Portfolio {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for Holding {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for Order {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for Stock {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for Watchlist {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Change notification emitted to store observers. The presentation layer
/// subscribes to these; the store never calls into it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    /// The whole collection was rebuilt from a fresh snapshot
    Replaced,
    Upserted(i64),
    Removed(i64),
}

/// Latest-known snapshot of one entity collection, keyed by id.
pub struct EntityStore<T: Entity> {
    entries: DashMap<i64, T>,
    changes: broadcast::Sender<StoreChange>,
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            entries: DashMap::new(),
            changes,
        }
    }

    /// Discard the current mapping and rebuild it from `records`. Entries
    /// absent from the input are evicted.
    pub fn replace_all(&self, records: impl IntoIterator<Item = T>) {
        self.entries.clear();
        for record in records {
            self.entries.insert(record.id(), record);
        }
        let _ = self.changes.send(StoreChange::Replaced);
    }

    /// Insert or overwrite the entry at `record.id()`. Unrelated entries
    /// are untouched; last write wins.
    pub fn upsert(&self, record: T) {
        let id = record.id();
        self.entries.insert(id, record);
        let _ = self.changes.send(StoreChange::Upserted(id));
    }

    /// Delete the entry if present. Idempotent: removing a missing id is a
    /// no-op, not an error.
    pub fn remove(&self, id: i64) {
        if self.entries.remove(&id).is_some() {
            let _ = self.changes.send(StoreChange::Removed(id));
        }
    }

    pub fn get(&self, id: i64) -> Option<T> {
        self.entries.get(&id).map(|entry| entry.value().clone())
    }

    pub fn all(&self) -> Vec<T> {
        self.entries.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Observer interface for dependent views.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

impl<T: Entity> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the current user, or none when anonymous. Exactly one per session.
pub struct SessionStore {
    user: RwLock<Option<User>>,
    changes: broadcast::Sender<StoreChange>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            user: RwLock::new(None),
            changes,
        }
    }

    pub fn set(&self, user: User) {
        let id = user.id;
        if let Ok(mut slot) = self.user.write() {
            *slot = Some(user);
        }
        let _ = self.changes.send(StoreChange::Upserted(id));
    }

    pub fn clear(&self) {
        let removed = self
            .user
            .write()
            .ok()
            .and_then(|mut slot| slot.take().map(|u| u.id));
        if let Some(id) = removed {
            let _ = self.changes.send(StoreChange::Removed(id));
        }
    }

    pub fn current(&self) -> Option<User> {
        self.user.read().ok().and_then(|slot| slot.clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// One latest-known-state snapshot, as delivered by either transport.
///
/// REST thunks and push events both reduce to these values, so the merge
/// rules live in exactly one place: [`Stores::apply`].
#[derive(Debug, Clone)]
pub enum Snapshot {
    Portfolios(Vec<Portfolio>),
    Portfolio(Portfolio),
    PortfolioRemoved(i64),
    Holdings(Vec<Holding>),
    Holding(Holding),
    HoldingRemoved(i64),
    Orders(Vec<Order>),
    Order(Order),
    Stocks(Vec<Stock>),
    /// Partial stock collection (e.g. recently viewed): merged record by
    /// record so it cannot evict stocks loaded by other views.
    StocksMerged(Vec<Stock>),
    Stock(Stock),
    Watchlists(Vec<Watchlist>),
    Watchlist(Watchlist),
    WatchlistRemoved(i64),
    CurrentUser(User),
    SessionCleared,
}

/// The injected state container: every entity store for one client
/// session. Views receive a shared reference and declare which slices they
/// read; nothing here is ambient or global.
pub struct Stores {
    pub portfolios: EntityStore<Portfolio>,
    pub holdings: EntityStore<Holding>,
    pub orders: EntityStore<Order>,
    pub stocks: EntityStore<Stock>,
    pub watchlists: EntityStore<Watchlist>,
    pub session: SessionStore,
}

impl Stores {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            portfolios: EntityStore::new(),
            holdings: EntityStore::new(),
            orders: EntityStore::new(),
            stocks: EntityStore::new(),
            watchlists: EntityStore::new(),
            session: SessionStore::new(),
        })
    }

    /// Single ingestion point for both synchronization paths.
    pub fn apply(&self, snapshot: Snapshot) {
        match snapshot {
            Snapshot::Portfolios(records) => {
                debug!(count = records.len(), "replacing portfolio collection");
                self.portfolios.replace_all(records);
            }
            Snapshot::Portfolio(record) => self.portfolios.upsert(record),
            Snapshot::PortfolioRemoved(id) => self.portfolios.remove(id),
            Snapshot::Holdings(records) => {
                debug!(count = records.len(), "replacing holding collection");
                self.holdings.replace_all(records);
            }
            Snapshot::Holding(record) => self.holdings.upsert(record),
            Snapshot::HoldingRemoved(id) => self.holdings.remove(id),
            Snapshot::Orders(records) => {
                debug!(count = records.len(), "replacing order collection");
                self.orders.replace_all(records);
            }
            Snapshot::Order(record) => self.orders.upsert(record),
            Snapshot::Stocks(records) => {
                debug!(count = records.len(), "replacing stock collection");
                self.stocks.replace_all(records);
            }
            Snapshot::StocksMerged(records) => {
                for record in records {
                    self.stocks.upsert(record);
                }
            }
            Snapshot::Stock(record) => self.stocks.upsert(record),
            Snapshot::Watchlists(records) => {
                debug!(count = records.len(), "replacing watchlist collection");
                self.watchlists.replace_all(records);
            }
            Snapshot::Watchlist(record) => self.watchlists.upsert(record),
            Snapshot::WatchlistRemoved(id) => self.watchlists.remove(id),
            Snapshot::CurrentUser(user) => self.session.set(user),
            Snapshot::SessionCleared => self.session.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn stock(id: i64, ticker: &str, price: rust_decimal::Decimal) -> Stock {
        Stock {
            id,
            ticker_symbol: ticker.to_string(),
            company_name: format!("{ticker} Inc."),
            sector: None,
            market_price: price,
            last_updated: None,
        }
    }

    #[test]
    fn upsert_keeps_only_the_last_record_per_id() {
        let store = EntityStore::new();
        store.upsert(stock(1, "AAPL", dec!(100)));
        store.upsert(stock(2, "MSFT", dec!(200)));
        store.upsert(stock(1, "AAPL", dec!(105)));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().market_price, dec!(105));
        assert_eq!(store.get(2).unwrap().market_price, dec!(200));
    }

    #[test]
    fn replace_all_evicts_absent_entries() {
        let store = EntityStore::new();
        store.upsert(stock(1, "AAPL", dec!(100)));
        store.upsert(stock(2, "MSFT", dec!(200)));

        store.replace_all(vec![stock(2, "MSFT", dec!(210)), stock(3, "GOOGL", dec!(150))]);

        assert!(store.get(1).is_none());
        assert_eq!(store.get(2).unwrap().market_price, dec!(210));
        assert!(store.get(3).is_some());
    }

    #[test]
    fn replace_all_then_upsert_yields_union() {
        let store = EntityStore::new();
        store.replace_all(vec![stock(1, "AAPL", dec!(100)), stock(2, "MSFT", dec!(200))]);
        store.upsert(stock(9, "NVDA", dec!(500)));

        assert_eq!(store.len(), 3);
        assert!(store.get(1).is_some());
        assert!(store.get(9).is_some());
    }

    #[test]
    fn remove_is_idempotent() {
        let store = EntityStore::new();
        store.upsert(stock(1, "AAPL", dec!(100)));

        store.remove(1);
        store.remove(1);
        store.remove(42);

        assert!(store.is_empty());
    }

    #[test]
    fn last_write_wins_regardless_of_transport() {
        let stores = Stores::new();

        // poll result first, push second
        stores.apply(Snapshot::Stock(stock(7, "TSLA", dec!(100))));
        stores.apply(Snapshot::Stock(stock(7, "TSLA", dec!(101))));
        assert_eq!(stores.stocks.get(7).unwrap().market_price, dec!(101));

        // reverse arrival order: the stale value sticks, by design
        stores.apply(Snapshot::Stock(stock(7, "TSLA", dec!(101))));
        stores.apply(Snapshot::Stock(stock(7, "TSLA", dec!(100))));
        assert_eq!(stores.stocks.get(7).unwrap().market_price, dec!(100));
    }

    #[test]
    fn merged_stock_snapshot_does_not_evict() {
        let stores = Stores::new();
        stores.apply(Snapshot::Stocks(vec![stock(1, "AAPL", dec!(100))]));
        stores.apply(Snapshot::StocksMerged(vec![stock(2, "MSFT", dec!(200))]));

        assert_eq!(stores.stocks.len(), 2);
    }

    #[test]
    fn session_holds_at_most_one_user() {
        let stores = Stores::new();
        assert!(stores.session.current().is_none());

        stores.apply(Snapshot::CurrentUser(User {
            id: 1,
            username: "demo".into(),
            email: None,
            cash_balance: dec!(1000),
        }));
        assert_eq!(stores.session.current().unwrap().id, 1);

        stores.apply(Snapshot::SessionCleared);
        assert!(stores.session.current().is_none());
    }

    #[test]
    fn store_changes_reach_subscribers() {
        let store = EntityStore::new();
        let mut changes = store.subscribe();

        store.upsert(stock(1, "AAPL", dec!(100)));
        store.remove(1);

        assert_eq!(changes.try_recv().unwrap(), StoreChange::Upserted(1));
        assert_eq!(changes.try_recv().unwrap(), StoreChange::Removed(1));
    }
}
