//! Application root: owns the store, the catalog and the navigation
//! controller, and is the only thing the C ABI talks to.

use log::{info, warn};

use crate::app_config::AppConfig;
use crate::app_response::AppResponse;
use crate::local_db_state::AppDbState;
use crate::local_store::{PersistentStore, StoreBackend};
use crate::navigation::{NavEvent, NavOutcome, NavigationController, Screen, SessionView};
use crate::product_catalog::ProductCatalog;
use crate::product_model::{Product, Subscription, UserStats};

pub struct AppSession {
    store: PersistentStore,
    catalog: ProductCatalog,
    navigation: NavigationController,
}

impl AppSession {
    /// Opens the LMDB-backed store named by `config` and starts on splash.
    pub fn open(config: &AppConfig) -> Result<Self, AppResponse> {
        config.validate()?;
        let catalog = config.build_catalog()?;
        let db = AppDbState::init(&config.db_name, config.map_size_bytes())?;
        Ok(Self::with_backend(Box::new(db), catalog, config))
    }

    pub fn with_backend(
        backend: Box<dyn StoreBackend>,
        catalog: ProductCatalog,
        config: &AppConfig,
    ) -> Self {
        let store = PersistentStore::with_fallback_language(backend, &config.fallback_language);
        let navigation = NavigationController::start(&store, &config.simulated_scan_code);
        Self {
            store,
            catalog,
            navigation,
        }
    }

    pub fn store(&self) -> &PersistentStore {
        &self.store
    }

    pub fn view(&self) -> SessionView {
        self.navigation.view()
    }

    /// Forwards an intent to the controller. Opening a product records it in
    /// the scan history.
    pub fn dispatch(&mut self, event: NavEvent) -> NavOutcome {
        let outcome = self.navigation.handle(event, &self.store, &self.catalog);

        if let NavOutcome::Moved {
            screen: Screen::ProductDetail,
        } = outcome
        {
            if let Some(product) = self.navigation.selected_product() {
                self.store.history().add(&product.id);
            }
        }

        outcome
    }

    pub fn is_favorite(&self, product_id: &str) -> bool {
        self.store.favorites().contains(product_id)
    }

    pub fn toggle_favorite(&self, product_id: &str) -> bool {
        self.store.favorites().toggle(product_id)
    }

    /// Toggles the product on screen. `None` when nothing is selected.
    pub fn toggle_selected_favorite(&self) -> Option<bool> {
        let product = self.navigation.selected_product()?;
        Some(self.store.favorites().toggle(&product.id))
    }

    pub fn remove_favorite(&self, product_id: &str) {
        self.store.favorites().remove(product_id);
    }

    pub fn favorite_products(&self) -> Vec<Product> {
        let ids = self.store.favorites().get();
        self.catalog.resolve(&ids).into_iter().cloned().collect()
    }

    /// Most recently scanned first.
    pub fn history_products(&self) -> Vec<Product> {
        let ids = self.store.history().get();
        self.catalog.resolve(&ids).into_iter().cloned().collect()
    }

    pub fn clear_history(&self) {
        self.store.history().clear();
        info!("Scan history cleared");
    }

    /// Live search as the user types. Leaves recent searches alone.
    pub fn search(&self, query: &str) -> Vec<Product> {
        self.catalog.search(query.trim()).into_iter().cloned().collect()
    }

    /// Explicit submit (enter key or a tapped recent entry): searches and
    /// remembers the query when it is not blank.
    pub fn submit_search(&self, query: &str) -> Vec<Product> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        self.store.searches().add(trimmed);
        self.search(trimmed)
    }

    pub fn recent_searches(&self) -> Vec<String> {
        self.store.searches().get()
    }

    pub fn remove_recent_search(&self, query: &str) {
        self.store.searches().remove(query);
    }

    pub fn recommendations(&self, category: Option<&str>) -> Vec<Product> {
        self.catalog
            .recommendations(category)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn subscription(&self) -> Subscription {
        self.store.subscription().get()
    }

    pub fn set_subscription(&self, subscription: &Subscription) {
        self.store.subscription().set(subscription);
    }

    pub fn stats(&self) -> UserStats {
        self.store.stats().get()
    }

    /// Stores dashboard counters. The favorites count always reflects the
    /// current favorite set, whatever the caller computed.
    pub fn update_stats(&self, stats: UserStats) -> UserStats {
        let favorites = self.store.favorites().get().len();
        let stats = UserStats {
            favorite_products: u32::try_from(favorites).unwrap_or(u32::MAX),
            ..stats
        };
        self.store.stats().update(&stats);
        stats
    }

    pub fn close(&self) -> Result<(), AppResponse> {
        if self.store.is_degraded() {
            warn!("Closing a degraded session; some changes were kept in memory only");
        }
        self.store.flush()
    }
}
