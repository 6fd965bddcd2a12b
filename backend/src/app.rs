//! Store startup and service wiring.
//!
//! [`Kudoer::open`] brings a store to a usable state: migrations applied,
//! pool built, search indexes populated. It then hands the request-handling
//! layer one instance of every service, all sharing the pool.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::ports::{PersistenceError, SessionInvalidator};
use crate::domain::{
    FeedService, ItemService, KudoService, PasswordResetService, SearchService, StatsService,
    UserService,
};
use crate::outbound::persistence::{
    DbPool, DieselFeedQuery, DieselFollowRepository, DieselItemRepository, DieselKudoRepository,
    DieselResetTokenRepository, DieselSearchRepository, DieselStatsQuery, DieselUserRepository,
    MigrationError, PoolError, SearchIndexKind, SearchIndexMaintenance, run_migrations,
};
use crate::settings::KudoerSettings;

/// Account and follow operations backed by SQLite.
pub type StoreUserService = UserService<DieselUserRepository, DieselFollowRepository>;
/// Item operations backed by SQLite.
pub type StoreItemService = ItemService<DieselItemRepository>;
/// Full-text search backed by SQLite FTS5.
pub type StoreSearchService = SearchService<DieselSearchRepository>;
/// Kudo operations backed by SQLite.
pub type StoreKudoService = KudoService<DieselKudoRepository, DieselFeedQuery>;
/// Home feeds backed by SQLite.
pub type StoreFeedService = FeedService<DieselFeedQuery>;
/// Reset token lifecycle backed by SQLite and an injected session store.
pub type StorePasswordResetService =
    PasswordResetService<DieselResetTokenRepository, dyn SessionInvalidator>;
/// Store counters backed by SQLite.
pub type StoreStatsService = StatsService<DieselStatsQuery>;

/// Errors that stop the store from opening.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Schema migrations failed.
    #[error(transparent)]
    Migrations(#[from] MigrationError),
    /// The connection pool could not be built.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// A search index could not be built.
    #[error("failed to build {index}: {source}")]
    SearchIndex {
        index: SearchIndexKind,
        #[source]
        source: PersistenceError,
    },
}

/// An opened store and every service over it.
#[derive(Clone)]
pub struct Kudoer {
    pool: DbPool,
    indexes: SearchIndexMaintenance,
    pub users: StoreUserService,
    pub items: StoreItemService,
    pub search: StoreSearchService,
    pub kudos: StoreKudoService,
    pub feeds: StoreFeedService,
    pub password_resets: StorePasswordResetService,
    pub stats: StoreStatsService,
}

impl Kudoer {
    /// Open the store with the system clock. Password resets end sessions
    /// through `sessions`.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] when migrations, pool construction, or the
    /// initial search index build fail.
    pub async fn open(
        settings: &KudoerSettings,
        sessions: Arc<dyn SessionInvalidator>,
    ) -> Result<Self, StartupError> {
        Self::open_with(settings, sessions, Arc::new(DefaultClock)).await
    }

    /// Open the store with the given session invalidator and clock.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] when migrations, pool construction, or the
    /// initial search index build fail.
    pub async fn open_with(
        settings: &KudoerSettings,
        sessions: Arc<dyn SessionInvalidator>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StartupError> {
        let applied = run_migrations(settings.database_path()).await?;
        info!(
            path = %settings.database_path().display(),
            applied = applied.len(),
            "store migrated"
        );

        let pool = DbPool::new(settings.pool_config()).await?;
        let indexes = SearchIndexMaintenance::new(pool.clone(), settings.index_batch_size());
        for kind in SearchIndexKind::ALL {
            indexes
                .ensure_built(kind)
                .await
                .map_err(|source| StartupError::SearchIndex { index: kind, source })?;
        }

        let feeds = Arc::new(DieselFeedQuery::new(pool.clone()));
        let page_size = settings.page_size();
        Ok(Self {
            users: UserService::new(
                Arc::new(DieselUserRepository::new(pool.clone())),
                Arc::new(DieselFollowRepository::new(pool.clone())),
            ),
            items: ItemService::new(Arc::new(DieselItemRepository::new(pool.clone()))),
            search: SearchService::new(
                Arc::new(DieselSearchRepository::new(pool.clone())),
                settings.search_limit(),
            ),
            kudos: KudoService::new(
                Arc::new(DieselKudoRepository::new(pool.clone())),
                Arc::clone(&feeds),
                page_size,
            ),
            feeds: FeedService::new(feeds, page_size),
            password_resets: PasswordResetService::new(
                Arc::new(DieselResetTokenRepository::new(pool.clone())),
                sessions,
                clock,
                settings.reset_token_ttl(),
            ),
            stats: StatsService::new(Arc::new(DieselStatsQuery::new(pool.clone()))),
            indexes,
            pool,
        })
    }

    /// Shared connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Search index maintenance over the shared pool.
    pub fn search_indexes(&self) -> &SearchIndexMaintenance {
        &self.indexes
    }

    /// Start the expired token reaper at the configured period.
    pub fn spawn_token_reaper(
        &self,
        settings: &KudoerSettings,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        self.password_resets
            .spawn_token_reaper(settings.token_reap_interval(), shutdown)
    }
}
