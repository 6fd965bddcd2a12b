//! Shared helper utilities for kudoer integration tests.
//!
//! Each test opens its own store in a temporary directory through
//! [`TestStore::open`], with a clock the test controls and a session
//! invalidator that records calls.

#![allow(dead_code, reason = "each test crate uses a different subset")]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use kudoer::domain::{
    Emoji, Frame, Item, ItemDescription, ItemName, KudoBody, KudoDraft, NewItem, NewUser,
    PasswordHash, RequestContext, UpsertOutcome, Username,
};
use kudoer::test_support::{FixtureSessionInvalidator, MutableClock, TempStore};
use kudoer::{Kudoer, KudoerSettings};

/// Fixed instant the test clock starts at.
pub fn epoch() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).single() {
        Some(now) => now,
        None => panic!("valid fixture instant"),
    }
}

pub fn username(raw: &str) -> Username {
    Username::new(raw).expect("valid username")
}

/// An opened store plus the doubles injected into it.
pub struct TestStore {
    pub store: Kudoer,
    pub clock: Arc<MutableClock>,
    pub sessions: Arc<FixtureSessionInvalidator>,
    pub settings: KudoerSettings,
    temp: TempStore,
}

impl TestStore {
    /// Open a fresh store serving `page_size` feed entries per page.
    pub async fn open(page_size: u32) -> Self {
        let temp = TempStore::migrated().await;
        let settings = KudoerSettings {
            database_path: Some(temp.path().to_path_buf()),
            pool_max_size: 4,
            page_size: Some(page_size),
            index_batch_size: Some(2),
            ..KudoerSettings::default()
        };
        let clock = Arc::new(MutableClock::new(epoch()));
        let sessions = Arc::new(FixtureSessionInvalidator::default());
        let store = Kudoer::open_with(&settings, sessions.clone(), clock.clone())
            .await
            .expect("store opens");
        Self {
            store,
            clock,
            sessions,
            settings,
            temp,
        }
    }

    /// Open a second handle on the same database file.
    pub async fn reopen(&self) -> Kudoer {
        Kudoer::open_with(&self.settings, self.sessions.clone(), self.clock.clone())
            .await
            .expect("store reopens")
    }

    pub fn ctx(&self) -> RequestContext {
        RequestContext::new()
    }

    /// Register `raw` with the given display name.
    pub async fn register(&self, raw: &str, display_name: &str) -> Username {
        let name = username(raw);
        self.store
            .users
            .create_user(
                &self.ctx(),
                NewUser {
                    username: name.clone(),
                    display_name: Some(
                        kudoer::domain::DisplayName::new(display_name).expect("valid name"),
                    ),
                    email: None,
                    password_hash: PasswordHash::new(format!("$2a$12${raw}")).expect("hash"),
                },
            )
            .await
            .expect("user registered");
        name
    }

    pub async fn post_item(&self, creator: &Username, name: &str, description: &str) -> Item {
        self.store
            .items
            .create_item(
                &self.ctx(),
                NewItem {
                    creator_username: creator.clone(),
                    name: ItemName::new(name).expect("valid item name"),
                    description: ItemDescription::new(description).expect("valid description"),
                },
            )
            .await
            .expect("item created")
    }

    pub async fn give_kudo(
        &self,
        item: &Item,
        creator: &Username,
        emoji: i32,
        body: &str,
    ) -> UpsertOutcome {
        self.store
            .kudos
            .upsert_kudo(&self.ctx(), draft(item, creator, emoji, body))
            .await
            .expect("kudo stored")
    }
}

pub fn draft(item: &Item, creator: &Username, emoji: i32, body: &str) -> KudoDraft {
    KudoDraft {
        item_id: item.id,
        creator_username: creator.clone(),
        emoji: Emoji::new(emoji).expect("valid emoji"),
        frame: Frame::new(0).expect("valid frame"),
        body: KudoBody::new(body).expect("valid body"),
    }
}
