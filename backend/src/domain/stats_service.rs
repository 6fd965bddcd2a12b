//! Store-wide counters for the admin dashboard.

use std::sync::Arc;

use super::ports::StatsQuery;
use super::service_support::persistence_failure;
use super::{Error, RequestContext, StoreStats};

/// Stats service exposing row counts.
#[derive(Clone)]
pub struct StatsService<Q> {
    stats: Arc<Q>,
}

impl<Q> StatsService<Q> {
    /// Create a new service.
    pub fn new(stats: Arc<Q>) -> Self {
        Self { stats }
    }
}

impl<Q> StatsService<Q>
where
    Q: StatsQuery,
{
    /// Current counts of users, items, and kudos.
    pub async fn stats(&self, ctx: &RequestContext) -> Result<StoreStats, Error> {
        ctx.run(async {
            self.stats
                .stats()
                .await
                .map_err(|error| persistence_failure("stats", error))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockStatsQuery;

    #[tokio::test]
    async fn stats_are_passed_through() {
        let mut query = MockStatsQuery::new();
        query.expect_stats().times(1).return_once(|| {
            Ok(StoreStats {
                users: 2,
                items: 1,
                kudos: 1,
            })
        });

        let stats = StatsService::new(Arc::new(query))
            .stats(&RequestContext::new())
            .await
            .expect("stats load");

        assert_eq!(stats.users, 2);
        assert_eq!(stats.kudos, 1);
    }
}
