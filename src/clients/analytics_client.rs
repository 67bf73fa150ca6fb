use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::instrument;

use crate::analytics::{
    AnalyticsEngine, CategoryRevenue, HomeSummary, Prediction, TopProduct, TrendPoint,
};
use crate::domain::Identity;
use crate::error::LedgerError;
use crate::policy::{AccessGate, Operation};

/// Source of "now" for windowed reports.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Gated access to the analytics engine. The home summary needs
/// `view-analytics-basic`; every other report needs `view-analytics-advanced`.
#[derive(Clone)]
pub struct AnalyticsClient {
    engine: AnalyticsEngine,
    gate: AccessGate,
    clock: Clock,
}

impl AnalyticsClient {
    pub fn new(engine: AnalyticsEngine, gate: AccessGate) -> Self {
        Self {
            engine,
            gate,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Today's figures, today being the clock's UTC date.
    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn home_summary(&self, identity: &Identity) -> Result<HomeSummary, LedgerError> {
        self.home_summary_on(identity, self.now().date_naive()).await
    }

    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn home_summary_on(
        &self,
        identity: &Identity,
        as_of: NaiveDate,
    ) -> Result<HomeSummary, LedgerError> {
        self.gate.authorize(identity, Operation::ViewAnalyticsBasic)?;
        Ok(self.engine.home_summary(as_of).await)
    }

    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn sales_trend(
        &self,
        identity: &Identity,
        window_days: Option<u32>,
    ) -> Result<Vec<TrendPoint>, LedgerError> {
        self.gate.authorize(identity, Operation::ViewAnalyticsAdvanced)?;
        self.engine.sales_trend(window_days, self.now()).await
    }

    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn category_breakdown(
        &self,
        identity: &Identity,
    ) -> Result<Vec<CategoryRevenue>, LedgerError> {
        self.gate.authorize(identity, Operation::ViewAnalyticsAdvanced)?;
        Ok(self.engine.category_breakdown().await)
    }

    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn top_products(
        &self,
        identity: &Identity,
        limit: Option<usize>,
    ) -> Result<Vec<TopProduct>, LedgerError> {
        self.gate.authorize(identity, Operation::ViewAnalyticsAdvanced)?;
        Ok(self.engine.top_products(limit).await)
    }

    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn predictions(
        &self,
        identity: &Identity,
        window_days: Option<u32>,
    ) -> Result<Vec<Prediction>, LedgerError> {
        self.gate.authorize(identity, Operation::ViewAnalyticsAdvanced)?;
        self.engine.predictions(window_days, self.now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::AnalyticsConfig;
    use crate::domain::{Role, UserId};
    use crate::ledger::LedgerStore;
    use chrono::TimeZone;

    fn client() -> AnalyticsClient {
        let engine = AnalyticsEngine::new(LedgerStore::in_memory(), AnalyticsConfig::default());
        let fixed = Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap();
        AnalyticsClient::new(engine, AccessGate::default()).with_clock(Arc::new(move || fixed))
    }

    #[tokio::test]
    async fn staff_sees_the_summary_but_not_predictions() {
        let client = client();
        let staff = Identity::new(UserId(3), Role::Staff);

        let summary = client.home_summary(&staff).await.unwrap();
        assert_eq!(summary.date, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
        assert_eq!(summary.sales_count, 0);

        let err = client.predictions(&staff, None).await.unwrap_err();
        assert_eq!(err.code().as_str(), "forbidden");
    }

    #[tokio::test]
    async fn admin_has_no_analytics_by_default() {
        let client = client();
        let admin = Identity::new(UserId(1), Role::Admin);
        assert!(client.home_summary(&admin).await.is_err());
        assert!(client.top_products(&admin, None).await.is_err());
    }

    #[tokio::test]
    async fn zero_day_window_is_invalid() {
        let client = client();
        let manager = Identity::new(UserId(2), Role::Manager);
        let err = client.sales_trend(&manager, Some(0)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
