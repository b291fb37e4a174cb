use std::sync::Arc;

use crate::booking::{BookingService, TimeSlots};
use crate::config::AppConfig;
use crate::dashboard::DashboardService;
use crate::error::Result;
use crate::fallback::LocalStore;
use crate::metrics::MetricsCollector;
use crate::prescription::PrescriptionService;
use crate::records::RecordsService;
use crate::repository::DataClient;

/// Every workflow wired to one data client
pub struct HospitalService {
    client: Arc<dyn DataClient>,
    booking: BookingService,
    prescriptions: PrescriptionService,
    records: RecordsService,
    dashboard: DashboardService,
    metrics: MetricsCollector,
}

impl HospitalService {
    /// `demo_store` is the local store when the demo fallback is enabled
    pub fn new(
        client: Arc<dyn DataClient>, demo_store: Option<Arc<LocalStore>>, slots: TimeSlots, metrics: MetricsCollector,
    ) -> Self {
        Self {
            booking: BookingService::new(Arc::clone(&client), demo_store.clone(), slots, metrics.clone()),
            prescriptions: PrescriptionService::new(Arc::clone(&client), metrics.clone()),
            records: RecordsService::new(Arc::clone(&client), metrics.clone()),
            dashboard: DashboardService::new(Arc::clone(&client), demo_store),
            client,
            metrics,
        }
    }

    /// Build from configuration; the store is only handed out when the fallback is on
    pub fn from_config(
        config: &AppConfig, client: Arc<dyn DataClient>, store: Arc<LocalStore>, metrics: MetricsCollector,
    ) -> Result<Self> {
        let slots = TimeSlots::from_config(&config.booking)?;
        let demo_store = config.storage.demo_fallback.then_some(store);
        Ok(Self::new(client, demo_store, slots, metrics))
    }

    pub fn client(&self) -> &dyn DataClient {
        self.client.as_ref()
    }

    pub const fn booking(&self) -> &BookingService {
        &self.booking
    }

    pub const fn prescriptions(&self) -> &PrescriptionService {
        &self.prescriptions
    }

    pub const fn records(&self) -> &RecordsService {
        &self.records
    }

    pub const fn dashboard(&self) -> &DashboardService {
        &self.dashboard
    }

    pub const fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }
}
