//! Decides whether an event from a given contract reaches the projector.

use crate::datasource::InstanceRegistry;
use crate::domain::{Address, EventFamily, LogEvent};
use crate::store::StoreError;
use std::sync::Arc;

/// Routes comptroller and gauge-controller events by configured address, and per-market
/// events only from markets activated by a listing.
#[derive(Debug, Clone)]
pub struct EventRouter {
    registry: Arc<dyn InstanceRegistry>,
    comptroller: Option<Address>,
    gauge_controller: Option<Address>,
}

impl EventRouter {
    /// `None` for a controller address accepts that family from any emitter.
    pub fn new(
        registry: Arc<dyn InstanceRegistry>,
        comptroller: Option<Address>,
        gauge_controller: Option<Address>,
    ) -> Self {
        Self {
            registry,
            comptroller,
            gauge_controller,
        }
    }

    pub async fn accepts(&self, event: &LogEvent) -> Result<bool, StoreError> {
        match event.event.family() {
            EventFamily::Comptroller => Ok(matches_filter(&self.comptroller, &event.address)),
            EventFamily::GaugeController => {
                Ok(matches_filter(&self.gauge_controller, &event.address))
            }
            EventFamily::Market => self.registry.is_tracked(&event.address).await,
        }
    }
}

fn matches_filter(filter: &Option<Address>, emitter: &Address) -> bool {
    filter.as_ref().map_or(true, |expected| expected == emitter)
}
