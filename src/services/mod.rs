//! Services module
//!
//! This module contains the collaborators the conversation talks to

pub mod tracking;

pub use tracking::{HttpTracker, MemoryTracker, NoopTracker, SessionTracker, TrackingEvent};

use std::sync::Arc;
use tracing::info;
use crate::config::TrackingConfig;
use crate::utils::errors::Result;

/// Tracker selected by configuration, plus the HTTP handle when one is running
#[derive(Debug, Clone)]
pub struct TrackerService {
    pub tracker: Arc<dyn SessionTracker>,
    pub http: Option<HttpTracker>,
}

impl TrackerService {
    /// Build the tracker for the current configuration
    ///
    /// Starts the HTTP delivery worker when tracking is enabled, otherwise
    /// hands out a no-op tracker.
    pub fn from_config(config: &TrackingConfig) -> Result<Self> {
        if config.enabled {
            let http = HttpTracker::spawn(config)?;
            info!(api_url = %config.api_url, "Session tracking enabled");
            Ok(Self {
                tracker: Arc::new(http.clone()),
                http: Some(http),
            })
        } else {
            info!("Session tracking disabled");
            Ok(Self {
                tracker: Arc::new(NoopTracker),
                http: None,
            })
        }
    }

    /// Flush pending HTTP deliveries, giving up after `timeout`
    pub async fn flush(&self, timeout: std::time::Duration) -> bool {
        match &self.http {
            Some(http) => matches!(tokio::time::timeout(timeout, http.flush()).await, Ok(Ok(()))),
            None => true,
        }
    }
}
