//! Availability and consent gate in front of the provider.

use crate::core::catalog::all_read_scopes;
use crate::provider::{HealthProvider, Platform};
use std::sync::Arc;
use tracing::{info, warn};

/// Answers "can we read health data here" and asks the user for consent.
///
/// Outcomes are plain booleans. Provider errors never escape.
pub struct HealthGateway<P: HealthProvider> {
    provider: Arc<P>,
    platform: Platform,
}

impl<P: HealthProvider> HealthGateway<P> {
    /// Create a gateway for a provider running on `platform`.
    pub fn new(provider: Arc<P>, platform: Platform) -> Self {
        Self { provider, platform }
    }

    /// The platform this gateway was created for.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Whether health data can be read on this device at all.
    ///
    /// Side-effect free and safe to call before any consent exists.
    pub fn check_availability(&self) -> bool {
        self.platform.supports_health_data() && self.provider.is_available()
    }

    /// Show the consent prompt for the five vital types plus workouts.
    ///
    /// A declined prompt resolves to `false`, as does a prompt that fails.
    pub async fn request_permissions(&self) -> bool {
        let scopes = all_read_scopes();
        match self.provider.request_authorization(&scopes).await {
            Ok(granted) => {
                info!(granted, scopes = scopes.len(), "Health data consent resolved");
                granted
            }
            Err(e) => {
                warn!("Consent prompt failed: {e}");
                false
            }
        }
    }
}
