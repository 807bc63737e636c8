pub mod bbb;
pub mod jitsi;
pub mod local;

use std::sync::Arc;
use crate::config::Config;
use crate::domain::models::live_session::Platform;
use crate::domain::services::provisioning::ProvisionerRegistry;
use bbb::BigBlueButtonProvisioner;
use jitsi::JitsiProvisioner;
use local::LocalProvisioner;

pub fn build_registry(config: &Config) -> ProvisionerRegistry {
    let mut registry = ProvisionerRegistry::default();
    for platform in [Platform::Zoom, Platform::GoogleMeet, Platform::Teams, Platform::Custom] {
        registry.register(platform, Arc::new(LocalProvisioner::new(platform, config.custom_meeting_base_url.clone())));
    }
    registry.register(Platform::Jitsi, Arc::new(JitsiProvisioner::new(config.jitsi_base_url.clone())));
    registry.register(Platform::BigBlueButton, Arc::new(BigBlueButtonProvisioner::new(
        config.bbb_base_url.clone(),
        config.bbb_shared_secret.clone(),
    )));
    registry
}

/// Random alphanumeric meeting password.
pub(crate) fn generate_password(len: usize) -> String {
    use rand::{distributions::Alphanumeric, Rng};
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
