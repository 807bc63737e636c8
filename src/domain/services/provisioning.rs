use std::collections::HashMap;
use std::sync::Arc;
use crate::domain::models::live_session::Platform;
use crate::domain::ports::MeetingProvisioner;
use crate::error::AppError;

/// Platform → provisioning strategy.
#[derive(Clone, Default)]
pub struct ProvisionerRegistry {
    providers: HashMap<Platform, Arc<dyn MeetingProvisioner>>,
}

impl ProvisionerRegistry {
    pub fn register(&mut self, platform: Platform, provisioner: Arc<dyn MeetingProvisioner>) {
        self.providers.insert(platform, provisioner);
    }

    pub fn get(&self, platform: Platform) -> Result<Arc<dyn MeetingProvisioner>, AppError> {
        self.providers.get(&platform).cloned()
            .ok_or_else(|| AppError::Provisioning(format!("No provisioner registered for {}", platform.as_str())))
    }
}
