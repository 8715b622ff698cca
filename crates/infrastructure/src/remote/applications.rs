use async_trait::async_trait;
use domain::{AppDescriptor, ApplicationCatalog, DomainError};

use super::rest::RestClient;

/// Read-only client of the application catalog.
pub struct HttpApplicationCatalog {
    rest: RestClient,
}

impl HttpApplicationCatalog {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl ApplicationCatalog for HttpApplicationCatalog {
    async fn list_app_descriptors(
        &self,
        organization_id: &str,
    ) -> Result<Vec<AppDescriptor>, DomainError> {
        self.rest
            .get(&["organizations", organization_id, "app-descriptors"])
            .await
    }
}
