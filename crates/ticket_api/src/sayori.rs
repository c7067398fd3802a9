//! Sayori assignment client.

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::models::{SayoriTicket, SayoriTicketPage};
use tracing::info;

pub const DEFAULT_PROJECT: &str = "APIGEE";

#[derive(Clone)]
pub struct SayoriClient {
    api: ApiClient,
    project: String,
}

impl SayoriClient {
    /// Builds an unauthenticated client listing tickets of `project`.
    pub fn new(config: ClientConfig, project: impl Into<String>) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(config)?,
            project: project.into(),
        })
    }

    /// Lists every ticket currently assigned within the configured project.
    pub async fn list_tickets(&self) -> Result<Vec<SayoriTicket>> {
        let path = format!("api/v1/tickets/{}", self.project);
        info!(project = %self.project, "fetching tickets from Sayori");
        let page: SayoriTicketPage = self.api.get_json(&path, &[]).await?;
        info!(count = page.data.len(), "Sayori tickets received");
        Ok(page.data)
    }
}
