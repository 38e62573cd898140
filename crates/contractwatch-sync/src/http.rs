//! HTTP client for the contract analysis API.

use async_trait::async_trait;
use contractwatch_core::Contract;
use tracing::{debug, info};

use crate::{ContractSource, SyncError};

/// Client for the analysis API's contract endpoints.
pub struct ContractClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ContractClient {
    /// Create a client for the given API base URL.
    ///
    /// `base_url` should be like `http://localhost:8000`; a trailing slash is trimmed.
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn contracts_url(&self) -> String {
        format!("{}/api/contracts", self.base_url)
    }

    fn contract_url(&self, id: i64) -> String {
        format!("{}/api/contracts/{id}", self.base_url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Fetch every contract visible to the caller, newest first.
    pub async fn list_contracts(&self) -> Result<Vec<Contract>, SyncError> {
        let url = self.contracts_url();
        debug!(url = %url, "listing contracts");
        let resp = self.authorize(self.client.get(&url)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let contracts: Vec<Contract> = serde_json::from_str(&body)?;
        debug!(count = contracts.len(), "listed contracts");
        Ok(contracts)
    }

    /// Delete a contract and its analysis.
    pub async fn delete_contract(&self, id: i64) -> Result<(), SyncError> {
        let url = self.contract_url(id);
        info!(url = %url, id, "deleting contract");
        let resp = self.authorize(self.client.delete(&url)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContractSource for ContractClient {
    async fn list_contracts(&self) -> Result<Vec<Contract>, SyncError> {
        ContractClient::list_contracts(self).await
    }
}
