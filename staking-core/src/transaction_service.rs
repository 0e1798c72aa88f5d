use crate::dto::{ExternalStatus, TransactionRequest};
use crate::error::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Signs, broadcasts and reports on transactions. Key material never reaches
/// this crate.
#[async_trait]
pub trait TransactionService: Send + Sync {
    async fn send_transaction(
        &self,
        request: &TransactionRequest,
        network_id: &str,
    ) -> Result<String, ServiceError>;

    async fn get_transaction_status(
        &self,
        network_id: &str,
        tx_hash: &str,
    ) -> Result<ExternalStatus, ServiceError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendTransactionBody<'a> {
    network_id: &'a str,
    request: &'a TransactionRequest,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendTransactionResponse {
    tx_hash: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: ExternalStatus,
}

/// Transaction service reached over HTTP.
pub struct HttpTransactionService {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpTransactionService {
    pub fn new(client: reqwest::Client, base_url: &str, auth_token: Option<String>) -> Self {
        HttpTransactionService {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            auth_token,
        }
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header("User-Agent", "Staking Core");
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(ServiceError::BadStatus { status, body })
    }
}

#[async_trait]
impl TransactionService for HttpTransactionService {
    async fn send_transaction(
        &self,
        request: &TransactionRequest,
        network_id: &str,
    ) -> Result<String, ServiceError> {
        let url = self.base_url.to_owned() + "/transactions";
        info!("send_transaction url: {:?}", url);
        let response = self
            .authorize(self.client.post(url))
            .json(&SendTransactionBody {
                network_id,
                request,
            })
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let parsed = response.json::<SendTransactionResponse>().await?;
        match (parsed.tx_hash, parsed.error) {
            (Some(tx_hash), _) if !tx_hash.is_empty() => Ok(tx_hash),
            (_, Some(error)) => {
                warn!("Transaction service rejected request: {}", error);
                Err(ServiceError::Rejected(error))
            }
            _ => Err(ServiceError::Other("no transaction hash returned".to_owned())),
        }
    }

    async fn get_transaction_status(
        &self,
        network_id: &str,
        tx_hash: &str,
    ) -> Result<ExternalStatus, ServiceError> {
        let url = format!(
            "{}/transactions/{}/{}/status",
            self.base_url, network_id, tx_hash
        );
        let response = self.authorize(self.client.get(url)).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json::<StatusResponse>().await?.status)
    }
}
