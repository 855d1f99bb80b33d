use anyhow::{Context, Result};
use log::{debug, info, warn};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::config::Config;
use crate::errors::{CommandError, CommandResult};
use crate::models::{PortfolioSnapshot, PriceResponse, StartPayload};

pub const START_PATH: &str = "/api/start";
pub const STOP_PATH: &str = "/api/stop";
pub const CLAIM_FEES_PATH: &str = "/api/pool/claim-fees";
pub const INCREASE_LIQUIDITY_PATH: &str = "/api/pool/increase-liquidity";
pub const WITHDRAW_PATH: &str = "/api/pool/withdraw";
pub const ROTATE_KEY_PATH: &str = "/api/wallet/key";
pub const PRICE_PATH: &str = "/api/price";
pub const PORTFOLIO_PATH: &str = "/api/portfolio";

/// Length of a raw Solana keypair (secret + public half)
const KEYPAIR_LEN: usize = 64;
const PUBKEY_LEN: usize = 32;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RotateKeyRequest<'a> {
    new_key: &'a str,
    admin_credential: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RotateKeyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    public_key: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the agent's HTTP command API
#[derive(Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    base_url: String,
    auth_header: String,
    secret: Option<String>,
}

impl AgentClient {
    /// Create a new agent client
    pub fn new(base_url: &str, auth_header: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: auth_header.to_string(),
            secret: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_url, &config.auth_header, config.request_timeout())
    }

    pub fn with_secret(mut self, secret: Option<String>) -> Self {
        self.set_secret(secret);
        self
    }

    /// Shared secret sent with every mutating request
    pub fn set_secret(&mut self, secret: Option<String>) {
        self.secret = secret.filter(|s| !s.trim().is_empty());
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start scanning with frozen criteria
    pub async fn start(&self, payload: &StartPayload) -> CommandResult<()> {
        self.post_command(START_PATH, payload).await?;
        Ok(())
    }

    pub async fn stop(&self) -> CommandResult<()> {
        self.post_command(STOP_PATH, &json!({})).await?;
        Ok(())
    }

    /// Claim fees from a pool
    pub async fn claim_fees(&self, pool_id: &str) -> CommandResult<()> {
        let pool_id = require_pool_id(pool_id)?;
        self.post_command(CLAIM_FEES_PATH, &json!({ "poolId": pool_id })).await?;
        info!("Fee claim requested for pool {}", pool_id);
        Ok(())
    }

    /// Add liquidity to a pool, in the pool's base-token native units
    pub async fn increase_liquidity(&self, pool_id: &str, amount_native: f64) -> CommandResult<()> {
        let pool_id = require_pool_id(pool_id)?;
        if !amount_native.is_finite() || amount_native <= 0.0 {
            return Err(CommandError::InvalidInput(format!(
                "amount must be positive, got {}",
                amount_native
            )));
        }

        let body = json!({ "poolId": pool_id, "amountNative": amount_native });
        self.post_command(INCREASE_LIQUIDITY_PATH, &body).await?;
        info!("Liquidity increase of {} requested for pool {}", amount_native, pool_id);
        Ok(())
    }

    /// Remove a percentage of liquidity from a pool
    pub async fn withdraw_liquidity(&self, pool_id: &str, percent: f64) -> CommandResult<()> {
        let pool_id = require_pool_id(pool_id)?;
        if !percent.is_finite() || percent <= 0.0 || percent > 100.0 {
            return Err(CommandError::InvalidInput(format!(
                "withdraw percent must be in (0, 100], got {}",
                percent
            )));
        }

        let body = json!({ "poolId": pool_id, "percent": percent });
        self.post_command(WITHDRAW_PATH, &body).await?;
        info!("Withdrawal of {}% requested for pool {}", percent, pool_id);
        Ok(())
    }

    /// Ask the agent to switch to a new wallet key. Returns the new public key.
    ///
    /// The admin credential is only ever checked by the agent.
    pub async fn rotate_wallet_key(&self, new_key: &str, admin_credential: &str) -> CommandResult<String> {
        let new_key = new_key.trim();
        let decoded_len = bs58::decode(new_key).into_vec().map(|b| b.len()).unwrap_or(0);
        if decoded_len != KEYPAIR_LEN {
            return Err(CommandError::InvalidInput(
                "new key must be a base58-encoded 64-byte keypair".to_string(),
            ));
        }
        if admin_credential.is_empty() {
            return Err(CommandError::InvalidInput("admin credential is required".to_string()));
        }

        let request = RotateKeyRequest {
            new_key,
            admin_credential,
        };
        let response = self.authorized_post(ROTATE_KEY_PATH, &request).send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(CommandError::Unauthorized);
        }

        let body = response.text().await?;
        let parsed = match serde_json::from_str::<RotateKeyResponse>(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(CommandError::Rejected {
                    status: status.as_u16(),
                    body,
                })
            }
            Err(e) => return Err(CommandError::Decode(e.to_string())),
        };

        if !parsed.success {
            let reason = parsed.error.unwrap_or_else(|| "unknown error".to_string());
            warn!("Wallet key rotation rejected: {}", reason);
            return Err(CommandError::KeyRotationRejected(reason));
        }

        let public_key = parsed
            .public_key
            .ok_or_else(|| CommandError::Decode("response is missing publicKey".to_string()))?;
        let pubkey_len = bs58::decode(&public_key).into_vec().map(|b| b.len()).unwrap_or(0);
        if pubkey_len != PUBKEY_LEN {
            return Err(CommandError::Decode(format!("invalid public key: {}", public_key)));
        }

        info!("Agent wallet rotated to {}", public_key);
        Ok(public_key)
    }

    /// Best-effort price snapshot; no auth
    pub async fn fetch_prices(&self) -> Result<PriceResponse> {
        self.get_json(PRICE_PATH).await
    }

    /// Best-effort portfolio snapshot; no auth
    pub async fn fetch_portfolio(&self) -> Result<PortfolioSnapshot> {
        self.get_json(PORTFOLIO_PATH).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("GET {} returned an error status", url))?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }

    fn authorized_post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> reqwest::RequestBuilder {
        let mut request = self.http.post(self.url(path)).json(body);
        if let Some(secret) = &self.secret {
            request = request.header(self.auth_header.as_str(), secret.as_str());
        }
        request
    }

    async fn post_command<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> CommandResult<reqwest::Response> {
        debug!("POST {}", path);
        let response = self.authorized_post(path, body).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("Agent rejected credentials for {}", path);
            return Err(CommandError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Agent returned {} for {}: {}", status, path, body);
            return Err(CommandError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn require_pool_id(pool_id: &str) -> CommandResult<&str> {
    let pool_id = pool_id.trim();
    if pool_id.is_empty() {
        return Err(CommandError::InvalidInput("pool id is required".to_string()));
    }
    Ok(pool_id)
}
