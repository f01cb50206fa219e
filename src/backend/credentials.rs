//! Google Application Default Credentials for the OCR backend
//!
//! Discovery order: `GOOGLE_APPLICATION_CREDENTIALS`, the gcloud well-known
//! file, then the GCE metadata server. Access tokens are cached until shortly
//! before they expire.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const DEFAULT_METADATA_HOST: &str = "169.254.169.254";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Tokens are refreshed this long before the server-side expiry
const EXPIRY_SKEW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Error)]
pub enum CredentialsError {
    #[error("could not find default credentials")]
    NotFound,

    #[error("failed to read credentials file {path}: {message}")]
    Read { path: String, message: String },

    #[error("unsupported credential type '{0}'")]
    Unsupported(String),

    #[error("invalid service account key: {0}")]
    InvalidKey(String),

    #[error("token exchange failed: {0}")]
    Exchange(String),
}

/// A bearer token with its local expiry
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_SKEW < self.expires_at
    }
}

/// Source of OAuth2 access tokens
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Short description for logs
    fn kind(&self) -> &'static str;

    /// Project billed for the request, when the credentials name one
    fn quota_project(&self) -> Option<&str> {
        None
    }

    async fn access_token(&self) -> Result<String, CredentialsError>;
}

/// Fixed token, used when a caller already holds a bearer token
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    fn kind(&self) -> &'static str {
        "static"
    }

    async fn access_token(&self) -> Result<String, CredentialsError> {
        Ok(self.0.clone())
    }
}

/// Shared token cache; the async mutex keeps concurrent refreshes to one
#[derive(Default)]
struct TokenCache {
    current: parking_lot::RwLock<Option<AccessToken>>,
    refresh: tokio::sync::Mutex<()>,
}

impl TokenCache {
    fn fresh(&self) -> Option<String> {
        self.current
            .read()
            .as_ref()
            .filter(|t| t.is_fresh())
            .map(|t| t.token.clone())
    }

    async fn get_or_refresh<F, Fut>(&self, fetch: F) -> Result<String, CredentialsError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<AccessToken, CredentialsError>>,
    {
        if let Some(token) = self.fresh() {
            return Ok(token);
        }

        let _guard = self.refresh.lock().await;
        if let Some(token) = self.fresh() {
            return Ok(token);
        }

        let token = fetch().await?;
        let value = token.token.clone();
        *self.current.write() = Some(token);
        Ok(value)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

impl From<TokenResponse> for AccessToken {
    fn from(r: TokenResponse) -> Self {
        AccessToken {
            token: r.access_token,
            expires_at: Instant::now() + Duration::from_secs(r.expires_in),
        }
    }
}

async fn read_token_response(response: reqwest::Response) -> Result<AccessToken, CredentialsError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CredentialsError::Exchange(format!(
            "token endpoint returned {}: {}",
            status, body
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map(AccessToken::from)
        .map_err(|e| CredentialsError::Exchange(format!("malformed token response: {}", e)))
}

/// `authorized_user` credentials from `gcloud auth application-default login`
pub struct UserCredentials {
    client: Client,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    token_uri: String,
    quota_project_id: Option<String>,
    cache: TokenCache,
}

impl UserCredentials {
    async fn fetch(&self) -> Result<AccessToken, CredentialsError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
        ];

        let response = self
            .client
            .post(&self.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| CredentialsError::Exchange(e.to_string()))?;

        read_token_response(response).await
    }
}

#[async_trait]
impl TokenSource for UserCredentials {
    fn kind(&self) -> &'static str {
        "authorized_user"
    }

    fn quota_project(&self) -> Option<&str> {
        self.quota_project_id.as_deref()
    }

    async fn access_token(&self) -> Result<String, CredentialsError> {
        self.cache.get_or_refresh(|| self.fetch()).await
    }
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// `service_account` key file credentials
pub struct ServiceAccountCredentials {
    client: Client,
    client_email: String,
    private_key_id: Option<String>,
    key: EncodingKey,
    token_uri: String,
    cache: TokenCache,
}

impl ServiceAccountCredentials {
    fn assertion(&self) -> Result<String, CredentialsError> {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            iss: &self.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + 3600,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        jsonwebtoken::encode(&header, &claims, &self.key)
            .map_err(|e| CredentialsError::InvalidKey(e.to_string()))
    }

    async fn fetch(&self) -> Result<AccessToken, CredentialsError> {
        let assertion = self.assertion()?;
        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

        let response = self
            .client
            .post(&self.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| CredentialsError::Exchange(e.to_string()))?;

        read_token_response(response).await
    }
}

#[async_trait]
impl TokenSource for ServiceAccountCredentials {
    fn kind(&self) -> &'static str {
        "service_account"
    }

    async fn access_token(&self) -> Result<String, CredentialsError> {
        self.cache.get_or_refresh(|| self.fetch()).await
    }
}

/// Tokens from the GCE metadata server
pub struct MetadataServerCredentials {
    client: Client,
    host: String,
    cache: TokenCache,
}

impl MetadataServerCredentials {
    pub fn new(client: Client, host: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into(),
            cache: TokenCache::default(),
        }
    }

    async fn fetch(&self) -> Result<AccessToken, CredentialsError> {
        let url = format!(
            "http://{}/computeMetadata/v1/instance/service-accounts/default/token",
            self.host
        );

        let response = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| CredentialsError::Exchange(e.to_string()))?;

        read_token_response(response).await
    }
}

#[async_trait]
impl TokenSource for MetadataServerCredentials {
    fn kind(&self) -> &'static str {
        "metadata_server"
    }

    async fn access_token(&self) -> Result<String, CredentialsError> {
        self.cache.get_or_refresh(|| self.fetch()).await
    }
}

/// Credential file contents, keyed by `type`
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CredentialsFile {
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        #[serde(default)]
        quota_project_id: Option<String>,
        #[serde(default)]
        token_uri: Option<String>,
    },
    ServiceAccount {
        client_email: String,
        private_key: String,
        #[serde(default)]
        private_key_id: Option<String>,
        #[serde(default)]
        token_uri: Option<String>,
    },
}

/// Build a token source from a credentials JSON file
pub fn from_file(path: &Path, client: Client) -> Result<Arc<dyn TokenSource>, CredentialsError> {
    let read_error = |message: String| CredentialsError::Read {
        path: path.display().to_string(),
        message,
    };

    let content = std::fs::read_to_string(path).map_err(|e| read_error(e.to_string()))?;
    let raw: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| read_error(e.to_string()))?;

    let kind = raw
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| read_error("missing 'type' field".to_string()))?
        .to_string();
    if kind != "authorized_user" && kind != "service_account" {
        return Err(CredentialsError::Unsupported(kind));
    }

    let parsed: CredentialsFile =
        serde_json::from_value(raw).map_err(|e| read_error(e.to_string()))?;

    let source: Arc<dyn TokenSource> = match parsed {
        CredentialsFile::AuthorizedUser {
            client_id,
            client_secret,
            refresh_token,
            quota_project_id,
            token_uri,
        } => Arc::new(UserCredentials {
            client,
            client_id,
            client_secret,
            refresh_token,
            token_uri: token_uri.unwrap_or_else(|| GOOGLE_TOKEN_URI.to_string()),
            quota_project_id,
            cache: TokenCache::default(),
        }),
        CredentialsFile::ServiceAccount {
            client_email,
            private_key,
            private_key_id,
            token_uri,
        } => {
            let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
                .map_err(|e| CredentialsError::InvalidKey(e.to_string()))?;
            Arc::new(ServiceAccountCredentials {
                client,
                client_email,
                private_key_id,
                key,
                token_uri: token_uri.unwrap_or_else(|| GOOGLE_TOKEN_URI.to_string()),
                cache: TokenCache::default(),
            })
        }
    };

    Ok(source)
}

/// gcloud's application default credentials file
fn well_known_file() -> Option<PathBuf> {
    const FILE: &str = "application_default_credentials.json";

    if cfg!(windows) {
        std::env::var_os("APPDATA").map(|dir| PathBuf::from(dir).join("gcloud").join(FILE))
    } else {
        dirs::home_dir().map(|home| home.join(".config").join("gcloud").join(FILE))
    }
}

async fn metadata_server_available(client: &Client, host: &str) -> bool {
    let url = format!("http://{}/computeMetadata/v1/", host);
    match client
        .get(&url)
        .header("Metadata-Flavor", "Google")
        .timeout(Duration::from_millis(500))
        .send()
        .await
    {
        Ok(response) => response
            .headers()
            .get("Metadata-Flavor")
            .map_or(false, |v| v == "Google"),
        Err(e) => {
            debug!(error = %e, "Metadata server not reachable");
            false
        }
    }
}

/// Locations consulted during discovery, in priority order
#[derive(Debug, Clone)]
pub struct DiscoveryPaths {
    /// `GOOGLE_APPLICATION_CREDENTIALS`
    pub credentials_file: Option<PathBuf>,
    /// gcloud's application default credentials file
    pub well_known_file: Option<PathBuf>,
    /// Metadata server `host[:port]`
    pub metadata_host: String,
}

impl DiscoveryPaths {
    /// Resolve the locations from the process environment
    pub fn from_env() -> Self {
        Self {
            credentials_file: std::env::var_os("GOOGLE_APPLICATION_CREDENTIALS")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            well_known_file: well_known_file(),
            metadata_host: std::env::var("GCE_METADATA_HOST")
                .ok()
                .filter(|h| !h.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string()),
        }
    }
}

/// Resolve Application Default Credentials for the current host
pub async fn discover(client: Client) -> Result<Arc<dyn TokenSource>, CredentialsError> {
    discover_with(client, &DiscoveryPaths::from_env()).await
}

/// Resolve credentials from explicit locations. A configured credentials
/// file is authoritative: if it cannot be used, discovery stops there.
pub async fn discover_with(
    client: Client,
    paths: &DiscoveryPaths,
) -> Result<Arc<dyn TokenSource>, CredentialsError> {
    if let Some(path) = &paths.credentials_file {
        info!(path = %path.display(), "Using GOOGLE_APPLICATION_CREDENTIALS");
        return from_file(path, client);
    }

    if let Some(path) = paths.well_known_file.as_ref().filter(|p| p.exists()) {
        info!(path = %path.display(), "Using gcloud application default credentials");
        return from_file(path, client);
    }

    let host = &paths.metadata_host;
    if metadata_server_available(&client, host).await {
        info!(host = %host, "Using GCE metadata server credentials");
        return Ok(Arc::new(MetadataServerCredentials::new(client, host.clone())));
    }

    Err(CredentialsError::NotFound)
}
