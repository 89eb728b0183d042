//! Identity provider adapters.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use adsmarket_core::{IdentityError, IdentityProvider, PartnerIdentity};

/// Resolves bearer tokens against the external auth service
/// (`GET {base}/auth/getUserDetails`).
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct UserDetails {
    user: PartnerIdentity,
}

impl HttpIdentityProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/auth/getUserDetails", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn resolve(&self, credential: &str) -> Result<PartnerIdentity, IdentityError> {
        if credential.trim().is_empty() {
            return Err(IdentityError::MissingCredential);
        }

        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    error = %e,
                    "identity service unreachable"
                );
                IdentityError::Unreachable(e.to_string())
            })?;

        match response.status() {
            reqwest::StatusCode::UNAUTHORIZED => {
                return Err(IdentityError::InvalidCredential("rejected by identity service".into()));
            }
            reqwest::StatusCode::FORBIDDEN => return Err(IdentityError::Forbidden),
            status if !status.is_success() => {
                return Err(IdentityError::Unreachable(format!(
                    "identity service returned {status}"
                )));
            }
            _ => {}
        }

        let details: UserDetails = response
            .json()
            .await
            .map_err(|e| IdentityError::Unreachable(format!("malformed identity response: {e}")))?;
        if details.user.email.trim().is_empty() {
            return Err(IdentityError::InvalidCredential("identity carries no email".into()));
        }
        Ok(details.user)
    }
}

/// Fixed token table, for local runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, PartnerIdentity>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, identity: PartnerIdentity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, credential: &str) -> Result<PartnerIdentity, IdentityError> {
        if credential.trim().is_empty() {
            return Err(IdentityError::MissingCredential);
        }
        self.tokens
            .get(credential)
            .cloned()
            .ok_or_else(|| IdentityError::InvalidCredential("unknown token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::{Json, Router, routing::get};
    use serde_json::json;

    async fn user_details(headers: HeaderMap) -> axum::response::Response {
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or_default();
        match token {
            "good" => Json(json!({
                "user": {"email": "ads@acme.test", "companyName": "Acme", "city": "Lyon"}
            }))
            .into_response(),
            "banned" => StatusCode::FORBIDDEN.into_response(),
            "broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            "anonymous" => Json(json!({"user": {"email": ""}})).into_response(),
            _ => StatusCode::UNAUTHORIZED.into_response(),
        }
    }

    async fn spawn_auth_service() -> (String, tokio::task::JoinHandle<()>) {
        let app = Router::new().route("/auth/getUserDetails", get(user_details));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (base, handle)
    }

    #[tokio::test]
    async fn http_provider_maps_upstream_outcomes() {
        let (base, handle) = spawn_auth_service().await;
        let provider =
            HttpIdentityProvider::new(&format!("{base}/"), Duration::from_secs(5)).unwrap();
        assert_eq!(provider.endpoint(), format!("{base}/auth/getUserDetails"));

        let identity = provider.resolve("good").await.unwrap();
        assert_eq!(identity.email, "ads@acme.test");
        assert_eq!(identity.company_name.as_deref(), Some("Acme"));
        assert_eq!(identity.city.as_deref(), Some("Lyon"));

        assert_eq!(provider.resolve("banned").await, Err(IdentityError::Forbidden));
        assert!(matches!(provider.resolve("nope").await, Err(IdentityError::InvalidCredential(_))));
        assert!(matches!(provider.resolve("broken").await, Err(IdentityError::Unreachable(_))));
        assert!(matches!(
            provider.resolve("anonymous").await,
            Err(IdentityError::InvalidCredential(_))
        ));
        assert_eq!(provider.resolve("").await, Err(IdentityError::MissingCredential));

        handle.abort();
    }

    #[tokio::test]
    async fn http_provider_reports_unreachable_service() {
        // Bind and drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider =
            HttpIdentityProvider::new(&format!("http://{addr}"), Duration::from_millis(500))
                .unwrap();
        assert!(matches!(provider.resolve("good").await, Err(IdentityError::Unreachable(_))));
    }

    #[tokio::test]
    async fn static_provider_resolves_known_tokens() {
        let provider = StaticIdentityProvider::new()
            .with_token("t1", PartnerIdentity::new("a@x.test", None));
        assert_eq!(provider.resolve("t1").await.unwrap().email, "a@x.test");
        assert!(matches!(provider.resolve("t2").await, Err(IdentityError::InvalidCredential(_))));
        assert_eq!(provider.resolve(" ").await, Err(IdentityError::MissingCredential));
    }
}
