use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use tracing::{info, warn};

use crate::client::{ApiClient, RequestDescriptor};
use crate::error::{ApiError, LoginError};

/// Endpoint used to check credentials before a session is recorded.
pub const LOGIN_PROBE_PATH: &str = "/api/security/monitoring/status";

/// `Basic base64(username:password)`, stored and sent verbatim afterwards.
pub fn basic_token(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64_STANDARD.encode(format!("{}:{}", username, password)))
}

/// Check the credentials against the backend and return the token to store.
pub async fn probe_login(
    client: &ApiClient,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<String, LoginError> {
    let token = basic_token(username, password);
    let request = RequestDescriptor::get(LOGIN_PROBE_PATH);

    match client.execute(base_url.trim(), Some(&token), &request).await {
        Ok(response) if response.ok => {
            info!(user = username, "login probe accepted");
            Ok(token)
        }
        Ok(response) => {
            warn!(user = username, status = response.status, "login probe rejected");
            Err(LoginError::Rejected {
                status: response.status,
            })
        }
        Err(ApiError::Http { status, .. }) => Err(LoginError::Rejected { status }),
        Err(e) => Err(LoginError::Network(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TransportResponse;
    use crate::testing::RecordingTransport;
    use reqwest::header::AUTHORIZATION;
    use std::sync::Arc;

    #[test]
    fn test_basic_token_admin() {
        assert_eq!(basic_token("admin", "admin"), "Basic YWRtaW46YWRtaW4=");
    }

    #[tokio::test]
    async fn test_probe_accepts_and_sends_token() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(TransportResponse::new(200, r#"{"totalVisitors":10}"#));
        let client = ApiClient::with_transport(transport.clone(), "http://proxy");

        let token = probe_login(&client, "http://mis/", "admin", "admin").await.unwrap();
        assert_eq!(token, "Basic YWRtaW46YWRtaW4=");

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.url, "http://mis/api/security/monitoring/status");
        assert_eq!(sent.headers.get(AUTHORIZATION).unwrap(), "Basic YWRtaW46YWRtaW4=");
    }

    #[tokio::test]
    async fn test_probe_rejection_is_distinct_from_network_error() {
        let transport = Arc::new(RecordingTransport::new());
        transport.push(TransportResponse::new(401, ""));
        transport.push_error(ApiError::Network("dns failure".to_string()));
        let client = ApiClient::with_transport(transport, "http://proxy");

        let rejected = probe_login(&client, "", "admin", "wrong").await.unwrap_err();
        assert_eq!(rejected, LoginError::Rejected { status: 401 });

        let offline = probe_login(&client, "", "admin", "admin").await.unwrap_err();
        assert!(matches!(offline, LoginError::Network(_)));
    }
}
