//! Public IP detection.

use crate::error::{DdnsError, Result};
use crate::http::{ApiRequest, HttpCaller, IpVersion};
use std::sync::Arc;

/// Echo endpoint that answers with the caller's address as plain text.
pub const DEFAULT_ENDPOINT: &str = "http://me.gandi.net/";

/// Asks the echo endpoint for our address over a chosen IP family.
///
/// The endpoint reports whichever address the connection arrived from, so
/// forcing the family is what selects between the IPv4 and IPv6 answer.
pub struct IpDetector {
    caller: Arc<dyn HttpCaller>,
    endpoint: String,
}

impl IpDetector {
    /// Create a new IP detector using the default endpoint.
    pub fn new(caller: Arc<dyn HttpCaller>) -> Self {
        Self::with_endpoint(caller, DEFAULT_ENDPOINT.to_string())
    }

    /// Create with a custom endpoint (for testing).
    pub fn with_endpoint(caller: Arc<dyn HttpCaller>, endpoint: String) -> Self {
        Self { caller, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Detect the current public address for `version`.
    pub async fn detect(&self, version: IpVersion) -> Result<String> {
        let request = ApiRequest::get(&self.endpoint).ip_version(version);

        let result = match self.caller.call(request).await {
            Ok(result) => result,
            Err(e) => {
                let err = match e {
                    DdnsError::Transport(message) => DdnsError::Resolution(message),
                    other => other,
                };
                tracing::error!("Failed to get current {} address. {}", version, err);
                return Err(err);
            }
        };

        if result.status != 200 {
            let err = DdnsError::Resolution(format!("Request returned {}", result.status));
            tracing::error!("Failed to get current {} address. {}", version, err);
            return Err(err);
        }

        tracing::debug!("Got current IP {}", result.body);
        Ok(result.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ReqwestCaller;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn detector_for(endpoint: String) -> IpDetector {
        IpDetector::with_endpoint(Arc::new(ReqwestCaller::new()), endpoint)
    }

    #[test]
    fn test_default_endpoint() {
        let detector = IpDetector::new(Arc::new(ReqwestCaller::new()));
        assert_eq!(detector.endpoint(), "http://me.gandi.net/");
    }

    #[tokio::test]
    async fn test_detect_returns_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("198.51.100.23\n"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let ip = detector_for(format!("{}/", mock_server.uri()))
            .detect(IpVersion::V4)
            .await
            .unwrap();

        assert_eq!(ip, "198.51.100.23");
    }

    #[tokio::test]
    async fn test_detect_non_200_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&mock_server)
            .await;

        let result = detector_for(mock_server.uri()).detect(IpVersion::V4).await;

        match result {
            Err(DdnsError::Resolution(message)) => assert_eq!(message, "Request returned 502"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_detect_unreachable_endpoint() {
        let detector = IpDetector::with_endpoint(
            Arc::new(ReqwestCaller::with_timeout(Duration::from_secs(5))),
            "http://127.0.0.1:1/".to_string(),
        );

        let result = detector.detect(IpVersion::V4).await;
        assert!(matches!(result, Err(DdnsError::Resolution(_))));
    }
}
