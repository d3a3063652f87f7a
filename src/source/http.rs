use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::core::{SessionId, TrackGeometry};
use crate::source::{PageRequest, SourceError, SourceResult, TelemetryPage, TelemetrySource};

/// Telemetry backend reached over HTTP
///
/// Endpoints:
/// - `GET /api/race/{year}/{round}/{type}/telemetry?refresh&start_frame&frame_count`
/// - `GET /api/race/{year}/{round}/{type}/track`
pub struct HttpSource {
    name: String,
    client: Client,
    base_url: String,
}

impl HttpSource {
    /// Create a source for `base_url`, e.g. `http://localhost:8000`
    pub fn new(base_url: &str, timeout: Duration) -> SourceResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self {
            name: format!("http:{}", base_url),
            client,
            base_url,
        })
    }

    fn session_url(&self, session: SessionId, endpoint: &str) -> String {
        format!(
            "{}/api/race/{}/{}/{}/{}",
            self.base_url,
            session.year,
            session.round,
            session.session_type.code(),
            endpoint
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> SourceResult<T> {
        debug!("GET {} {:?}", url, query);
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| SourceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TelemetrySource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_telemetry(
        &self,
        session: SessionId,
        request: PageRequest,
    ) -> SourceResult<TelemetryPage> {
        let url = self.session_url(session, "telemetry");
        let query = [
            ("refresh", request.force_refresh.to_string()),
            ("start_frame", request.start_frame.to_string()),
            ("frame_count", request.frame_count.to_string()),
        ];
        self.get_json(&url, &query).await
    }

    async fn fetch_track(&self, session: SessionId) -> SourceResult<TrackGeometry> {
        let url = self.session_url(session, "track");
        self.get_json(&url, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionType;

    #[test]
    fn test_session_urls() {
        let source = HttpSource::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        let session = SessionId::new(2024, 7, SessionType::SprintQualifying);

        assert_eq!(source.name(), "http:http://localhost:8000");
        assert_eq!(
            source.session_url(session, "telemetry"),
            "http://localhost:8000/api/race/2024/7/SQ/telemetry"
        );
        assert_eq!(
            source.session_url(session, "track"),
            "http://localhost:8000/api/race/2024/7/SQ/track"
        );
    }
}
