//! Exception capture against the Sentry store endpoint.

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::SentryError;
use crate::models::Level;

/// Parsed client DSN (`scheme://key@host[:port]/project_id`).
#[derive(Debug, Clone)]
pub struct Dsn {
    public_key: String,
    store_url: String,
}

impl Dsn {
    /// Parse a DSN string.
    pub fn parse(dsn: &str) -> Result<Self, SentryError> {
        let url =
            url::Url::parse(dsn).map_err(|e| SentryError::InvalidDsn(format!("{dsn}: {e}")))?;

        let public_key = url.username();
        if public_key.is_empty() {
            return Err(SentryError::InvalidDsn(format!(
                "{dsn}: missing public key"
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| SentryError::InvalidDsn(format!("{dsn}: missing host")))?;

        let project_id = url.path().trim_matches('/');
        if project_id.is_empty() {
            return Err(SentryError::InvalidDsn(format!(
                "{dsn}: missing project id"
            )));
        }

        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let store_url = format!("{}://{authority}/api/{project_id}/store/", url.scheme());

        Ok(Self {
            public_key: public_key.to_string(),
            store_url,
        })
    }

    /// Ingestion endpoint derived from the DSN.
    #[must_use]
    pub fn store_url(&self) -> &str {
        &self.store_url
    }

    fn auth_header(&self) -> String {
        format!(
            "Sentry sentry_version=7, sentry_client=warden/{}, sentry_key={}",
            env!("CARGO_PKG_VERSION"),
            self.public_key
        )
    }
}

/// Posts minimal events to Sentry for exception capture.
///
/// Capture is best-effort: failures are logged and swallowed so that
/// reporting an error can never take the service down with it.
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    http: reqwest::Client,
    dsn: Dsn,
}

impl ErrorReporter {
    /// Create a reporter from a DSN string.
    pub fn new(dsn: &str) -> Result<Self, SentryError> {
        Ok(Self {
            http: reqwest::Client::new(),
            dsn: Dsn::parse(dsn)?,
        })
    }

    /// Capture a message at the given level.
    pub async fn capture_message(&self, message: &str, level: Level) {
        let event = serde_json::json!({
            "event_id": Uuid::new_v4().simple().to_string(),
            "timestamp": Utc::now().to_rfc3339(),
            "platform": "other",
            "logger": "warden",
            "level": level.to_string(),
            "message": message,
        });

        let result = self
            .http
            .post(self.dsn.store_url())
            .header("X-Sentry-Auth", self.dsn.auth_header())
            .json(&event)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(level = %level, "Captured event");
            }
            Ok(response) => {
                warn!(status = %response.status(), "Sentry rejected captured event");
            }
            Err(err) => {
                warn!(error = %err, "Failed to deliver captured event");
            }
        }
    }
}
