//! InfluxDB HTTP write sink.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;

use super::endpoint::{authenticate, write_url};
use super::report::failure_report;
use super::{SendOutcome, WriteSink};
use crate::config::{EndpointConfig, CONNECTION_TEST_MEASUREMENT};
use crate::error_handling::{DeliveryError, DeliveryFailure, InitializationError};
use crate::initialization::init_client;
use crate::line_protocol;
use crate::point::{Point, Precision};
use crate::utils::sanitize::sanitize_and_truncate_error_message;

/// Writes batches to the InfluxDB write API.
///
/// The endpoint configuration is read at the start of every send and can be
/// replaced at any time with [`update_config`](Self::update_config).
/// [`close`](WriteSink::close) cancels every in-flight request; sends after
/// that are dropped as cancelled.
pub struct HttpWriteSink {
    client: reqwest::Client,
    config: RwLock<EndpointConfig>,
    shutdown: CancellationToken,
}

impl HttpWriteSink {
    /// Creates a sink with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if the client cannot be built.
    pub fn new(config: EndpointConfig) -> Result<Self, InitializationError> {
        Ok(Self::with_client(init_client()?, config))
    }

    /// Creates a sink that sends through an existing client.
    pub fn with_client(client: reqwest::Client, config: EndpointConfig) -> Self {
        HttpWriteSink {
            client,
            config: RwLock::new(config),
            shutdown: CancellationToken::new(),
        }
    }

    /// Snapshot of the current endpoint configuration.
    pub fn config(&self) -> EndpointConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the endpoint configuration; the next send uses it.
    pub fn update_config(&self, config: EndpointConfig) {
        log::debug!("Endpoint configuration updated:\n{}", config);
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Writes a single test point directly, bypassing any buffering.
    ///
    /// Meant to be called once at startup so a misconfigured endpoint shows
    /// up before the first timer tick.
    pub async fn check_connection(&self) -> Result<SendOutcome, DeliveryError> {
        let point =
            Point::now(CONNECTION_TEST_MEASUREMENT).field("message", "successfully initialized");
        let line = line_protocol::encode(&point, self.precision())?;
        self.send(&[line]).await
    }

    async fn post(
        &self,
        config: &EndpointConfig,
        url: url::Url,
        body: String,
    ) -> Result<(), DeliveryFailure> {
        let request = self
            .client
            .post(url)
            .timeout(config.request_timeout)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body);
        let request = authenticate(request, config);

        let response = request
            .send()
            .await
            .map_err(DeliveryFailure::from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let reason = status.canonical_reason().unwrap_or_default().to_string();
        // The body carries the server's explanation (e.g. which line failed to parse)
        let body = response
            .text()
            .await
            .ok()
            .map(|text| sanitize_and_truncate_error_message(text.trim()))
            .filter(|text| !text.is_empty());

        Err(DeliveryFailure::Status {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}

#[async_trait]
impl WriteSink for HttpWriteSink {
    async fn send(&self, lines: &[String]) -> Result<SendOutcome, DeliveryError> {
        if lines.is_empty() {
            return Ok(SendOutcome::Skipped);
        }

        let config = self.config();
        config.validate()?;
        let url = write_url(&config)?;

        let body = lines.join("\n");
        log::trace!("content: \n{}", body);

        let result = if self.shutdown.is_cancelled() {
            Err(DeliveryFailure::Cancelled)
        } else {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => Err(DeliveryFailure::Cancelled),
                res = self.post(&config, url, body) => res,
            }
        };

        match result {
            Ok(()) => {
                log::debug!("Wrote {} lines to {}", lines.len(), config.bucket);
                Ok(SendOutcome::Delivered { lines: lines.len() })
            }
            Err(failure) => {
                if !config.suppress_response_errors {
                    log::error!("{}", failure_report(&config, &failure, lines));
                }
                Ok(SendOutcome::Dropped {
                    lines: lines.len(),
                    failure,
                })
            }
        }
    }

    fn precision(&self) -> Precision {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .precision
    }

    fn close(&self) {
        if !self.shutdown.is_cancelled() {
            log::debug!("Closing write sink; cancelling in-flight requests");
            self.shutdown.cancel();
        }
    }
}
