//! HTTP implementation of [`BookingService`] against the booking service's
//! JSON API.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Booking, BookingReceipt, RandomOccupancy, Room, RoomCount},
    error::{SchemaError, ServiceErrorBody},
    protocol::{
        book_route, bookings_route, random_route, reset_route, rooms_route, BookRequest,
        BookResponse, BookingsResponse, RandomResponse, ResetResponse, RoomsResponse,
    },
};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::BookingService;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} responded with status {status}")]
    Status {
        endpoint: &'static str,
        status: u16,
        detail: Option<String>,
    },
    #[error("{endpoint} returned an undecodable body: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned a malformed response: {source}")]
    Malformed {
        endpoint: &'static str,
        #[source]
        source: SchemaError,
    },
    #[error("booking service unavailable: {0}")]
    Unavailable(String),
}

impl RequestError {
    /// Operator-facing detail supplied by the service, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

struct Endpoints {
    rooms: Url,
    bookings: Url,
    book: Url,
    reset: Url,
    random: Url,
}

pub struct HttpBookingService {
    http: Client,
    api_root: Url,
    endpoints: Endpoints,
}

impl HttpBookingService {
    pub fn new(backend_url: &str) -> Result<Self> {
        Self::with_timeout(backend_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(backend_url: &str, timeout: Duration) -> Result<Self> {
        let api_root = api_root(backend_url)?;
        let endpoint = |route: &str| {
            api_root
                .join(route)
                .with_context(|| format!("failed to build endpoint url for {route}"))
        };
        let endpoints = Endpoints {
            rooms: endpoint(rooms_route())?,
            bookings: endpoint(bookings_route())?,
            book: endpoint(book_route())?,
            reset: endpoint(reset_route())?,
            random: endpoint(random_route())?,
        };
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            http,
            api_root,
            endpoints,
        })
    }

    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    async fn dispatch(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, RequestError> {
        debug!(endpoint, "booking service request");
        let response = request
            .send()
            .await
            .map_err(|source| RequestError::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ServiceErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message());
            return Err(RequestError::Status {
                endpoint,
                status: status.as_u16(),
                detail,
            });
        }

        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<T, RequestError> {
        self.dispatch(endpoint, request)
            .await?
            .json::<T>()
            .await
            .map_err(|source| RequestError::Decode { endpoint, source })
    }
}

#[async_trait]
impl BookingService for HttpBookingService {
    async fn list_rooms(&self) -> Result<Vec<Room>, RequestError> {
        let endpoint = rooms_route();
        self.fetch::<RoomsResponse>(endpoint, self.http.get(self.endpoints.rooms.clone()))
            .await?
            .into_rooms()
            .map_err(|source| RequestError::Malformed { endpoint, source })
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, RequestError> {
        let endpoint = bookings_route();
        self.fetch::<BookingsResponse>(endpoint, self.http.get(self.endpoints.bookings.clone()))
            .await?
            .into_bookings()
            .map_err(|source| RequestError::Malformed { endpoint, source })
    }

    async fn book(&self, count: RoomCount) -> Result<BookingReceipt, RequestError> {
        let endpoint = book_route();
        let request = self
            .http
            .post(self.endpoints.book.clone())
            .json(&BookRequest::from(count));
        let response = self.fetch::<BookResponse>(endpoint, request).await?;
        BookingReceipt::try_from(response)
            .map_err(|source| RequestError::Malformed { endpoint, source })
    }

    async fn reset(&self) -> Result<(), RequestError> {
        let endpoint = reset_route();
        let response = self
            .dispatch(endpoint, self.http.post(self.endpoints.reset.clone()))
            .await?;

        // Any 2xx counts; the summary body is informational only.
        match response.bytes().await {
            Ok(body) if !body.is_empty() => {
                if let Ok(summary) = serde_json::from_slice::<ResetResponse>(&body) {
                    debug!(
                        rooms_reset = ?summary.rooms_reset,
                        message = ?summary.message,
                        "booking service reset summary"
                    );
                }
            }
            Ok(_) => {}
            Err(err) => debug!(%err, "ignoring unreadable reset body"),
        }
        Ok(())
    }

    async fn randomize(&self) -> Result<RandomOccupancy, RequestError> {
        let endpoint = random_route();
        let response = self
            .fetch::<RandomResponse>(endpoint, self.http.post(self.endpoints.random.clone()))
            .await?;
        RandomOccupancy::try_from(response)
            .map_err(|source| RequestError::Malformed { endpoint, source })
    }
}

/// Resolves `{backend_url}/api/`, keeping any path prefix the backend is
/// mounted under.
pub fn api_root(backend_url: &str) -> Result<Url> {
    let trimmed = backend_url.trim();
    let mut url =
        Url::parse(trimmed).with_context(|| format!("invalid backend url: {trimmed:?}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow!("backend url must start with http:// or https://"));
    }

    let path = url.path().trim_end_matches('/');
    let path = if path.ends_with("/api") {
        format!("{path}/")
    } else {
        format!("{path}/api/")
    };
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
#[path = "tests/remote_tests.rs"]
mod tests;
