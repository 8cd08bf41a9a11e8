use std::io;
use std::pin::Pin;
use std::time::{Duration, Instant};

use futures::TryStreamExt;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use tokio::io::AsyncBufRead;
use tokio_util::io::StreamReader;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUESTS, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS};
use crate::types::ChatRequest;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// A streaming response body, read line by line by the decoder.
///
/// Dropping the body releases the underlying connection.
pub type ResponseBody = Pin<Box<dyn AsyncBufRead + Send>>;

/// Something that can deliver a chat request and hand back the streamed body.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the response body once the server has
    /// accepted it with a success status.
    async fn open_stream(&self, request: &ChatRequest) -> Result<ResponseBody>;
}

/// Connection settings for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the OpenAI-compatible API, e.g. `http://127.0.0.1:8080/v1`.
    pub endpoint: String,
    /// Bearer token; omitted from requests when `None` or empty.
    pub api_key: Option<String>,
    /// How long to wait for the TCP connection to establish.
    pub connect_timeout: Duration,
}

impl ClientOptions {
    /// Options for the given endpoint with no API key.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

/// HTTP client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct Client {
    client: ReqwestClient,
    chat_url: String,
    headers: HeaderMap,
    connect_timeout: Duration,
}

impl Client {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL, the API key cannot
    /// be sent as a header, or the HTTP client cannot be built.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let endpoint = options.endpoint.trim().trim_end_matches('/');
        url::Url::parse(endpoint)?;
        let chat_url = format!("{endpoint}/chat/completions");

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        if let Some(key) = options.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|_| {
                Error::validation(
                    "API key contains characters not allowed in a header",
                    Some("api_key".to_string()),
                )
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = ReqwestClient::builder()
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            chat_url,
            headers,
            connect_timeout: options.connect_timeout,
        })
    }

    /// The full URL requests are posted to.
    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    /// The headers attached to every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Read the body of a failed response into an error.
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("received non-OK HTTP status: {status}; failed to read body: {e}"),
                    Some(Box::new(e)),
                );
            }
        };
        Error::api(
            status.as_u16(),
            format!("received non-OK HTTP status: {status}, body: {}", body.trim()),
        )
    }

    fn send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                Some(self.connect_timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("could not send request: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }
}

#[async_trait::async_trait]
impl Transport for Client {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ResponseBody> {
        let body = request.to_body()?;
        CLIENT_REQUESTS.click();
        let start = Instant::now();

        let response = self
            .client
            .post(&self.chat_url)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                self.send_error(e)
            })?;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        let stream = response.bytes_stream().map_err(io::Error::other);
        Ok(Box::pin(StreamReader::new(stream)))
    }
}
