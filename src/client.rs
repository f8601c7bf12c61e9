use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{self, HeaderValue};
use reqwest::{Client as ReqwestClient, StatusCode};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUESTS, CLIENT_REQUEST_ERRORS, CLIENT_UNSUPPORTED_STREAMS};
use crate::stream::{ByteStream, ReadOptions, TextStream, collect_reply, decode_stream};
use crate::types::{AssistantRole, ChatRequest};

/// Default wait for the next chunk of a reply before giving up.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest error body quoted in a transport error.
const MAX_ERROR_BODY: usize = 512;

/// What a transport hands back for a chat POST.
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// The body as a byte stream, or `None` when nothing can be streamed.
    pub body: Option<ByteStream>,
}

impl TransportResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .finish()
    }
}

/// Sends a chat request and exposes the raw response.
///
/// [`HttpTransport`] is the production implementation; tests plug in
/// scripted transports.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// POST `request` as JSON to the chat endpoint.
    async fn post(&self, request: &ChatRequest) -> Result<TransportResponse>;

    /// The cookie string the endpoint would currently receive, if known.
    fn cookies(&self) -> Option<String> {
        None
    }
}

/// reqwest-backed transport with a cookie jar so session cookies travel with
/// every request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    endpoint: Url,
    jar: Arc<Jar>,
    assistant_role: AssistantRole,
}

impl HttpTransport {
    /// Create a transport for `endpoint`.
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_options(endpoint, None)
    }

    /// Create a transport with a custom connect timeout.
    ///
    /// There is no overall request timeout: replies may stream for as long as
    /// chunks keep arriving.  Stalls are bounded by the read loop instead.
    pub fn with_options(endpoint: &str, connect_timeout: Option<Duration>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        let jar = Arc::new(Jar::default());
        let client = ReqwestClient::builder()
            .connect_timeout(connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT))
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            jar,
            assistant_role: AssistantRole::default(),
        })
    }

    /// Sets the role name assistant turns are sent with.
    pub fn with_assistant_role(mut self, assistant_role: AssistantRole) -> Self {
        self.assistant_role = assistant_role;
        self
    }

    /// The endpoint requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Seed the cookie jar, as if the endpoint had sent `Set-Cookie: cookie`.
    pub fn add_cookie(&self, cookie: &str) {
        self.jar.add_cookie_str(cookie, &self.endpoint);
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn post(&self, request: &ChatRequest) -> Result<TransportResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(header::ACCEPT, HeaderValue::from_static("text/plain"))
            .json(&request.to_wire(self.assistant_role))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(format!("Request timed out: {e}"), None)
                } else {
                    Error::transport(
                        e.status().map(|s| s.as_u16()),
                        format!("Request failed: {e}"),
                        Some(Box::new(e)),
                    )
                }
            })?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(TransportResponse {
                status: status.as_u16(),
                body: None,
            });
        }

        let body = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| {
                Error::transport(None, format!("Error in HTTP stream: {e}"), Some(Box::new(e)))
            })
        });

        Ok(TransportResponse {
            status: status.as_u16(),
            body: Some(Box::pin(body)),
        })
    }

    fn cookies(&self) -> Option<String> {
        self.jar
            .cookies(&self.endpoint)
            .and_then(|value| value.to_str().ok().map(String::from))
    }
}

/// Client for the streaming chat endpoint.
#[derive(Clone)]
pub struct ChatClient {
    transport: Arc<dyn ChatTransport>,
    idle_timeout: Option<Duration>,
}

impl ChatClient {
    /// Create a client that talks HTTP to `endpoint`.
    pub fn new(endpoint: &str) -> Result<Self> {
        Ok(Self::with_http(HttpTransport::new(endpoint)?))
    }

    /// Create a client around an HTTP transport.
    pub fn with_http(transport: HttpTransport) -> Self {
        Self::with_transport(Arc::new(transport))
    }

    /// Create a client on top of any transport.
    pub fn with_transport(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
        }
    }

    /// Sets the idle timeout.  `None` waits for chunks forever.
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// The configured idle timeout.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// The cookie string the endpoint currently receives.
    pub fn cookies(&self) -> Option<String> {
        self.transport.cookies()
    }

    fn read_options(&self, cancel: Option<CancellationToken>) -> ReadOptions {
        ReadOptions {
            idle_timeout: self.idle_timeout,
            cancel,
        }
    }

    /// Open the reply body, failing on invalid input, bad status or missing body.
    ///
    /// The wait for response headers shares the idle timeout and stops when
    /// `cancel` fires.
    async fn open(
        &self,
        request: &ChatRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<ByteStream> {
        request.validate()?;
        CLIENT_REQUESTS.click();
        tracing::debug!(?request, "posting chat request");

        let post = async {
            let Some(limit) = self.idle_timeout else {
                return self.transport.post(request).await;
            };
            tokio::time::timeout(limit, self.transport.post(request))
                .await
                .unwrap_or_else(|_| {
                    Err(Error::timeout(
                        "chat endpoint did not respond",
                        Some(limit.as_secs_f64()),
                    ))
                })
        };
        let posted = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::cancelled("chat request cancelled")),
                posted = post => posted,
            },
            None => post.await,
        };
        let response = match posted {
            Ok(response) => response,
            Err(err) => {
                CLIENT_REQUEST_ERRORS.click();
                tracing::warn!(error = %err, "chat request failed");
                return Err(err);
            }
        };

        if !response.is_success() {
            CLIENT_REQUEST_ERRORS.click();
            let detail = match response.body {
                Some(body) => error_body(body).await,
                None => String::new(),
            };
            tracing::warn!(status = response.status, %detail, "chat endpoint returned an error");
            let message = if detail.is_empty() {
                format!("chat endpoint returned status {}", response.status)
            } else {
                format!("chat endpoint returned status {}: {detail}", response.status)
            };
            return Err(Error::transport(Some(response.status), message, None));
        }

        match response.body {
            Some(body) => Ok(body),
            None => {
                CLIENT_UNSUPPORTED_STREAMS.click();
                Err(Error::unsupported_stream(format!(
                    "response with status {} has no readable body",
                    response.status
                )))
            }
        }
    }

    /// Send a request and get the reply as a stream of decoded fragments.
    pub async fn stream(&self, request: &ChatRequest) -> Result<TextStream> {
        let body = self.open(request, None).await?;
        Ok(decode_stream(body, self.read_options(None)))
    }

    /// Like [`stream`](ChatClient::stream), stopping when `cancel` fires.
    pub async fn stream_with_cancel(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<TextStream> {
        let body = self.open(request, Some(&cancel)).await?;
        Ok(decode_stream(body, self.read_options(Some(cancel))))
    }

    /// Send a request, hand every decoded fragment to `on_chunk` and return the
    /// full reply once the body ends.
    ///
    /// Fragments already delivered to `on_chunk` are not retracted if the
    /// stream later fails.
    pub async fn send_message<F>(&self, request: &ChatRequest, on_chunk: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let fragments = self.stream(request).await?;
        finish(collect_reply(fragments, on_chunk).await)
    }

    /// Like [`send_message`](ChatClient::send_message), stopping when `cancel` fires.
    pub async fn send_message_with_cancel<F>(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
        on_chunk: F,
    ) -> Result<String>
    where
        F: FnMut(&str),
    {
        let fragments = self.stream_with_cancel(request, cancel).await?;
        finish(collect_reply(fragments, on_chunk).await)
    }
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

fn finish(reply: Result<String>) -> Result<String> {
    match &reply {
        Ok(text) => tracing::debug!(bytes = text.len(), "chat reply complete"),
        Err(err) => tracing::warn!(error = %err, "chat reply stream ended early"),
    }
    reply
}

/// Read an error response body, best effort and truncated.
async fn error_body(body: ByteStream) -> String {
    let mut text = String::new();
    let options = ReadOptions {
        idle_timeout: Some(Duration::from_secs(5)),
        cancel: None,
    };
    let _ = collect_reply(decode_stream(body, options), |chunk| {
        if text.len() < MAX_ERROR_BODY {
            text.push_str(chunk);
        }
    })
    .await;
    if text.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use futures::stream;

    use crate::types::ChatMessage;

    struct ScriptedTransport {
        status: u16,
        chunks: Option<Vec<Result<Bytes>>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(status: u16, chunks: Option<Vec<Result<Bytes>>>) -> Arc<Self> {
            Arc::new(Self {
                status,
                chunks,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn post(&self, _: &ChatRequest) -> Result<TransportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = self
                .chunks
                .clone()
                .map(|chunks| Box::pin(stream::iter(chunks)) as ByteStream);
            Ok(TransportResponse {
                status: self.status,
                body,
            })
        }
    }

    fn request() -> ChatRequest {
        ChatRequest::messages(vec![ChatMessage::user("Hi")])
    }

    #[tokio::test]
    async fn send_message_streams_fragments() {
        let transport = ScriptedTransport::new(
            200,
            Some(vec![Ok(Bytes::from_static(b"He")), Ok(Bytes::from_static(b"llo"))]),
        );
        let client = ChatClient::with_transport(transport.clone());

        let mut seen = Vec::new();
        let reply = client
            .send_message(&request(), |chunk| seen.push(chunk.to_string()))
            .await
            .unwrap();

        assert_eq!(reply, "Hello");
        assert_eq!(seen, vec!["He", "llo"]);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn error_status_is_transport_error() {
        let transport = ScriptedTransport::new(
            503,
            Some(vec![Ok(Bytes::from_static(b"upstream unavailable"))]),
        );
        let client = ChatClient::with_transport(transport);

        let mut calls = 0;
        let err = client
            .send_message(&request(), |_| calls += 1)
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert_eq!(err.status_code(), Some(503));
        assert!(err.to_string().contains("upstream unavailable"));
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn missing_body_is_unsupported_stream() {
        let transport = ScriptedTransport::new(200, None);
        let client = ChatClient::with_transport(transport);

        let err = client.send_message(&request(), |_| {}).await.unwrap_err();
        assert!(err.is_unsupported_stream());
    }

    #[tokio::test]
    async fn blank_request_never_reaches_transport() {
        let transport = ScriptedTransport::new(200, Some(vec![]));
        let client = ChatClient::with_transport(transport.clone());

        let err = client
            .send_message(&ChatRequest::prompt("  \n"), |_| {})
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancelled_before_first_chunk() {
        let transport = ScriptedTransport::new(200, Some(vec![Ok(Bytes::from_static(b"late"))]));
        let client = ChatClient::with_transport(transport);
        let token = CancellationToken::new();
        token.cancel();

        let err = client
            .send_message_with_cancel(&request(), token, |_| {})
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    struct SilentTransport;

    #[async_trait]
    impl ChatTransport for SilentTransport {
        async fn post(&self, _: &ChatRequest) -> Result<TransportResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(TransportResponse {
                status: 200,
                body: None,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn silent_endpoint_times_out() {
        let client = ChatClient::with_transport(Arc::new(SilentTransport))
            .with_idle_timeout(Some(Duration::from_secs(5)));

        let err = client.send_message(&request(), |_| {}).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_wait_for_headers() {
        let client = ChatClient::with_transport(Arc::new(SilentTransport)).with_idle_timeout(None);
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let err = tokio::time::timeout(
            Duration::from_secs(600),
            client.send_message_with_cancel(&request(), token, |_| {}),
        )
        .await
        .expect("cancellation should end the wait for headers")
        .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn client_creation() {
        let client = ChatClient::new("http://localhost:8000/api/chat").unwrap();
        assert_eq!(client.idle_timeout(), Some(DEFAULT_IDLE_TIMEOUT));

        let client = client.with_idle_timeout(None);
        assert_eq!(client.idle_timeout(), None);
    }

    #[test]
    fn invalid_endpoint_is_url_error() {
        let err = ChatClient::new("not a url").unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn http_transport_exposes_cookies() {
        let transport = HttpTransport::new("http://localhost:8000/api/chat").unwrap();
        assert_eq!(transport.cookies(), None);

        transport.add_cookie("session=abc123; Path=/");
        let cookies = transport.cookies().unwrap();
        assert!(cookies.contains("session=abc123"));
    }
}
