/// Ollama chat client
///
/// Sends one base64 image per request to the local model server and pulls
/// the reply text out of whatever response shape comes back. Requests are
/// blocking: files are processed strictly one after another.
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use std::error::Error as _;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::ExtractConfig;

/// Longest response body snippet written to the debug log
const DEBUG_SNIPPET_CHARS: usize = 2000;

/// Why a single image produced no keywords
///
/// The `Display` text is what ends up in that image's output row.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The image file could not be read
    #[error("Error: failed to read image: {0}")]
    Read(#[source] std::io::Error),

    /// The server answered with a 4xx/5xx status
    #[error("HTTP Error {status}")]
    Http { status: u16 },

    /// The server could not be reached, or did not answer in time
    #[error("Connection Error: {0}")]
    Connection(String),

    /// The reply contained no usable text
    #[error("[No text extracted]")]
    NoText,

    /// Anything else (unreadable body, invalid JSON, ...)
    #[error("Error: {0}")]
    Other(String),
}

/// Chat request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
}

/// A single user turn carrying the prompt and the image
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
    images: [&'a str; 1],
}

/// Blocking client bound to one model server
#[derive(Debug)]
pub struct ChatClient {
    client: Client,
    url: String,
    model: String,
    prompt: String,
}

impl ChatClient {
    /// Create a client from the extraction settings
    pub fn new(config: &ExtractConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: endpoint_url(&config.base_url, &config.endpoint),
            model: config.model.clone(),
            prompt: config.prompt.clone(),
        })
    }

    /// The full URL requests are posted to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ask the model about one image and return its reply text
    ///
    /// Returns `Ok(None)` when the server answered successfully but none of
    /// the known response shapes carried a text field.
    pub fn describe(&self, image_b64: &str) -> Result<Option<String>, ExtractError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &self.prompt,
                images: [image_b64],
            }],
            stream: false,
        };

        debug!("Request URL: {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(classify_error)?;

        let status = response.status();
        debug!("HTTP Status: {}", status.as_u16());
        for (name, value) in response.headers() {
            debug!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }

        if status.as_u16() >= 400 {
            debug!(
                "HTTP Error {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            );
            match response.bytes() {
                Ok(body) => debug!("Error body:\n{}", pretty_body(&body)),
                Err(err) => debug!("Error body unreadable: {}", err),
            }
            return Err(ExtractError::Http {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(classify_error)?;

        debug!("Response body snippet:\n{}", snippet(&pretty_body(&bytes)));

        let json: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ExtractError::Other(e.to_string()))?;
        Ok(extract_text(&json).map(str::to_string))
    }
}

/// Join a base URL and an endpoint path with exactly one slash between
pub fn endpoint_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// Pull the reply text out of a model response
///
/// Servers differ in where they put the text, so several shapes are tried
/// in order and the first string found wins:
/// 1. `response`
/// 2. `message.content`
/// 3. `choices[0].message.content`, then `choices[0].content`
/// 4. `text`, `output`, `content`
pub fn extract_text(json: &Value) -> Option<&str> {
    let obj = json.as_object()?;

    if let Some(text) = obj.get("response").and_then(Value::as_str) {
        return Some(text);
    }

    if let Some(text) = obj
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
    {
        return Some(text);
    }

    if let Some(first) = obj
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
    {
        if let Some(text) = first
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
        {
            return Some(text);
        }
        if let Some(text) = first.get("content").and_then(Value::as_str) {
            return Some(text);
        }
    }

    ["text", "output", "content"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
}

/// Map a transport error to the diagnostic written for the file
fn classify_error(err: reqwest::Error) -> ExtractError {
    debug!("Request failed: {}", error_chain(&err));
    if err.is_connect() || err.is_timeout() {
        ExtractError::Connection(root_cause(&err))
    } else {
        ExtractError::Other(err.to_string())
    }
}

/// Message of the innermost error in the source chain
fn root_cause(err: &reqwest::Error) -> String {
    let mut current: &dyn std::error::Error = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

/// Every message in the source chain, outermost first
fn error_chain(err: &reqwest::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": caused by: ")
}

/// Pretty-print a body if it is JSON, otherwise show it as lossy UTF-8
fn pretty_body(bytes: &[u8]) -> String {
    serde_json::from_slice::<Value>(bytes)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned())
}

fn snippet(text: &str) -> &str {
    match text.char_indices().nth(DEBUG_SNIPPET_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
