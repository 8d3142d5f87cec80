//! Out-of-process renderer: posts props as JSON to a render server over
//! HTTP/1.1 and reads back the markup.
//!
//! Each render opens a fresh connection with `Connection: close`. Reading
//! stops once `Content-Length` bytes of body are buffered; without that
//! header the body runs to EOF.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::{RenderError, RenderFuture, RenderProps, Rendered, Renderer};
use crate::config::RendererConfig;

/// Maximum number of response headers we accept from the render server.
const MAX_HEADERS: usize = 64;

/// Largest response we buffer from the render server (8 MiB).
const MAX_RESPONSE_SIZE: usize = 8 * 1024 * 1024;

/// Initial read buffer capacity per render.
const INITIAL_BUF_SIZE: usize = 16 * 1024;

/// A [`Renderer`] that delegates to a remote render server.
///
/// # Examples
///
/// ```rust,no_run
/// use fragcache::config::RendererConfig;
/// use fragcache::render::RemoteRenderer;
///
/// let renderer = RemoteRenderer::new(RendererConfig::default());
/// assert_eq!(renderer.addr(), "127.0.0.1:3000");
/// ```
#[derive(Debug, Clone)]
pub struct RemoteRenderer {
    config: RendererConfig,
}

impl RemoteRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn addr(&self) -> &str {
        &self.config.addr
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    async fn exchange(&self, component: &str, props: &RenderProps) -> Result<Rendered, RenderError> {
        let body = serde_json::to_vec(props)?;
        let target = format!("{}/{}", self.config.path_prefix.trim_end_matches('/'), component);

        let mut stream = TcpStream::connect(&self.config.addr)
            .await
            .map_err(|e| RenderError::Connect {
                addr: self.config.addr.clone(),
                source: e,
            })?;

        debug!(addr = %self.config.addr, target = %target, bytes = body.len(), "dispatching render");

        let request_head = format!(
            "POST {target} HTTP/1.1\r\n\
             Host: {host}\r\n\
             Content-Type: application/json\r\n\
             Accept: text/html\r\n\
             Content-Length: {len}\r\n\
             Connection: close\r\n\r\n",
            host = self.config.addr,
            len = body.len(),
        );
        stream.write_all(request_head.as_bytes()).await?;
        stream.write_all(&body).await?;
        stream.flush().await?;

        let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);
        let mut head = None;
        loop {
            if head.is_none() {
                head = parse_head(&buf)?;
            }
            if let Some(ResponseHead {
                body_offset,
                content_length: Some(len),
                ..
            }) = head
            {
                if buf.len() >= body_offset + len {
                    break;
                }
            }
            if buf.len() > MAX_RESPONSE_SIZE {
                return Err(RenderError::TooLarge {
                    max_bytes: MAX_RESPONSE_SIZE,
                });
            }
            if stream.read_buf(&mut buf).await? == 0 {
                break;
            }
        }

        let head = head.ok_or(RenderError::Incomplete)?;
        let markup = read_body(component, &head, &buf)?;
        Ok(Rendered::from_markup(markup))
    }
}

impl Renderer for RemoteRenderer {
    fn render<'a>(&'a self, component: &'a str, props: &'a RenderProps) -> RenderFuture<'a> {
        Box::pin(async move {
            let after = self.timeout();
            match tokio::time::timeout(after, self.exchange(component, props)).await {
                Ok(result) => result,
                Err(_) => Err(RenderError::Timeout {
                    component: component.to_owned(),
                    after,
                }),
            }
        })
    }
}

// Status line and framing of a render server response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResponseHead {
    status: u16,
    body_offset: usize,
    content_length: Option<usize>,
}

// Parse the response head once it is fully buffered; `None` while partial.
fn parse_head(buf: &[u8]) -> Result<Option<ResponseHead>, RenderError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut response = httparse::Response::new(&mut headers);

    let body_offset = match response.parse(buf)? {
        httparse::Status::Complete(offset) => offset,
        httparse::Status::Partial => return Ok(None),
    };
    let status = response.code.ok_or(RenderError::Incomplete)?;

    let mut content_length = None;
    for header in response.headers.iter() {
        if header.name.eq_ignore_ascii_case("transfer-encoding") {
            let value = String::from_utf8_lossy(header.value).into_owned();
            if !value.eq_ignore_ascii_case("identity") {
                return Err(RenderError::UnsupportedEncoding(value));
            }
        } else if header.name.eq_ignore_ascii_case("content-length") {
            let value = String::from_utf8_lossy(header.value).trim().to_owned();
            let len = value
                .parse::<usize>()
                .map_err(|_| RenderError::InvalidContentLength(value))?;
            if len > MAX_RESPONSE_SIZE {
                return Err(RenderError::TooLarge {
                    max_bytes: MAX_RESPONSE_SIZE,
                });
            }
            content_length = Some(len);
        }
    }

    Ok(Some(ResponseHead {
        status,
        body_offset,
        content_length,
    }))
}

// Extract the body of a complete 2xx response.
fn read_body(component: &str, head: &ResponseHead, buf: &[u8]) -> Result<String, RenderError> {
    if !(200..300).contains(&head.status) {
        return Err(RenderError::Status {
            component: component.to_owned(),
            status: head.status,
        });
    }

    let body = &buf[head.body_offset..];
    let body = match head.content_length {
        Some(len) if body.len() < len => return Err(RenderError::Incomplete),
        Some(len) => &body[..len],
        None => body,
    };

    Ok(String::from_utf8(body.to_vec())?)
}
