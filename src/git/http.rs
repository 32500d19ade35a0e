//! Smart HTTP transport for git, backed by reqwest.
//!
//! Registered for the `http` and `https` schemes so clone traffic follows the
//! same proxy resolution as API requests, SOCKS5 included. libgit2's built-in
//! http transport only tunnels https through HTTP CONNECT.

use crate::error::{OrgCloneError, Result};
use crate::git::GitAuth;
use crate::transport::HttpTransport;
use git2::Remote;
use git2::transport::{Service, SmartSubtransport, SmartSubtransportStream, Transport};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, OnceLock};

const GIT_USER_AGENT: &str = "git/2.0 (github-org-clone)";

thread_local! {
    static ACTIVE: RefCell<Option<HttpContext>> = const { RefCell::new(None) };
}

#[derive(Clone)]
struct HttpContext {
    client: Client,
    auth: GitAuth,
}

/// Install the reqwest transport for `http://` and `https://` remotes.
///
/// Registration is process-wide and happens once; later calls return the
/// outcome of the first.
pub fn register_http_transport() -> Result<()> {
    static REGISTERED: OnceLock<std::result::Result<(), String>> = OnceLock::new();

    REGISTERED
        .get_or_init(|| {
            // SAFETY: guarded by the OnceLock, and every clone in this crate
            // waits on it before libgit2 looks up a transport.
            let registered = unsafe {
                git2::transport::register("http", factory)
                    .and_then(|()| git2::transport::register("https", factory))
            };
            registered.map_err(|e| e.to_string())
        })
        .clone()
        .map_err(|message| OrgCloneError::Git(git2::Error::from_str(&message)))
}

/// Makes `client` and `auth` the transport for git operations on this thread
/// until dropped.
pub(crate) struct ActiveTransport {
    previous: Option<HttpContext>,
}

impl ActiveTransport {
    pub(crate) fn enter(client: Client, auth: GitAuth) -> Self {
        let previous = ACTIVE.with(|active| active.replace(Some(HttpContext { client, auth })));
        Self { previous }
    }
}

impl Drop for ActiveTransport {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ACTIVE.with(|active| *active.borrow_mut() = previous);
    }
}

fn factory(remote: &Remote<'_>) -> std::result::Result<Transport, git2::Error> {
    let context = match ACTIVE.with(|active| active.borrow().clone()) {
        Some(context) => context,
        None => HttpContext {
            client: HttpTransport::direct()
                .git_http_client()
                .map_err(|e| git2::Error::from_str(&e.to_string()))?,
            auth: GitAuth::None,
        },
    };

    Transport::smart(
        remote,
        true,
        ReqwestSubtransport {
            context,
            base_url: Arc::new(Mutex::new(String::new())),
        },
    )
}

/// One smart-protocol request: the ref advertisement or a pack exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ServiceRequest {
    service: &'static str,
    advertisement: bool,
}

impl ServiceRequest {
    fn for_action(action: Service) -> Self {
        let (service, advertisement) = match action {
            Service::UploadPackLs => ("git-upload-pack", true),
            Service::UploadPack => ("git-upload-pack", false),
            Service::ReceivePackLs => ("git-receive-pack", true),
            Service::ReceivePack => ("git-receive-pack", false),
        };
        Self {
            service,
            advertisement,
        }
    }

    fn suffix(&self) -> String {
        if self.advertisement {
            format!("/info/refs?service={}", self.service)
        } else {
            format!("/{}", self.service)
        }
    }

    fn url(&self, base: &str) -> String {
        format!("{}{}", base, self.suffix())
    }

    fn accept(&self) -> String {
        if self.advertisement {
            "*/*".into()
        } else {
            format!("application/x-{}-result", self.service)
        }
    }

    fn content_type(&self) -> Option<String> {
        (!self.advertisement).then(|| format!("application/x-{}-request", self.service))
    }

    fn advertisement_type(&self) -> String {
        format!("application/x-{}-advertisement", self.service)
    }
}

struct ReqwestSubtransport {
    context: HttpContext,
    /// Repository URL, updated when the advertisement was redirected.
    base_url: Arc<Mutex<String>>,
}

impl SmartSubtransport for ReqwestSubtransport {
    fn action(
        &self,
        url: &str,
        action: Service,
    ) -> std::result::Result<Box<dyn SmartSubtransportStream>, git2::Error> {
        let mut base_url = self
            .base_url
            .lock()
            .map_err(|_| git2::Error::from_str("git http transport state poisoned"))?;
        if base_url.is_empty() {
            *base_url = url.trim_end_matches('/').to_string();
        }

        let request = ServiceRequest::for_action(action);
        Ok(Box::new(HttpStream {
            context: self.context.clone(),
            base_url: Arc::clone(&self.base_url),
            url: request.url(&base_url),
            request,
            body: Vec::new(),
            response: None,
        }))
    }

    fn close(&self) -> std::result::Result<(), git2::Error> {
        Ok(())
    }
}

/// Buffers the request body until the first read, then streams the response.
struct HttpStream {
    context: HttpContext,
    base_url: Arc<Mutex<String>>,
    url: String,
    request: ServiceRequest,
    body: Vec<u8>,
    response: Option<Response>,
}

impl HttpStream {
    fn send(&mut self) -> io::Result<Response> {
        let builder = if self.request.advertisement {
            self.context.client.get(&self.url)
        } else {
            self.context
                .client
                .post(&self.url)
                .body(std::mem::take(&mut self.body))
        };

        let mut builder = builder
            .header(USER_AGENT, GIT_USER_AGENT)
            .header(ACCEPT, self.request.accept());
        if let Some(content_type) = self.request.content_type() {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let GitAuth::Basic { username, password } = &self.context.auth {
            builder = builder.basic_auth(username, Some(password));
        }

        tracing::debug!(url = %self.url, "git http request");
        let response = builder.send().map_err(io::Error::other)?;

        let status = response.status();
        if !status.is_success() {
            return Err(io::Error::other(format!(
                "HTTP {} for {}",
                status, self.url
            )));
        }

        if self.request.advertisement {
            let expected = self.request.advertisement_type();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();
            if content_type != expected {
                return Err(io::Error::other(format!(
                    "{} did not answer with the smart http protocol (content type '{}')",
                    self.url, content_type
                )));
            }

            if let Some(base) = response.url().as_str().strip_suffix(&self.request.suffix()) {
                if let Ok(mut base_url) = self.base_url.lock() {
                    *base_url = base.to_string();
                }
            }
        }

        Ok(response)
    }
}

impl Read for HttpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.response.is_none() {
            self.response = Some(self.send()?);
        }
        match self.response.as_mut() {
            Some(response) => response.read(buf),
            None => Ok(0),
        }
    }
}

impl Write for HttpStream {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.response.is_some() {
            return Err(io::Error::other("request already sent"));
        }
        self.body.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
