//! Loopback HTTP server that receives the provider's redirect
//!
//! The first request to the redirect path is parsed into
//! [`CallbackParams`] and handed to whoever is waiting on
//! [`CallbackServer::wait`]. Later requests get an informational page.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{RawQuery, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use gcal_core::CallbackParams;
use gcal_domain::{AuthError, AuthResult};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use url::Url;

const SUCCESS_PAGE: &str = "<!doctype html><html><body>\
<h1>Authorization complete</h1><p>You can close this window.</p></body></html>";
const FAILURE_PAGE: &str = "<!doctype html><html><body>\
<h1>Authorization failed</h1><p>Return to the application for details.</p></body></html>";
const DUPLICATE_PAGE: &str = "<!doctype html><html><body>\
<h1>Already handled</h1><p>This login has already received its callback.</p></body></html>";

type PendingSender = Arc<Mutex<Option<oneshot::Sender<CallbackParams>>>>;

/// Single-shot loopback callback server.
pub struct CallbackServer {
    host: String,
    local_addr: SocketAddr,
    path: String,
    receiver: Option<oneshot::Receiver<CallbackParams>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Bind to the host, port and path of `redirect_uri`.
    ///
    /// Port `0`, or no port, binds an ephemeral port; use
    /// [`CallbackServer::redirect_uri`] for the address actually served.
    ///
    /// # Errors
    /// [`AuthError::Config`] if the URI is not a plain-http loopback URL,
    /// [`AuthError::Internal`] if the socket cannot be bound.
    pub async fn start(redirect_uri: &str) -> AuthResult<Self> {
        let url = Url::parse(redirect_uri)
            .map_err(|err| AuthError::Config(format!("invalid redirect_uri: {err}")))?;
        if url.scheme() != "http" {
            return Err(AuthError::Config("loopback redirect_uri must use http".into()));
        }
        let host = url
            .host_str()
            .ok_or_else(|| AuthError::Config("redirect_uri has no host".into()))?
            .to_string();
        let ip = loopback_ip(&host)?;
        let addr = SocketAddr::new(ip, url.port().unwrap_or(0));

        let listener = TcpListener::bind(addr).await.map_err(|err| {
            AuthError::Internal(format!("failed to bind callback server on {addr}: {err}"))
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|err| AuthError::Internal(format!("failed to determine port: {err}")))?;

        let (tx, rx) = oneshot::channel();
        let pending: PendingSender = Arc::new(Mutex::new(Some(tx)));
        let path = url.path().to_string();
        let app = Router::new().route(&path, get(handle_callback)).with_state(pending);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!(error = %err, "callback server error");
            }
        });

        info!(%local_addr, %path, "callback server listening");
        Ok(Self {
            host,
            local_addr,
            path,
            receiver: Some(rx),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Redirect URI served, with the bound port filled in.
    pub fn redirect_uri(&self) -> String {
        format!("http://{}:{}{}", self.host, self.local_addr.port(), self.path)
    }

    /// Await the first callback.
    ///
    /// # Errors
    /// [`AuthError::InvalidCallback`] if nothing arrives within `timeout`
    /// or the callback was already taken.
    pub async fn wait(&mut self, timeout: Duration) -> AuthResult<CallbackParams> {
        let receiver = self
            .receiver
            .as_mut()
            .ok_or_else(|| AuthError::InvalidCallback("callback already received".into()))?;

        let outcome = tokio::time::timeout(timeout, receiver).await;
        self.receiver = None;
        match outcome {
            Ok(Ok(params)) => Ok(params),
            Ok(Err(_)) => Err(AuthError::Internal("callback server stopped".into())),
            Err(_) => Err(AuthError::InvalidCallback(format!(
                "no callback received within {}s",
                timeout.as_secs()
            ))),
        }
    }

    /// Stop serving and wait for the server task to finish.
    pub async fn shutdown(mut self) -> AuthResult<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    return Err(AuthError::Internal(format!("callback server panicked: {err}")));
                }
            }
        }
        debug!("callback server stopped");
        Ok(())
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

fn loopback_ip(host: &str) -> AuthResult<IpAddr> {
    if host.eq_ignore_ascii_case("localhost") {
        return Ok(IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
    let ip: IpAddr = host
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .map_err(|_| AuthError::Config(format!("redirect_uri host {host} is not loopback")))?;
    if !ip.is_loopback() {
        return Err(AuthError::Config(format!("redirect_uri host {host} is not loopback")));
    }
    Ok(ip)
}

async fn handle_callback(
    State(pending): State<PendingSender>,
    RawQuery(query): RawQuery,
) -> Html<&'static str> {
    let params = CallbackParams::from_query(query.as_deref().unwrap_or_default());
    let succeeded = params.code.is_some() && params.error.is_none();

    let Some(tx) = pending.lock().await.take() else {
        debug!("ignoring repeated callback");
        return Html(DUPLICATE_PAGE);
    };
    debug!(has_code = params.code.is_some(), error = ?params.error, "received callback");
    if tx.send(params).is_err() {
        debug!("callback arrived after the waiter gave up");
    }

    Html(if succeeded { SUCCESS_PAGE } else { FAILURE_PAGE })
}
