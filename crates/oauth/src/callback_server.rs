use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    axum::{Router, extract::RawQuery, response::Html, routing::get},
    tokio::{net::TcpListener, sync::oneshot},
    tracing::{debug, info, warn},
    url::Url,
};

use crate::{
    Error, Result,
    return_params::{ReturnParams, strip_return_params},
};

/// One-shot local listener on the configured callback location.
///
/// The provider (or the backend on its behalf) redirects the browser here
/// once the handshake completes; the first GET on the callback path is
/// answered with a short page and its full URL handed back to the caller.
pub struct CallbackServer {
    listener: TcpListener,
    callback_url: Url,
}

impl CallbackServer {
    /// Bind the host and port named by `callback_url`.
    pub async fn bind(callback_url: &Url) -> Result<Self> {
        if callback_url.scheme() != "http" {
            return Err(Error::invalid_callback_url(
                callback_url,
                "only plain http callbacks can be served locally",
            ));
        }
        let host = callback_url
            .host_str()
            .ok_or_else(|| Error::invalid_callback_url(callback_url, "missing host"))?;
        let port = callback_url.port_or_known_default().unwrap_or(80);

        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|source| Error::Bind {
                addr: format!("{host}:{port}"),
                source,
            })?;

        let mut callback_url = callback_url.clone();
        let bound = listener.local_addr()?;
        if callback_url.port_or_known_default() != Some(bound.port()) {
            // Port 0 was requested; report the one the OS picked.
            let _ = callback_url.set_port(Some(bound.port()));
        }
        debug!(addr = %bound, path = callback_url.path(), "callback listener bound");

        Ok(Self {
            listener,
            callback_url,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Callback location as served, with the effective port.
    pub fn callback_url(&self) -> &Url {
        &self.callback_url
    }

    /// Serve until the first redirect lands, then shut down and return the
    /// observed location (callback URL plus the query the browser carried).
    pub async fn wait(self, timeout: Duration) -> Result<Url> {
        let (tx, rx) = oneshot::channel::<Option<String>>();
        let tx = Arc::new(Mutex::new(Some(tx)));

        let app = Router::new().route(
            self.callback_url.path(),
            get(move |RawQuery(query): RawQuery| {
                let tx = tx.lock().unwrap_or_else(|e| e.into_inner()).take();
                async move {
                    let page = landing_page(query.as_deref());
                    if let Some(tx) = tx {
                        let _ = tx.send(query);
                    }
                    Html(page)
                }
            }),
        );

        let server = axum::serve(self.listener, app);
        let mut observed = self.callback_url;

        tokio::select! {
            query = rx => {
                let query = query.map_err(|_| Error::ServerExited)?;
                observed.set_query(query.as_deref());
                info!(url = %strip_return_params(&observed), "authorization redirect received");
                Ok(observed)
            }
            _ = server.into_future() => {
                warn!("callback server exited unexpectedly");
                Err(Error::ServerExited)
            }
            _ = tokio::time::sleep(timeout) => {
                warn!(timeout_secs = timeout.as_secs(), "authorization callback timed out");
                Err(Error::TimedOut(timeout))
            }
        }
    }

    /// Bind and wait in one step.
    pub async fn wait_for_return(callback_url: &Url, timeout: Duration) -> Result<Url> {
        Self::bind(callback_url).await?.wait(timeout).await
    }
}

fn landing_page(query: Option<&str>) -> String {
    let mut url = Url::parse("http://callback.invalid/").ok();
    if let Some(url) = url.as_mut() {
        url.set_query(query);
    }
    let params = url
        .as_ref()
        .map(ReturnParams::from_url)
        .unwrap_or(ReturnParams::Absent);

    match params {
        ReturnParams::Failure { message } => format!(
            "<h1>Authorization failed</h1><p>{}</p><p>You can close this window.</p>",
            escape_html(&message)
        ),
        _ => "<h1>Authorization received</h1><p>You can close this window and return to the terminal.</p>"
            .to_string(),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
