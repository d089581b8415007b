//! CLI subcommands for the channel lifecycle.

use std::{
    io::Write,
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    anyhow::{Result, anyhow},
    async_trait::async_trait,
    pagelink_channels::{
        AutoConfirm, CallbackReconciler, ChannelController, Confirm, DisconnectOutcome,
        MemoryNavigator, Navigator, StatusKind, ViewState,
    },
    pagelink_client::{Channel, Page},
    pagelink_oauth::CallbackServer,
    tracing::{info, warn},
    url::Url,
};

use crate::context::Context;

/// Terminal stand-in for the browser location: the provider page is opened
/// in the system browser and the return location is whatever the callback
/// listener observed.
struct TerminalNavigator {
    location: Mutex<Url>,
    last_redirect: Mutex<Option<Url>>,
    open_browser: bool,
}

impl TerminalNavigator {
    fn new(location: Url, open_browser: bool) -> Self {
        Self {
            location: Mutex::new(location),
            last_redirect: Mutex::new(None),
            open_browser,
        }
    }

    fn last_redirect(&self) -> Option<Url> {
        self.last_redirect
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Navigator for TerminalNavigator {
    fn current(&self) -> Url {
        self.location
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn replace(&self, url: Url) {
        *self.location.lock().unwrap_or_else(|e| e.into_inner()) = url;
    }

    fn redirect(&self, url: &Url) -> pagelink_channels::Result<()> {
        *self.last_redirect.lock().unwrap_or_else(|e| e.into_inner()) = Some(url.clone());
        if self.open_browser {
            println!("Opening browser for authorization...");
            if open::that(url.as_str()).is_err() {
                println!("Could not open browser. Please visit:\n{url}");
            }
        } else {
            println!("Visit this URL to authorize:\n{url}");
        }
        Ok(())
    }
}

struct TerminalConfirm;

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        match tokio::task::spawn_blocking(move || prompt_yes_no(&prompt, false)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!(error = %e, "confirmation prompt failed");
                false
            },
            Err(e) => {
                warn!(error = %e, "confirmation prompt panicked");
                false
            },
        }
    }
}

fn prompt_line(prompt: &str, default: &str) -> Result<String> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{prompt}: ")?;
    stdout.flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(default.to_string());
    }
    Ok(trimmed.to_string())
}

fn prompt_yes_no(prompt: &str, default_yes: bool) -> Result<bool> {
    loop {
        let (hint, default) = if default_yes {
            ("Y/n", "y")
        } else {
            ("y/N", "n")
        };
        let answer = prompt_line(&format!("{prompt} [{hint}]"), default)?;
        match answer.to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("Please answer with 'y' or 'n'."),
        }
    }
}

/// Controller for one command invocation, with the view location parked on
/// the configured callback URL.
fn view(ctx: &Context) -> Result<ChannelController> {
    let navigator = Arc::new(MemoryNavigator::new(ctx.callback_url()?));
    Ok(ctx.controller(navigator))
}

/// Print the active status message and turn a controller error into the
/// command's error.
fn report<T>(controller: &ChannelController, result: pagelink_channels::Result<T>) -> Result<T> {
    if let Some(status) = controller.status() {
        match status.kind {
            StatusKind::Success => println!("{}", status.text),
            StatusKind::Error => eprintln!("{}", status.text),
        }
    }
    result.map_err(anyhow::Error::from)
}

pub async fn list_pages(ctx: &Context) -> Result<()> {
    let controller = view(ctx)?;
    let result = controller.load_all().await;
    let state = controller.snapshot();
    report(&controller, result)?;

    if state.pages.is_empty() {
        println!("No pages available. Run `pagelink login` to authorize.");
    }
    for page in &state.pages {
        println!("{}", page_line(page, &state));
    }
    Ok(())
}

pub async fn list_channels(ctx: &Context) -> Result<()> {
    let controller = view(ctx)?;
    let result = controller.load_channels().await;
    let state = controller.snapshot();
    report(&controller, result)?;

    if state.channels.is_empty() {
        println!("No connected channels.");
    }
    for channel in &state.channels {
        println!("{}", channel_line(channel));
    }
    Ok(())
}

pub async fn connect(ctx: &Context, page_id: &str) -> Result<()> {
    let controller = view(ctx)?;
    report(&controller, controller.load_pages().await)?;
    let result = controller.connect(page_id).await;
    report(&controller, result)
}

pub async fn disconnect(ctx: &Context, page_id: &str, yes: bool) -> Result<()> {
    let controller = view(ctx)?;
    report(&controller, controller.load_all().await)?;

    let result = if yes {
        controller.disconnect(page_id, &AutoConfirm).await
    } else {
        controller.disconnect(page_id, &TerminalConfirm).await
    };
    if let Ok(DisconnectOutcome::Declined) = result {
        println!("Aborted. Nothing was changed.");
    }
    report(&controller, result).map(|_| ())
}

pub async fn auto_reply(ctx: &Context, channel_id: i64, text: &str) -> Result<()> {
    let controller = view(ctx)?;
    report(&controller, controller.load_channels().await)?;
    let result = controller.save_auto_reply(channel_id, text).await;
    report(&controller, result)
}

/// Run the authorization handshake end to end: listen on the callback URL,
/// send the operator to the provider, then reconcile whatever comes back.
pub async fn login(ctx: &Context, no_browser: bool, timeout: Duration) -> Result<()> {
    let callback_url = ctx.callback_url()?;
    let server = CallbackServer::bind(&callback_url).await?;
    let navigator = Arc::new(TerminalNavigator::new(
        server.callback_url().clone(),
        !no_browser,
    ));
    let controller = ctx.controller(Arc::clone(&navigator) as Arc<dyn Navigator>);

    report(&controller, controller.start_authorization().await)?;
    if let Some(login_url) = navigator.last_redirect()
        && !app_id_matches(&ctx.config.meta.app_id, &login_url)
    {
        warn!(expected = %ctx.config.meta.app_id, "login url targets a different app");
        eprintln!(
            "Note: the login URL does not target the configured app id {}; check meta.app_id.",
            ctx.config.meta.app_id
        );
    }

    println!(
        "Waiting for authorization callback on {} ...",
        server.callback_url()
    );
    let observed = server.wait(timeout).await?;
    navigator.replace(observed);

    let result = CallbackReconciler::new(&controller).reconcile().await;
    let state = controller.snapshot();
    report(&controller, result)?;

    info!(pages = state.pages.len(), "authorization reconciled");
    for page in &state.pages {
        println!("{}", page_line(page, &state));
    }
    Ok(())
}

/// Whether the login URL targets the configured provider application. An
/// unset app id or a URL without `client_id` is not a mismatch.
fn app_id_matches(app_id: &str, login_url: &Url) -> bool {
    if app_id.is_empty() {
        return true;
    }
    login_url
        .query_pairs()
        .find(|(k, _)| k == "client_id")
        .is_none_or(|(_, client_id)| client_id == app_id)
}

fn page_line(page: &Page, state: &ViewState) -> String {
    let handle = page
        .messaging_account
        .as_ref()
        .and_then(|a| a.handle.as_deref())
        .map(|h| format!("@{h}"))
        .unwrap_or_else(|| "-".into());
    let marker = if state.flags.is_connecting(&page.id) {
        "working"
    } else if page.connected {
        "connected"
    } else if page.can_connect() {
        "can connect"
    } else {
        "no messaging account"
    };
    format!("  {:<20} {:<30} {:<20} [{marker}]", page.id, page.name, handle)
}

fn channel_line(channel: &Channel) -> String {
    let reply = channel
        .auto_reply
        .as_deref()
        .filter(|r| !r.is_empty())
        .map(|r| format!("\"{r}\""))
        .unwrap_or_else(|| "(no auto-reply)".into());
    format!(
        "  {:<6} {:<30} @{:<20} {} {}",
        channel.id,
        channel.page_name,
        channel.account_handle,
        channel.connected_at.format("%Y-%m-%d"),
        reply
    )
}

pub fn parse_timeout(secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(anyhow!("--timeout must be at least one second"));
    }
    Ok(Duration::from_secs(secs))
}
