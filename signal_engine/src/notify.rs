/// notify.rs — Telegram Bot API notifications and command polling
///
///   POST /bot<token>/sendMessage   {chat_id, text}     one call per recipient
///   GET  /bot<token>/getUpdates?offset=<cursor>        short poll, no timeout
///
/// Delivery is best-effort: a failing recipient is logged and skipped.
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use tracing::{error, info, warn};

/// One inbound update.  The cursor must advance past every update, including
/// ones without a chat or text.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub update_id: i64,
    pub chat_id:   Option<i64>,
    pub text:      Option<String>,
}

/// Commands understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Statistics,
}

impl Command {
    /// Case-insensitive; accepts `/statistics`, `statistics` and
    /// `/statistics@SomeBot`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        let head = text.split('@').next().unwrap_or_default();
        match head {
            "/statistics" | "statistics" => Some(Command::Statistics),
            _ => None,
        }
    }
}

/// Outbound text channel plus its inbound command feed.
pub trait Notifier {
    /// Send `text` to every recipient; resolves to the number delivered.
    fn send_message(&self, text: &str) -> impl Future<Output = usize>;

    /// Updates with `update_id >= offset`, oldest first.
    fn poll_updates(&self, offset: i64) -> impl Future<Output = Result<Vec<InboundMessage>>>;
}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct UpdatesResponse {
    ok:          bool,
    #[serde(default)]
    result:      Vec<Update>,
    description: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Update {
    update_id: i64,
    message:   Option<Message>,
}

#[derive(Deserialize, Debug)]
struct Message {
    chat: Option<Chat>,
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Chat {
    id: i64,
}

#[derive(Deserialize, Debug)]
pub struct TelegramError {
    pub error_code:  i64,
    pub description: String,
}

// ── Telegram client ───────────────────────────────────────────────────────

pub struct TelegramNotifier {
    client:   Client,
    base_url: String,
    chat_ids: Vec<String>,
}

impl TelegramNotifier {
    pub fn new(api_url: &str, bot_token: &str, chat_ids: Vec<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("HTTP client build failed");
        Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), bot_token),
            chat_ids,
        }
    }

    async fn send_to(&self, chat_id: &str, text: &str) -> Result<()> {
        let resp = self.client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .context("HTTP POST to sendMessage failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            match serde_json::from_str::<TelegramError>(&body) {
                Ok(e) => anyhow::bail!("Telegram error {}: {}", e.error_code, e.description),
                Err(_) => anyhow::bail!("HTTP {} — body: {}", status, body),
            }
        }
        info!("Telegram to {}: {}", chat_id, status);
        Ok(())
    }
}

impl Notifier for TelegramNotifier {
    async fn send_message(&self, text: &str) -> usize {
        let mut delivered = 0;
        for chat_id in &self.chat_ids {
            match self.send_to(chat_id, text).await {
                Ok(()) => delivered += 1,
                Err(e) => error!("Telegram delivery to {} failed: {e:#}", chat_id),
            }
        }
        if delivered < self.chat_ids.len() {
            warn!("Message delivered to {}/{} recipients", delivered, self.chat_ids.len());
        }
        delivered
    }

    async fn poll_updates(&self, offset: i64) -> Result<Vec<InboundMessage>> {
        let resp = self.client
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[("offset", offset)])
            .send()
            .await
            .context("HTTP GET to getUpdates failed")?;

        let body = resp.text().await.context("Failed to read getUpdates body")?;
        parse_updates(&body)
    }
}

/// Parse a `getUpdates` body.
pub fn parse_updates(body: &str) -> Result<Vec<InboundMessage>> {
    let resp: UpdatesResponse =
        serde_json::from_str(body).context("Failed to parse getUpdates response")?;
    if !resp.ok {
        anyhow::bail!(
            "getUpdates rejected: {}",
            resp.description.unwrap_or_else(|| "no description".into())
        );
    }
    Ok(resp
        .result
        .into_iter()
        .map(|u| {
            let (chat_id, text) = match u.message {
                Some(m) => (m.chat.map(|c| c.id), m.text),
                None => (None, None),
            };
            InboundMessage { update_id: u.update_id, chat_id, text }
        })
        .collect())
}
