use anyhow::{Context, Result};
use log::{info, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::context::RunContext;

/// Body of the webhook POST. Discord reads the `content` field.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WebhookPayload {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// No webhook configured; nothing was sent
    Skipped,
    Delivered { status: u16 },
    Rejected { status: u16 },
    Failed { reason: String },
}

/// Sends a payload to a webhook and reports the HTTP status.
pub trait Notifier {
    fn post(&mut self, url: &str, payload: &WebhookPayload) -> Result<u16>;
}

#[derive(Debug, Clone, Default)]
pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    pub fn new() -> WebhookNotifier {
        WebhookNotifier {
            client: Client::new(),
        }
    }
}

impl Notifier for WebhookNotifier {
    fn post(&mut self, url: &str, payload: &WebhookPayload) -> Result<u16> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .context("Failed to send webhook request")?;
        Ok(response.status().as_u16())
    }
}

pub fn update_message(ctx: &RunContext) -> String {
    format!(
        "[autorace] {} race list updated: {}",
        ctx.date,
        ctx.repo_relative_path().display()
    )
}

/// Best-effort notification. Never fails; the outcome is only reported.
pub fn notify(
    notifier: &mut dyn Notifier,
    webhook_url: Option<&str>,
    message: &str,
) -> NotifyOutcome {
    let Some(url) = webhook_url.filter(|url| !url.is_empty()) else {
        info!("No webhook configured, skipping notification");
        return NotifyOutcome::Skipped;
    };

    let payload = WebhookPayload {
        content: message.to_string(),
    };
    match notifier.post(url, &payload) {
        Ok(status) if (200..300).contains(&status) => {
            info!("Notified webhook ({})", status);
            NotifyOutcome::Delivered { status }
        }
        Ok(status) => {
            warn!("Webhook answered {}, ignoring", status);
            NotifyOutcome::Rejected { status }
        }
        Err(e) => {
            warn!("Webhook notification failed, ignoring: {:#}", e);
            NotifyOutcome::Failed {
                reason: format!("{:#}", e),
            }
        }
    }
}
