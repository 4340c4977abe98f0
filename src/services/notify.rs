// src/services/notify.rs

//! Webhook notification service.
//!
//! Formats an incident into the Slack-compatible payload the channel expects
//! and delivers it with a single POST. Delivery is best-effort and carries no
//! internal retry; the caller decides what a failure means for dedup state.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Incident;

/// Result of a notification attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The webhook accepted the message.
    Posted,
    /// No webhook is configured; the alert exists only in the log.
    Disabled,
}

/// Sink for formatted incident alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an alert for one incident.
    async fn notify(&self, incident: &Incident) -> Result<NotifyOutcome>;
}

/// Notifier that posts Slack-compatible messages to a webhook URL.
pub struct WebhookNotifier {
    client: Client,
    webhook_url: Option<Url>,
}

impl WebhookNotifier {
    /// Create a notifier. A `None` URL selects log-only mode.
    pub fn new(client: Client, webhook_url: Option<&str>) -> Result<Self> {
        let webhook_url = webhook_url
            .map(Url::parse)
            .transpose()
            .map_err(|e| AppError::config(format!("Invalid webhook URL: {e}")))?;
        Ok(Self {
            client,
            webhook_url,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Post a connection-test message to the webhook.
    ///
    /// Unlike `notify`, an unconfigured webhook is an error here: the whole
    /// point of the test is to prove the channel works.
    pub async fn post_test_message(&self) -> Result<()> {
        let Some(url) = &self.webhook_url else {
            return Err(AppError::config(
                "No webhook URL configured; set notify.webhook_url or WEBHOOK_URL",
            ));
        };
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        self.post(url, &test_payload(&now.to_string())).await
    }

    async fn post(&self, url: &Url, payload: &Value) -> Result<()> {
        let response = self
            .client
            .post(url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::delivery(None, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::delivery(
                Some(status.as_u16()),
                format!("HTTP {}: {}", status.as_u16(), body.trim()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, incident: &Incident) -> Result<NotifyOutcome> {
        let Some(url) = &self.webhook_url else {
            return Ok(NotifyOutcome::Disabled);
        };
        self.post(url, &alert_payload(incident)).await?;
        log::info!("Posted alert for incident {}", incident.id);
        Ok(NotifyOutcome::Posted)
    }
}

/// Google Maps search link for an incident location.
fn maps_link(location: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("api", "1")
        .append_pair("query", location)
        .finish();
    format!("https://www.google.com/maps/search/?{query}")
}

/// Build the alert message for one incident.
fn alert_payload(incident: &Incident) -> Value {
    let id = incident.id.as_str();
    let call_type = field_or_na(&incident.call_type);
    let location = field_or_na(&incident.location);
    let district = field_or_na(&incident.district);

    // Prefer a normalized timestamp, fall back to the raw feed text.
    let time = incident
        .occurred_at()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .or_else(|| incident.time.clone())
        .unwrap_or_else(|| "N/A".to_string());

    let mut body = format!(
        "*🚨 New Active Call*\n\n\
         *Incident:* {id}\n\
         *Type:* {call_type}\n\
         *Time:* {time}\n\
         *Location:* {location}\n\
         *District:* {district}"
    );
    if let Some(status) = &incident.status {
        body.push_str(&format!("\n*Status:* {status}"));
    }

    json!({
        "text": format!("🚨 New active call: {id}"),
        "blocks": [
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": body },
            },
            {
                "type": "actions",
                "elements": [{
                    "type": "button",
                    "text": { "type": "plain_text", "text": "View on Maps" },
                    "url": maps_link(location),
                    "style": "primary",
                }],
            },
        ],
    })
}

fn test_payload(now: &str) -> Value {
    json!({
        "text": "🔧 callwatch connection test",
        "blocks": [{
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(
                    "*🔧 callwatch connection test*\n\n*Status:* running\n*Time:* {now}\n\n\
                     The watcher can post to this channel."
                ),
            },
        }],
    })
}

fn field_or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("N/A")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_incident() -> Incident {
        Incident {
            id: "2024-001".to_string(),
            time: Some("5/20/2024 10:12:30 PM".to_string()),
            call_type: Some("Disturbance".to_string()),
            location: Some("MILLS AVE & MAGNOLIA".to_string()),
            district: Some("C1".to_string()),
            status: None,
        }
    }

    #[test]
    fn maps_link_encodes_query() {
        let link = maps_link("MILLS AVE & MAGNOLIA");
        assert!(link.starts_with("https://www.google.com/maps/search/?"));
        assert!(link.contains("api=1"));
        // The ampersand in the location must not terminate the query.
        assert!(link.contains("%26"));
        assert!(!link.contains("query=MILLS AVE"));
    }

    #[test]
    fn alert_payload_carries_all_fields() {
        let payload = alert_payload(&sample_incident());
        assert_eq!(payload["text"], "🚨 New active call: 2024-001");

        let section = payload["blocks"][0]["text"]["text"].as_str().unwrap();
        assert!(section.contains("*Incident:* 2024-001"));
        assert!(section.contains("*Type:* Disturbance"));
        assert!(section.contains("*Time:* 2024-05-20 22:12:30"));
        assert!(section.contains("*Location:* MILLS AVE & MAGNOLIA"));
        assert!(section.contains("*District:* C1"));

        let button = &payload["blocks"][1]["elements"][0];
        assert_eq!(button["text"]["text"], "View on Maps");
        assert!(button["url"].as_str().unwrap().contains("google.com/maps"));
    }

    #[test]
    fn alert_payload_degrades_missing_fields() {
        let incident = Incident {
            id: "2024-002".to_string(),
            time: None,
            call_type: None,
            location: None,
            district: None,
            status: None,
        };
        let section = alert_payload(&incident)["blocks"][0]["text"]["text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(section.contains("*Type:* N/A"));
        assert!(section.contains("*Time:* N/A"));
        assert!(section.contains("*Location:* N/A"));
    }

    #[test]
    fn alert_payload_falls_back_to_raw_time() {
        let incident = Incident {
            time: Some("around noon".to_string()),
            ..sample_incident()
        };
        let section = alert_payload(&incident)["blocks"][0]["text"]["text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(section.contains("*Time:* around noon"));
    }

    #[test]
    fn status_line_appears_when_present() {
        let incident = Incident {
            status: Some("DISPATCHED".to_string()),
            ..sample_incident()
        };
        let section = alert_payload(&incident)["blocks"][0]["text"]["text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(section.contains("*Status:* DISPATCHED"));
    }

    #[tokio::test]
    async fn unconfigured_webhook_reports_disabled() {
        let notifier = WebhookNotifier::new(Client::new(), None).unwrap();
        assert!(!notifier.is_configured());
        let outcome = notifier.notify(&sample_incident()).await.unwrap();
        assert_eq!(outcome, NotifyOutcome::Disabled);
    }

    #[tokio::test]
    async fn unconfigured_webhook_fails_the_connection_test() {
        let notifier = WebhookNotifier::new(Client::new(), None).unwrap();
        assert!(matches!(
            notifier.post_test_message().await,
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn invalid_webhook_url_is_a_config_error() {
        let result = WebhookNotifier::new(Client::new(), Some("not a url"));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
