//! Reviewer notification.
//!
//! When a learner submits a module for review, someone has to hear about
//! it. Delivery is best-effort: a failed notification never fails the
//! submission itself.

use traverse_core::{ModuleId, PathwayId, UserId};
use super::Result;

/// Channel for sending review notifications.
#[derive(Debug, Clone)]
pub enum NotificationChannel {
    /// Generic webhook
    Webhook {
        /// Endpoint receiving a JSON payload
        url: String,
    },

    /// Console logging (for testing)
    Console,
}

/// Sends review-request notifications to the reviewing staff.
pub struct ReviewNotifier {
    channel: NotificationChannel,
    client: reqwest::Client,
}

impl ReviewNotifier {
    /// Create a notifier for a channel.
    pub fn new(channel: NotificationChannel) -> Self {
        Self {
            channel,
            client: reqwest::Client::new(),
        }
    }

    /// Announce that a module awaits review.
    pub async fn review_requested(
        &self,
        user_id: UserId,
        pathway_id: &PathwayId,
        module_id: &ModuleId,
    ) -> Result<()> {
        let message = format!(
            "Review requested: learner {} submitted module {} in pathway {}",
            user_id, module_id, pathway_id
        );

        match &self.channel {
            NotificationChannel::Console => {
                println!("{}", message);
                Ok(())
            }
            NotificationChannel::Webhook { url } => {
                let payload = serde_json::json!({
                    "event": "module_review_requested",
                    "user_id": user_id.to_string(),
                    "pathway_id": pathway_id.to_string(),
                    "module_id": module_id.to_string(),
                    "message": message,
                });
                self.client.post(url).json(&payload).send().await?;
                tracing::info!("Sent review webhook to {}", url);
                Ok(())
            }
        }
    }
}
