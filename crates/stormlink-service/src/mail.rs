use async_trait::async_trait;
use serde::Serialize;

use crate::config::BrevoConfig;
use crate::notify::{Notification, Notifier, NotifyError};

const BREVO_SEND_URL: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoEmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendEmailBody {
    sender: BrevoEmailAddress,
    to: Vec<BrevoEmailAddress>,
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_content: Option<String>,
}

fn is_success_status(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Sends notifications through the Brevo transactional-email API.
///
/// Bodies are plain text; layout belongs to whatever consumes these
/// messages, not to this service.
pub struct BrevoNotifier {
    http: reqwest::Client,
    config: BrevoConfig,
}

impl BrevoNotifier {
    pub fn new(config: BrevoConfig) -> Self {
        BrevoNotifier {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn send_email(
        &self,
        to_email: &str,
        to_name: Option<&str>,
        subject: &str,
        text: String,
    ) -> Result<(), NotifyError> {
        let body = BrevoSendEmailBody {
            sender: BrevoEmailAddress {
                email: self.config.sender_email.clone(),
                name: self.config.sender_name.clone(),
            },
            to: vec![BrevoEmailAddress {
                email: to_email.to_string(),
                name: to_name.map(|s| s.to_string()),
            }],
            subject: subject.to_string(),
            text_content: Some(text),
        };

        let resp = self
            .http
            .post(BREVO_SEND_URL)
            .header("api-key", &self.config.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError(format!("Brevo request failed: {e}")))?;

        let status = resp.status().as_u16();
        if is_success_status(status) {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(NotifyError(format!(
            "Brevo send failed (status={status}): {body}"
        )))
    }
}

fn render(notification: &Notification) -> (String, String) {
    match notification {
        Notification::ManagerConfirmation {
            manager,
            phone,
            preferred_contact,
            note,
            parcel_addresses,
            developers,
            selected_retrofits,
            preferences_url,
        } => {
            let mut body = format!(
                "Hi {},\n\n\
                 Thanks for listing your parcels for stormwater retrofits.\n\n\
                 Parcels: {}\n\
                 Retrofits of interest: {}\n\
                 Preferred contact: {} ({} / {})\n",
                manager.name, parcel_addresses, selected_retrofits, preferred_contact,
                manager.email, phone,
            );
            if !note.is_empty() {
                body.push_str(&format!("Note: {note}\n"));
            }
            if !developers.is_empty() {
                body.push_str("\nDevelopers you selected:\n");
                for d in developers {
                    body.push_str(&format!(
                        "  - {} ({}, {}) {} [{}]\n",
                        d.company_name, d.company_email, d.company_phone, d.company_website,
                        d.specialties,
                    ));
                }
            }
            body.push_str(&format!(
                "\nManage or remove your parcels at any time:\n{preferences_url}\n"
            ));
            (
                format!("Thanks for your parcel submission, {}", manager.name),
                body,
            )
        }
        Notification::DeveloperSubscribe {
            developer,
            parcel_url,
            retrofits,
            note,
        } => {
            let mut body = format!(
                "Hi {},\n\n\
                 A property manager selected your company for a parcel:\n{}\n\n\
                 Retrofits of interest: {}\n",
                developer.name, parcel_url, retrofits,
            );
            if !note.is_empty() {
                body.push_str(&format!("Note from the manager: {note}\n"));
            }
            (
                "A property manager is interested in your company".to_string(),
                body,
            )
        }
        Notification::DeveloperUnsubscribe {
            developer,
            address,
            manager_name,
            map_url,
        } => (
            "A parcel is no longer available".to_string(),
            format!(
                "Hi {},\n\n\
                 {} has removed the parcel at {} from the retrofit program.\n\n\
                 Browse other available parcels: {}\n",
                developer.name, manager_name, address, map_url,
            ),
        ),
        Notification::ManagerPreferencesInvite {
            manager,
            preferences_url,
        } => (
            format!("Manage your parcel preferences, {}", manager.name),
            format!(
                "Hi {},\n\n\
                 Use this link to review, update, or remove your listed parcels:\n{}\n",
                manager.name, preferences_url,
            ),
        ),
    }
}

#[async_trait]
impl Notifier for BrevoNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        let (subject, body) = render(&notification);
        let recipient = notification.recipient();

        self.send_email(
            &recipient.email,
            Some(&recipient.name),
            &subject,
            body,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Recipient;

    #[test]
    fn unsubscribe_body_names_the_parcel_and_manager() {
        let n = Notification::DeveloperUnsubscribe {
            developer: Recipient {
                name: "Dana".into(),
                email: "dana@example.com".into(),
            },
            address: "1234 Market St".into(),
            manager_name: "Acme Properties".into(),
            map_url: "https://map.example".into(),
        };

        let (subject, body) = render(&n);
        assert_eq!(subject, "A parcel is no longer available");
        assert!(body.contains("1234 Market St"));
        assert!(body.contains("Acme Properties"));
    }

    #[test]
    fn confirmation_omits_empty_note() {
        let n = Notification::ManagerConfirmation {
            manager: Recipient {
                name: "Pat".into(),
                email: "pat@example.com".into(),
            },
            phone: "".into(),
            preferred_contact: "Email".into(),
            note: "".into(),
            parcel_addresses: "10 Main St".into(),
            developers: vec![],
            selected_retrofits: "Cistern".into(),
            preferences_url: "https://www.example/preferences?token=t".into(),
        };

        let (_, body) = render(&n);
        assert!(!body.contains("Note:"));
        assert!(body.contains("https://www.example/preferences?token=t"));
    }
}
