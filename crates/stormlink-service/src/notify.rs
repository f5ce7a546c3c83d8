use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::config::Config;
use crate::ops::RetrofitFlags;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct NotifyError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

/// Company profile shown to a manager in the confirmation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperProfile {
    pub company_name: String,
    pub company_email: String,
    pub company_phone: String,
    pub company_website: String,
    pub specialties: String,
}

/// One outgoing message per (recipient, parcel, event) tuple.
///
/// Retrofit lists arrive pre-formatted; rendering a payload into an actual
/// message body is the dispatcher's problem, not the workflow's.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Notification {
    ManagerConfirmation {
        manager: Recipient,
        phone: String,
        preferred_contact: String,
        note: String,
        parcel_addresses: String,
        developers: Vec<DeveloperProfile>,
        selected_retrofits: String,
        preferences_url: String,
    },
    DeveloperSubscribe {
        developer: Recipient,
        parcel_url: String,
        retrofits: String,
        note: String,
    },
    DeveloperUnsubscribe {
        developer: Recipient,
        address: String,
        manager_name: String,
        map_url: String,
    },
    ManagerPreferencesInvite {
        manager: Recipient,
        preferences_url: String,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::ManagerConfirmation { .. } => "manager_confirmation",
            Notification::DeveloperSubscribe { .. } => "developer_subscribe",
            Notification::DeveloperUnsubscribe { .. } => "developer_unsubscribe",
            Notification::ManagerPreferencesInvite { .. } => "manager_preferences_invite",
        }
    }

    pub fn recipient(&self) -> &Recipient {
        match self {
            Notification::ManagerConfirmation { manager, .. } => manager,
            Notification::DeveloperSubscribe { developer, .. } => developer,
            Notification::DeveloperUnsubscribe { developer, .. } => developer,
            Notification::ManagerPreferencesInvite { manager, .. } => manager,
        }
    }
}

/// Outgoing-notification transport, injected into the workflow so the
/// subscription logic is testable without a real mail provider.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Best-effort dispatch. Delivery failures are logged as such and never
/// surfaced to the caller; the entity mutation has already committed.
pub async fn dispatch(notifier: &dyn Notifier, notification: Notification) {
    let kind = notification.kind();
    let to = notification.recipient().email.clone();

    if let Err(e) = notifier.notify(notification).await {
        warn!(kind, to = %to, "notification dispatch failed: {e}");
    }
}

pub fn format_selected_retrofits(flags: &RetrofitFlags) -> String {
    let labels = [
        ("Rain Garden", flags.rain_garden),
        ("Subsurface Storage", flags.subsurface_storage),
        ("Green Roof", flags.green_roof),
        ("Permeable Pavement", flags.permeable_pavement),
        ("Cistern", flags.cistern),
    ];

    labels
        .iter()
        .filter(|(_, selected)| *selected)
        .map(|(label, _)| *label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve the manager's contact preference to a display string. Both flags
/// set means either channel works.
pub fn preferred_contact(prefer_email: bool, prefer_phone: bool) -> String {
    if prefer_email && prefer_phone {
        "Doesn't matter".to_string()
    } else if prefer_phone {
        "Phone".to_string()
    } else {
        "Email".to_string()
    }
}

pub fn property_url(config: &Config, parcel_id: i64) -> String {
    format!("{}/property/{}", config.retrofit_map_url, parcel_id)
}

pub fn preferences_url(config: &Config, unsubscribe_token: &str) -> String {
    format!(
        "{}/preferences?token={}",
        config.preferences_url, unsubscribe_token
    )
}
