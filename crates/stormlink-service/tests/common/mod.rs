use std::sync::Mutex;

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, DatabaseConnection, Set};

use entity::developer;
use stormlink_service::config::Config;
use stormlink_service::notify::{Notification, Notifier, NotifyError};
use stormlink_service::{admin, db};

/// Captures every dispatched notification instead of sending mail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything captured so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    pub fn count(&self, kind: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.kind() == kind)
            .count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

pub async fn setup() -> (DatabaseConnection, Config) {
    let db = db::connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    admin::run_migrations(&db).await.expect("apply migrations");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        retrofit_map_url: "https://map.example".to_string(),
        preferences_url: "https://www.example".to_string(),
        brevo: None,
    };

    (db, config)
}

pub async fn create_developer(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
) -> developer::Model {
    developer_row(db, name, email, false).await
}

pub async fn create_staff(db: &DatabaseConnection, email: &str) -> developer::Model {
    developer_row(db, "Program Staff", email, true).await
}

async fn developer_row(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    is_staff: bool,
) -> developer::Model {
    developer::ActiveModel {
        id: NotSet,
        email: Set(email.to_string()),
        name: Set(name.to_string()),
        phone: Set("215-555-0100".to_string()),
        is_staff: Set(is_staff),
        status: Set(developer::STATUS_ACTIVE),
        approved_at: Set(Some(1)),
        denied_at: Set(None),
        deactivated_at: Set(None),
        reason_for_denial: Set(String::new()),
        company_name: Set(format!("{name} LLC")),
        company_email: Set(email.to_string()),
        company_phone: Set("215-555-0101".to_string()),
        company_website: Set(String::new()),
        rain_garden: Set(true),
        subsurface_storage: Set(false),
        green_roof: Set(false),
        permeable_pavement: Set(false),
        cistern: Set(false),
        other_retrofit: Set(String::new()),
        ein: Set("12-3456789".to_string()),
        commercial_activity_license: Set(String::new()),
        has_grant_approval: Set(false),
        email_parcel_updates: Set(false),
        is_design_firm: Set(true),
        is_construction_firm: Set(false),
        is_maintenance_firm: Set(false),
        saved_parcel_ids: Set("[]".to_string()),
        created_at: Set(1),
        updated_at: Set(1),
    }
    .insert(db)
    .await
    .expect("insert developer")
}
