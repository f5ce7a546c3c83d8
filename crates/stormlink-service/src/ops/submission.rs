//! Manager submission: create-or-update a manager by email, attach parcels,
//! and notify everyone involved.

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, warn};

use entity::{developer, manager, parcel};

use crate::config::Config;
use crate::error::ApiError;
use crate::notify::{
    self, dispatch, DeveloperProfile, Notification, Notifier, Recipient,
};
use crate::ops::{
    replace_selected_developers, selected_developer_ids, subscribe_notification, RetrofitFlags,
};
use crate::util::{generate_unsubscribe_token, now_ts};

fn default_true() -> bool {
    true
}

/// One parcel in a manager submission. `parcel_id` is the external registry
/// identifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelSubmission {
    pub parcel_id: i64,
    pub address: String,
    #[serde(default)]
    pub building_type: String,
}

/// The public submission form: manager contact fields plus a parcel list.
/// The retrofit flags, note, developer selection, and contact gate apply
/// uniformly to every submitted parcel.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerSubmission {
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub prefer_email: Option<bool>,
    #[serde(default)]
    pub prefer_phone: Option<bool>,

    #[serde(default)]
    pub parcels: Vec<ParcelSubmission>,
    #[serde(default)]
    pub selected_developers: Vec<i64>,
    #[serde(flatten)]
    pub retrofits: RetrofitFlags,
    #[serde(default)]
    pub note: String,
    #[serde(default = "default_true")]
    pub accepts_contacts: bool,
}

/// Create-or-update a manager by email and insert the submitted parcels.
///
/// A parcel whose external id already exists anywhere in the store is
/// collected into the rejection list instead of being created. The
/// non-conflicting inserts commit regardless (insert-then-validate); when
/// any parcel was already claimed, the whole operation then fails with
/// `ParcelsAlreadyClaimed` naming every conflicting address and no
/// notifications are sent.
pub async fn submit_manager(
    db: &sea_orm::DatabaseConnection,
    config: &Config,
    notifier: &dyn Notifier,
    submission: ManagerSubmission,
) -> Result<manager::Model, ApiError> {
    let email = submission.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::validation("email is required"));
    }

    let now = now_ts();
    let txn = db.begin().await?;

    let existing = manager::Entity::find()
        .filter(manager::Column::Email.eq(&email))
        .one(&txn)
        .await?;
    let is_new = existing.is_none();

    let mgr = match existing {
        Some(m) => m,
        None => {
            manager::ActiveModel {
                id: NotSet,
                name: Set(submission.name.clone()),
                email: Set(email.clone()),
                phone: Set(submission.phone.clone().unwrap_or_default()),
                prefer_email: Set(submission.prefer_email.unwrap_or(false)),
                prefer_phone: Set(submission.prefer_phone.unwrap_or(false)),
                unsubscribe_token: Set(generate_unsubscribe_token()),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?
        }
    };

    let mut already_claimed: Vec<String> = Vec::new();
    for p in &submission.parcels {
        let taken = parcel::Entity::find()
            .filter(parcel::Column::ParcelId.eq(p.parcel_id))
            .one(&txn)
            .await?
            .is_some();
        if taken {
            already_claimed.push(p.address.clone());
            continue;
        }

        let created = parcel::ActiveModel {
            id: NotSet,
            parcel_id: Set(p.parcel_id),
            manager_id: Set(mgr.id),
            address: Set(p.address.clone()),
            building_type: Set(p.building_type.clone()),
            rain_garden: Set(submission.retrofits.rain_garden),
            subsurface_storage: Set(submission.retrofits.subsurface_storage),
            green_roof: Set(submission.retrofits.green_roof),
            permeable_pavement: Set(submission.retrofits.permeable_pavement),
            cistern: Set(submission.retrofits.cistern),
            note: Set(submission.note.clone()),
            accepts_contacts: Set(submission.accepts_contacts),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        replace_selected_developers(&txn, created.id, &submission.selected_developers).await?;
    }

    // Insert-then-validate: the non-conflicting parcels stay committed even
    // when the submission reports a conflict. The conflict also skips the
    // repeat submission's contact-field updates.
    if !already_claimed.is_empty() {
        txn.commit().await?;
        return Err(ApiError::ParcelsAlreadyClaimed(
            already_claimed
                .iter()
                .map(|address| format!("Parcel at {address} already submitted"))
                .collect(),
        ));
    }

    let mgr = if is_new {
        mgr
    } else {
        let mut active: manager::ActiveModel = mgr.into();
        if let Some(phone) = &submission.phone {
            active.phone = Set(phone.clone());
        }
        if let Some(v) = submission.prefer_email {
            active.prefer_email = Set(v);
        }
        if let Some(v) = submission.prefer_phone {
            active.prefer_phone = Set(v);
        }
        active.updated_at = Set(now);
        active.update(&txn).await?
    };

    txn.commit().await?;

    info!(
        manager_id = mgr.id,
        is_new,
        parcels = submission.parcels.len(),
        "manager submission accepted"
    );

    let submitted_ids: Vec<i64> = submission.parcels.iter().map(|p| p.parcel_id).collect();

    let confirmation = manager_confirmation(
        db,
        config,
        &mgr,
        &submission.note,
        &submission.selected_developers,
        &submitted_ids,
    )
    .await?;
    dispatch(notifier, confirmation).await;

    let parcels = parcel::Entity::find()
        .filter(parcel::Column::ManagerId.eq(mgr.id))
        .filter(parcel::Column::ParcelId.is_in(submitted_ids))
        .all(db)
        .await?;
    for p in &parcels {
        for developer_id in selected_developer_ids(db, p.id).await? {
            if let Some(n) =
                subscribe_notification(db, config, p, &submission.note, developer_id).await?
            {
                dispatch(notifier, n).await;
            }
        }
    }

    Ok(mgr)
}

/// The one confirmation message a successful submission sends the manager:
/// everything they chose, plus their preferences link.
async fn manager_confirmation<C: ConnectionTrait>(
    db: &C,
    config: &Config,
    mgr: &manager::Model,
    note: &str,
    selected_developers: &[i64],
    parcel_ids: &[i64],
) -> Result<Notification, DbErr> {
    let mut developers = Vec::new();
    for &id in selected_developers {
        let Some(dev) = developer::Entity::find_by_id(id).one(db).await? else {
            warn!(developer_id = id, "selected developer does not exist, omitting from confirmation");
            continue;
        };
        developers.push(DeveloperProfile {
            specialties: notify::format_selected_retrofits(&RetrofitFlags::of_developer(&dev)),
            company_name: dev.company_name,
            company_email: dev.company_email,
            company_phone: dev.company_phone,
            company_website: dev.company_website,
        });
    }

    let parcels = parcel::Entity::find()
        .filter(parcel::Column::ManagerId.eq(mgr.id))
        .filter(parcel::Column::ParcelId.is_in(parcel_ids.to_vec()))
        .all(db)
        .await?;

    let parcel_addresses = parcels
        .iter()
        .map(|p| p.address.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let selected_retrofits = parcels
        .first()
        .map(|p| notify::format_selected_retrofits(&RetrofitFlags::of_parcel(p)))
        .unwrap_or_default();

    Ok(Notification::ManagerConfirmation {
        manager: Recipient {
            name: mgr.name.clone(),
            email: mgr.email.clone(),
        },
        phone: mgr.phone.clone(),
        preferred_contact: notify::preferred_contact(mgr.prefer_email, mgr.prefer_phone),
        note: note.to_string(),
        parcel_addresses,
        developers,
        selected_retrofits,
        preferences_url: notify::preferences_url(config, &mgr.unsubscribe_token),
    })
}
