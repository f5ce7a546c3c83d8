//! Workflow operations consumed by the routing layer.
//!
//! Every operation is a single transaction against the entity store;
//! notifications dispatch after commit and never fail a request.

pub mod developers;
pub mod managers;
pub mod parcels;
pub mod preferences;
pub mod submission;

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use entity::{developer, parcel, parcel_developer};

use crate::config::Config;
use crate::notify::{self, Notification, Recipient};

/// The five independent retrofit-interest flags shared by parcels and
/// developer capability profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrofitFlags {
    pub rain_garden: bool,
    pub subsurface_storage: bool,
    pub green_roof: bool,
    pub permeable_pavement: bool,
    pub cistern: bool,
}

impl RetrofitFlags {
    pub fn of_parcel(p: &parcel::Model) -> Self {
        RetrofitFlags {
            rain_garden: p.rain_garden,
            subsurface_storage: p.subsurface_storage,
            green_roof: p.green_roof,
            permeable_pavement: p.permeable_pavement,
            cistern: p.cistern,
        }
    }

    pub fn of_developer(d: &developer::Model) -> Self {
        RetrofitFlags {
            rain_garden: d.rain_garden,
            subsurface_storage: d.subsurface_storage,
            green_roof: d.green_roof,
            permeable_pavement: d.permeable_pavement,
            cistern: d.cistern,
        }
    }
}

/// Parcel as exposed to the routing layer. Timestamps stay internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelView {
    pub id: i64,
    pub parcel_id: i64,
    pub manager_id: i64,
    pub address: String,
    pub building_type: String,
    pub selected_developers: Vec<i64>,
    #[serde(flatten)]
    pub retrofits: RetrofitFlags,
    pub note: String,
    pub accepts_contacts: bool,
}

impl ParcelView {
    pub(crate) fn from_model(p: &parcel::Model, selected_developers: Vec<i64>) -> Self {
        ParcelView {
            id: p.id,
            parcel_id: p.parcel_id,
            manager_id: p.manager_id,
            address: p.address.clone(),
            building_type: p.building_type.clone(),
            selected_developers,
            retrofits: RetrofitFlags::of_parcel(p),
            note: p.note.clone(),
            accepts_contacts: p.accepts_contacts,
        }
    }
}

/// Read a parcel's selected-developer list wholesale, in stored order.
pub(crate) async fn selected_developer_ids<C: ConnectionTrait>(
    db: &C,
    parcel_id: i64,
) -> Result<Vec<i64>, DbErr> {
    let rows = parcel_developer::Entity::find()
        .filter(parcel_developer::Column::ParcelId.eq(parcel_id))
        .order_by_asc(parcel_developer::Column::Position)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(|row| row.developer_id).collect())
}

/// Rewrite a parcel's selected-developer list wholesale: clear the existing
/// mappings, then insert the new list in order, skipping duplicates.
pub(crate) async fn replace_selected_developers<C: ConnectionTrait>(
    db: &C,
    parcel_id: i64,
    developer_ids: &[i64],
) -> Result<(), DbErr> {
    parcel_developer::Entity::delete_many()
        .filter(parcel_developer::Column::ParcelId.eq(parcel_id))
        .exec(db)
        .await?;

    let mut seen: Vec<i64> = Vec::with_capacity(developer_ids.len());
    for &developer_id in developer_ids {
        if seen.contains(&developer_id) {
            continue;
        }
        seen.push(developer_id);

        let row = parcel_developer::ActiveModel {
            id: NotSet,
            parcel_id: Set(parcel_id),
            developer_id: Set(developer_id),
            position: Set((seen.len() - 1) as i32),
        };
        row.insert(db).await?;
    }

    Ok(())
}

/// Build the subscribe notification for one (developer, parcel) pair.
///
/// A selected developer that no longer exists is skipped, not an error;
/// notifications are best-effort.
pub(crate) async fn subscribe_notification<C: ConnectionTrait>(
    db: &C,
    config: &Config,
    parcel: &parcel::Model,
    note: &str,
    developer_id: i64,
) -> Result<Option<Notification>, DbErr> {
    let Some(dev) = developer::Entity::find_by_id(developer_id).one(db).await? else {
        warn!(developer_id, "selected developer does not exist, skipping notification");
        return Ok(None);
    };

    Ok(Some(Notification::DeveloperSubscribe {
        developer: Recipient {
            name: dev.name,
            email: dev.email,
        },
        parcel_url: notify::property_url(config, parcel.parcel_id),
        retrofits: notify::format_selected_retrofits(&RetrofitFlags::of_parcel(parcel)),
        note: note.to_string(),
    }))
}

/// Build the unsubscribe notification for one (developer, parcel) pair.
/// Payloads for deletions must be captured before the parcel row disappears.
pub(crate) async fn unsubscribe_notification<C: ConnectionTrait>(
    db: &C,
    config: &Config,
    address: &str,
    manager_name: &str,
    developer_id: i64,
) -> Result<Option<Notification>, DbErr> {
    let Some(dev) = developer::Entity::find_by_id(developer_id).one(db).await? else {
        warn!(developer_id, "selected developer does not exist, skipping notification");
        return Ok(None);
    };

    Ok(Some(Notification::DeveloperUnsubscribe {
        developer: Recipient {
            name: dev.name,
            email: dev.email,
        },
        address: address.to_string(),
        manager_name: manager_name.to_string(),
        map_url: config.retrofit_map_url.clone(),
    }))
}

/// Capture unsubscribe payloads for every developer currently selected on
/// each of the given parcels.
pub(crate) async fn unsubscribe_notifications_for_parcels<C: ConnectionTrait>(
    db: &C,
    config: &Config,
    parcels: &[parcel::Model],
    manager_name: &str,
) -> Result<Vec<Notification>, DbErr> {
    let mut pending = Vec::new();
    for p in parcels {
        for developer_id in selected_developer_ids(db, p.id).await? {
            if let Some(n) =
                unsubscribe_notification(db, config, &p.address, manager_name, developer_id).await?
            {
                pending.push(n);
            }
        }
    }
    Ok(pending)
}
