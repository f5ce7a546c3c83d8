//! Manager-scoped operations: cascade delete, developer removal across a
//! manager's parcels, field updates, and the aggregated summary view.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use entity::{manager, parcel, parcel_developer};

use crate::config::Config;
use crate::error::ApiError;
use crate::notify::{dispatch, Notifier};
use crate::ops::developers::require_staff;
use crate::ops::{
    selected_developer_ids, unsubscribe_notification, unsubscribe_notifications_for_parcels,
    RetrofitFlags,
};
use crate::util::{now_ts, ts_to_rfc3339};

/// Delete a manager and, through the store's cascade, every parcel it owns.
///
/// Every developer selected on any of those parcels gets an unsubscribe
/// notification; payloads are captured before the rows disappear. A missing
/// manager is absorbed as success.
pub async fn delete_manager(
    db: &DatabaseConnection,
    config: &Config,
    notifier: &dyn Notifier,
    id: i64,
) -> Result<(), ApiError> {
    let txn = db.begin().await?;

    let Some(mgr) = manager::Entity::find_by_id(id).one(&txn).await? else {
        return Ok(());
    };

    let parcels = parcel::Entity::find()
        .filter(parcel::Column::ManagerId.eq(mgr.id))
        .all(&txn)
        .await?;
    let pending = unsubscribe_notifications_for_parcels(&txn, config, &parcels, &mgr.name).await?;

    manager::Entity::delete_by_id(mgr.id).exec(&txn).await?;
    txn.commit().await?;

    info!(manager_id = id, parcels = parcels.len(), "manager deleted");

    for n in pending {
        dispatch(notifier, n).await;
    }

    Ok(())
}

/// Staff action: take a developer off every parcel of one manager that
/// currently lists it, notifying the developer once per affected parcel.
pub async fn remove_developer_from_manager_parcels(
    db: &DatabaseConnection,
    config: &Config,
    notifier: &dyn Notifier,
    actor_email: &str,
    manager_id: i64,
    developer_id: i64,
) -> Result<(), ApiError> {
    require_staff(db, actor_email).await?;

    let txn = db.begin().await?;

    let mgr = manager::Entity::find_by_id(manager_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("manager"))?;

    let parcels = parcel::Entity::find()
        .filter(parcel::Column::ManagerId.eq(mgr.id))
        .all(&txn)
        .await?;

    let mut pending = Vec::new();
    for p in &parcels {
        let selected = selected_developer_ids(&txn, p.id).await?;
        if !selected.contains(&developer_id) {
            continue;
        }

        parcel_developer::Entity::delete_many()
            .filter(parcel_developer::Column::ParcelId.eq(p.id))
            .filter(parcel_developer::Column::DeveloperId.eq(developer_id))
            .exec(&txn)
            .await?;

        if let Some(n) =
            unsubscribe_notification(&txn, config, &p.address, &mgr.name, developer_id).await?
        {
            pending.push(n);
        }
    }

    txn.commit().await?;

    for n in pending {
        dispatch(notifier, n).await;
    }

    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManagerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub prefer_email: Option<bool>,
    #[serde(default)]
    pub prefer_phone: Option<bool>,
    /// Applied wholesale to every parcel the manager owns.
    #[serde(default)]
    pub note: Option<String>,
}

/// Update manager contact fields; a note in the request overwrites the note
/// on all of the manager's parcels at once.
pub async fn update_manager(
    db: &DatabaseConnection,
    manager_id: i64,
    request: UpdateManagerRequest,
) -> Result<manager::Model, ApiError> {
    let now = now_ts();
    let txn = db.begin().await?;

    let mgr = manager::Entity::find_by_id(manager_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("manager"))?;

    if let Some(note) = &request.note {
        parcel::Entity::update_many()
            .col_expr(parcel::Column::Note, Expr::value(note.clone()))
            .col_expr(parcel::Column::UpdatedAt, Expr::value(now))
            .filter(parcel::Column::ManagerId.eq(mgr.id))
            .exec(&txn)
            .await?;
    }

    let mut active: manager::ActiveModel = mgr.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(phone) = request.phone {
        active.phone = Set(phone);
    }
    if let Some(v) = request.prefer_email {
        active.prefer_email = Set(v);
    }
    if let Some(v) = request.prefer_phone {
        active.prefer_phone = Set(v);
    }
    active.updated_at = Set(now);
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelSummary {
    pub id: i64,
    pub parcel_id: i64,
    pub address: String,
    pub building_type: String,
}

/// Aggregated manager view: retrofit flags are "any parcel has it", the
/// note joins the distinct parcel notes, and the developer list is the
/// union across all parcels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub note: String,
    pub prefer_email: bool,
    pub prefer_phone: bool,
    #[serde(flatten)]
    pub retrofits: RetrofitFlags,
    pub parcels: Vec<ParcelSummary>,
    pub selected_developers: Vec<i64>,
    pub created_at: String,
}

pub async fn manager_summary(
    db: &DatabaseConnection,
    manager_id: i64,
) -> Result<ManagerSummary, ApiError> {
    let mgr = manager::Entity::find_by_id(manager_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("manager"))?;

    let parcels = parcel::Entity::find()
        .filter(parcel::Column::ManagerId.eq(mgr.id))
        .order_by_asc(parcel::Column::Id)
        .all(db)
        .await?;

    let mut retrofits = RetrofitFlags::default();
    let mut notes: Vec<&str> = Vec::new();
    let mut selected_developers: Vec<i64> = Vec::new();
    let mut summaries = Vec::with_capacity(parcels.len());

    for p in &parcels {
        retrofits.rain_garden |= p.rain_garden;
        retrofits.subsurface_storage |= p.subsurface_storage;
        retrofits.green_roof |= p.green_roof;
        retrofits.permeable_pavement |= p.permeable_pavement;
        retrofits.cistern |= p.cistern;

        if !p.note.is_empty() && !notes.contains(&p.note.as_str()) {
            notes.push(p.note.as_str());
        }

        for developer_id in selected_developer_ids(db, p.id).await? {
            if !selected_developers.contains(&developer_id) {
                selected_developers.push(developer_id);
            }
        }

        summaries.push(ParcelSummary {
            id: p.id,
            parcel_id: p.parcel_id,
            address: p.address.clone(),
            building_type: p.building_type.clone(),
        });
    }

    Ok(ManagerSummary {
        id: mgr.id,
        name: mgr.name,
        email: mgr.email,
        phone: mgr.phone,
        note: notes.join("; "),
        prefer_email: mgr.prefer_email,
        prefer_phone: mgr.prefer_phone,
        retrofits,
        parcels: summaries,
        selected_developers,
        created_at: ts_to_rfc3339(mgr.created_at),
    })
}
