//! Privileged parcel operations: direct create, destroy with the
//! cross-parcel orphan report, listing, and the preferences-link resend.

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::info;

use entity::{manager, parcel};

use crate::config::Config;
use crate::error::ApiError;
use crate::notify::{self, dispatch, Notification, Notifier, Recipient};
use crate::ops::{
    replace_selected_developers, selected_developer_ids, subscribe_notification,
    unsubscribe_notifications_for_parcels, ParcelView, RetrofitFlags,
};
use crate::util::now_ts;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParcelRequest {
    pub parcel_id: i64,
    pub manager_id: i64,
    pub address: String,
    #[serde(default)]
    pub building_type: String,
    #[serde(flatten)]
    pub retrofits: RetrofitFlags,
    #[serde(default)]
    pub selected_developers: Vec<i64>,
    #[serde(default)]
    pub note: String,
    pub accepts_contacts: bool,
}

/// Create a parcel directly under an existing manager.
///
/// Unlike the submission path this is all-or-nothing: a duplicate external
/// id is a plain conflict and nothing is created.
pub async fn create_parcel(
    db: &DatabaseConnection,
    config: &Config,
    notifier: &dyn Notifier,
    request: CreateParcelRequest,
) -> Result<ParcelView, ApiError> {
    let now = now_ts();
    let txn = db.begin().await?;

    manager::Entity::find_by_id(request.manager_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("manager"))?;

    let taken = parcel::Entity::find()
        .filter(parcel::Column::ParcelId.eq(request.parcel_id))
        .one(&txn)
        .await?
        .is_some();
    if taken {
        return Err(ApiError::Conflict(request.parcel_id));
    }

    let created = parcel::ActiveModel {
        id: NotSet,
        parcel_id: Set(request.parcel_id),
        manager_id: Set(request.manager_id),
        address: Set(request.address.clone()),
        building_type: Set(request.building_type.clone()),
        rain_garden: Set(request.retrofits.rain_garden),
        subsurface_storage: Set(request.retrofits.subsurface_storage),
        green_roof: Set(request.retrofits.green_roof),
        permeable_pavement: Set(request.retrofits.permeable_pavement),
        cistern: Set(request.retrofits.cistern),
        note: Set(request.note.clone()),
        accepts_contacts: Set(request.accepts_contacts),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    replace_selected_developers(&txn, created.id, &request.selected_developers).await?;

    txn.commit().await?;

    let selected = selected_developer_ids(db, created.id).await?;
    for &developer_id in &selected {
        if let Some(n) =
            subscribe_notification(db, config, &created, &created.note, developer_id).await?
        {
            dispatch(notifier, n).await;
        }
    }

    Ok(ParcelView::from_model(&created, selected))
}

/// Destroy a single parcel by store id.
///
/// Returns the developers who, after this deletion, are selected on no
/// remaining parcel of the same manager, so the caller can sever the
/// developer-manager relationship when the last shared parcel is gone.
/// A missing parcel is absorbed as success with an empty set.
pub async fn destroy_parcel(
    db: &DatabaseConnection,
    config: &Config,
    notifier: &dyn Notifier,
    id: i64,
) -> Result<Vec<i64>, ApiError> {
    let txn = db.begin().await?;

    let Some(doomed) = parcel::Entity::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
    else {
        return Ok(Vec::new());
    };

    let mgr = manager::Entity::find_by_id(doomed.manager_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("manager"))?;

    let doomed_selected = selected_developer_ids(&txn, doomed.id).await?;
    let pending = unsubscribe_notifications_for_parcels(
        &txn,
        config,
        std::slice::from_ref(&doomed),
        &mgr.name,
    )
    .await?;

    // Cross-parcel set difference over the manager's other parcels.
    let remaining_parcels = parcel::Entity::find()
        .filter(parcel::Column::ManagerId.eq(doomed.manager_id))
        .filter(parcel::Column::Id.ne(doomed.id))
        .all(&txn)
        .await?;
    let mut remaining_developers: Vec<i64> = Vec::new();
    for p in &remaining_parcels {
        remaining_developers.extend(selected_developer_ids(&txn, p.id).await?);
    }

    let unselected: Vec<i64> = doomed_selected
        .iter()
        .filter(|d| !remaining_developers.contains(d))
        .copied()
        .collect();

    parcel::Entity::delete_by_id(doomed.id).exec(&txn).await?;
    txn.commit().await?;

    info!(
        parcel_id = doomed.parcel_id,
        orphaned_developers = unselected.len(),
        "parcel destroyed"
    );

    for n in pending {
        dispatch(notifier, n).await;
    }

    Ok(unselected)
}

/// Full parcel views, ordered by store id.
pub async fn list_parcels(db: &DatabaseConnection) -> Result<Vec<ParcelView>, ApiError> {
    let parcels = parcel::Entity::find()
        .order_by_asc(parcel::Column::Id)
        .all(db)
        .await?;

    let mut views = Vec::with_capacity(parcels.len());
    for p in &parcels {
        let selected = selected_developer_ids(db, p.id).await?;
        views.push(ParcelView::from_model(p, selected));
    }

    Ok(views)
}

/// Re-send the preferences link to the manager owning the parcel with the
/// given external id. Unauthenticated by design, so an unknown id is a
/// generic validation failure rather than a revealing not-found.
pub async fn resend_preferences_email(
    db: &DatabaseConnection,
    config: &Config,
    notifier: &dyn Notifier,
    parcel_id: i64,
) -> Result<(), ApiError> {
    let p = parcel::Entity::find()
        .filter(parcel::Column::ParcelId.eq(parcel_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::validation("Invalid request"))?;

    let mgr = manager::Entity::find_by_id(p.manager_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::validation("Invalid request"))?;

    dispatch(
        notifier,
        Notification::ManagerPreferencesInvite {
            manager: Recipient {
                name: mgr.name.clone(),
                email: mgr.email.clone(),
            },
            preferences_url: notify::preferences_url(config, &mgr.unsubscribe_token),
        },
    )
    .await;

    Ok(())
}
