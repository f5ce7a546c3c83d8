//! The token-gated preferences surface.
//!
//! A manager's unsubscribe token is the sole credential here: no session,
//! no rotation, equality-compare only. Everything below is scoped to the
//! parcels owned by the resolved manager; request bodies only select within
//! that set.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::info;

use entity::{manager, parcel};

use crate::config::Config;
use crate::diff;
use crate::error::ApiError;
use crate::notify::{dispatch, Notifier};
use crate::ops::{
    replace_selected_developers, selected_developer_ids, subscribe_notification,
    unsubscribe_notification, unsubscribe_notifications_for_parcels, ParcelView, RetrofitFlags,
};
use crate::util::now_ts;

/// Uniform failure for the whole gate: absent and unmatched tokens must be
/// indistinguishable to the caller.
const TOKEN_ERROR: &str = "Token not provided";

/// Resolve the manager owning `token`, failing closed.
pub async fn manager_by_token(
    db: &DatabaseConnection,
    token: Option<&str>,
) -> Result<manager::Model, ApiError> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::validation(TOKEN_ERROR))?;

    manager::Entity::find()
        .filter(manager::Column::UnsubscribeToken.eq(token))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::validation(TOKEN_ERROR))
}

/// GET: every parcel owned by the token's manager.
pub async fn preferences_parcels(
    db: &DatabaseConnection,
    token: Option<&str>,
) -> Result<Vec<ParcelView>, ApiError> {
    let mgr = manager_by_token(db, token).await?;

    let parcels = parcel::Entity::find()
        .filter(parcel::Column::ManagerId.eq(mgr.id))
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

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParcelRequest {
    /// Store id of the parcel, selected within the manager's own set.
    pub id: i64,
    pub selected_developers: Vec<i64>,
    #[serde(flatten)]
    pub retrofits: RetrofitFlags,
    pub accepts_contacts: bool,
}

/// PUT: replace a parcel's selected-developer list and retrofit/contact
/// flags in one mutation.
///
/// The diff runs against the stored list before it is overwritten, inside a
/// row-locked transaction so two concurrent updates cannot both diff
/// against the same stale state. One unsubscribe fires per removed
/// developer and one subscribe per added developer, after commit.
pub async fn update_parcel_preferences(
    db: &DatabaseConnection,
    config: &Config,
    notifier: &dyn Notifier,
    token: Option<&str>,
    request: UpdateParcelRequest,
) -> Result<ParcelView, ApiError> {
    let mgr = manager_by_token(db, token).await?;

    let txn = db.begin().await?;

    let existing = parcel::Entity::find_by_id(request.id)
        .filter(parcel::Column::ManagerId.eq(mgr.id))
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("parcel"))?;

    let before = selected_developer_ids(&txn, existing.id).await?;
    let events = diff::diff(&before, &request.selected_developers);

    replace_selected_developers(&txn, existing.id, &request.selected_developers).await?;

    let mut active: parcel::ActiveModel = existing.into();
    active.rain_garden = Set(request.retrofits.rain_garden);
    active.subsurface_storage = Set(request.retrofits.subsurface_storage);
    active.green_roof = Set(request.retrofits.green_roof);
    active.permeable_pavement = Set(request.retrofits.permeable_pavement);
    active.cistern = Set(request.retrofits.cistern);
    active.accepts_contacts = Set(request.accepts_contacts);
    active.updated_at = Set(now_ts());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    info!(
        parcel_id = updated.parcel_id,
        unsubscribed = events.unsubscribed.len(),
        subscribed = events.subscribed.len(),
        "parcel preferences updated"
    );

    for &developer_id in &events.unsubscribed {
        if let Some(n) =
            unsubscribe_notification(db, config, &updated.address, &mgr.name, developer_id).await?
        {
            dispatch(notifier, n).await;
        }
    }
    for &developer_id in &events.subscribed {
        if let Some(n) =
            subscribe_notification(db, config, &updated, &updated.note, developer_id).await?
        {
            dispatch(notifier, n).await;
        }
    }

    let selected = selected_developer_ids(db, updated.id).await?;
    Ok(ParcelView::from_model(&updated, selected))
}

/// DELETE: remove the manager's parcels matching the given external ids.
///
/// Unsubscribe payloads are captured before the rows disappear and
/// dispatched after the delete commits. Ids that do not belong to the
/// manager select nothing.
pub async fn delete_parcels_preferences(
    db: &DatabaseConnection,
    config: &Config,
    notifier: &dyn Notifier,
    token: Option<&str>,
    parcel_ids: Vec<i64>,
) -> Result<(), ApiError> {
    let mgr = manager_by_token(db, token).await?;

    let txn = db.begin().await?;

    let doomed = parcel::Entity::find()
        .filter(parcel::Column::ManagerId.eq(mgr.id))
        .filter(parcel::Column::ParcelId.is_in(parcel_ids))
        .all(&txn)
        .await?;

    let pending = unsubscribe_notifications_for_parcels(&txn, config, &doomed, &mgr.name).await?;

    let doomed_ids: Vec<i64> = doomed.iter().map(|p| p.id).collect();
    parcel::Entity::delete_many()
        .filter(parcel::Column::Id.is_in(doomed_ids))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    info!(
        manager_id = mgr.id,
        deleted = doomed.len(),
        "parcels removed via preferences"
    );

    for n in pending {
        dispatch(notifier, n).await;
    }

    Ok(())
}
