//! Developer-side operations: approval-status transitions, subscription
//! removal paths, the saved-parcel bookmarks, and the read-only projections
//! the retrofit map shows an authenticated developer.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::info;

use entity::{developer, manager, parcel, parcel_developer};

use crate::config::Config;
use crate::error::ApiError;
use crate::notify::{dispatch, Notifier};
use crate::ops::{unsubscribe_notification, RetrofitFlags};
use crate::util::now_ts;

/// Permission check for staff-only operations. Unknown emails and non-staff
/// developers fail identically; the error carries no detail.
pub async fn require_staff(
    db: &DatabaseConnection,
    email: &str,
) -> Result<developer::Model, ApiError> {
    developer::Entity::find()
        .filter(developer::Column::Email.eq(email))
        .filter(developer::Column::IsStaff.eq(true))
        .one(db)
        .await?
        .ok_or(ApiError::Permission)
}

/// Staff-driven approval transition. Entering a status records its
/// timestamp and clears the other two; only a denial carries a reason.
pub async fn set_developer_status(
    db: &DatabaseConnection,
    actor_email: &str,
    developer_id: i64,
    status: i32,
    reason_for_denial: Option<String>,
) -> Result<developer::Model, ApiError> {
    require_staff(db, actor_email).await?;

    let dev = developer::Entity::find_by_id(developer_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("developer"))?;

    let now = now_ts();
    let mut active: developer::ActiveModel = dev.into();

    match status {
        developer::STATUS_DENIED => {
            active.status = Set(developer::STATUS_DENIED);
            active.denied_at = Set(Some(now));
            active.approved_at = Set(None);
            active.deactivated_at = Set(None);
            active.reason_for_denial = Set(reason_for_denial.unwrap_or_default());
        }
        developer::STATUS_ACTIVE => {
            active.status = Set(developer::STATUS_ACTIVE);
            active.approved_at = Set(Some(now));
            active.denied_at = Set(None);
            active.deactivated_at = Set(None);
            active.reason_for_denial = Set(String::new());
        }
        developer::STATUS_DEACTIVATED => {
            active.status = Set(developer::STATUS_DEACTIVATED);
            active.deactivated_at = Set(Some(now));
            active.approved_at = Set(None);
            active.denied_at = Set(None);
            active.reason_for_denial = Set(String::new());
        }
        other => {
            return Err(ApiError::validation(format!("unknown status {other}")));
        }
    }

    active.updated_at = Set(now);
    let updated = active.update(db).await?;

    info!(developer_id, status, "developer status changed");
    Ok(updated)
}

/// Staff cleanup: silently drop a developer from every parcel of one
/// manager. Administrative, so no notification is sent.
pub async fn staff_remove_developer_customer_parcels(
    db: &DatabaseConnection,
    actor_email: &str,
    developer_id: i64,
    manager_id: i64,
) -> Result<(), ApiError> {
    require_staff(db, actor_email).await?;

    developer::Entity::find_by_id(developer_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("developer"))?;

    let txn = db.begin().await?;

    let parcel_ids: Vec<i64> = parcel::Entity::find()
        .filter(parcel::Column::ManagerId.eq(manager_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    parcel_developer::Entity::delete_many()
        .filter(parcel_developer::Column::ParcelId.is_in(parcel_ids))
        .filter(parcel_developer::Column::DeveloperId.eq(developer_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(())
}

/// Self-service removal from a single parcel, by external parcel id.
/// Already-absent is success; the unsubscribe notification only fires when
/// a subscription was actually removed.
pub async fn remove_developer_from_parcel(
    db: &DatabaseConnection,
    config: &Config,
    notifier: &dyn Notifier,
    parcel_id: i64,
    developer_id: i64,
) -> Result<(), ApiError> {
    let txn = db.begin().await?;

    let p = parcel::Entity::find()
        .filter(parcel::Column::ParcelId.eq(parcel_id))
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("parcel"))?;

    let mgr = manager::Entity::find_by_id(p.manager_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("manager"))?;

    let removed = parcel_developer::Entity::delete_many()
        .filter(parcel_developer::Column::ParcelId.eq(p.id))
        .filter(parcel_developer::Column::DeveloperId.eq(developer_id))
        .exec(&txn)
        .await?
        .rows_affected;

    let pending = if removed > 0 {
        unsubscribe_notification(&txn, config, &p.address, &mgr.name, developer_id).await?
    } else {
        None
    };

    txn.commit().await?;

    if let Some(n) = pending {
        dispatch(notifier, n).await;
    }

    Ok(())
}

fn decode_saved_ids(raw: &str) -> Vec<i64> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(raw).unwrap_or_default()
}

fn encode_saved_ids(ids: &[i64]) -> String {
    serde_json::to_string(ids).expect("a list of integers always serializes")
}

/// Insert into the ascending list only if absent. Returns whether the list
/// changed.
fn insert_sorted(ids: &mut Vec<i64>, id: i64) -> bool {
    match ids.binary_search(&id) {
        Ok(_) => false,
        Err(pos) => {
            ids.insert(pos, id);
            true
        }
    }
}

/// Remove if present. Absence is effectively the same as a successful
/// removal.
fn remove_sorted(ids: &mut Vec<i64>, id: i64) -> bool {
    match ids.binary_search(&id) {
        Ok(pos) => {
            ids.remove(pos);
            true
        }
        Err(_) => false,
    }
}

fn parse_parcel_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::validation("Parcel ID must be an integer"))
}

/// Bookmark a parcel. The id arrives as a raw path segment; a duplicate add
/// is a no-op. Returns the resulting list.
pub async fn save_parcel(
    db: &DatabaseConnection,
    developer_id: i64,
    raw_parcel_id: &str,
) -> Result<Vec<i64>, ApiError> {
    let parcel_id = parse_parcel_id(raw_parcel_id)?;

    let dev = developer::Entity::find_by_id(developer_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("developer"))?;

    let mut ids = decode_saved_ids(&dev.saved_parcel_ids);
    if insert_sorted(&mut ids, parcel_id) {
        let mut active: developer::ActiveModel = dev.into();
        active.saved_parcel_ids = Set(encode_saved_ids(&ids));
        active.updated_at = Set(now_ts());
        active.update(db).await?;
    }

    Ok(ids)
}

/// Drop a bookmark. Removing an id that was never saved is success.
pub async fn unsave_parcel(
    db: &DatabaseConnection,
    developer_id: i64,
    raw_parcel_id: &str,
) -> Result<Vec<i64>, ApiError> {
    let parcel_id = parse_parcel_id(raw_parcel_id)?;

    let dev = developer::Entity::find_by_id(developer_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("developer"))?;

    let mut ids = decode_saved_ids(&dev.saved_parcel_ids);
    remove_sorted(&mut ids, parcel_id);

    let mut active: developer::ActiveModel = dev.into();
    active.saved_parcel_ids = Set(encode_saved_ids(&ids));
    active.updated_at = Set(now_ts());
    active.update(db).await?;

    Ok(ids)
}

pub async fn saved_parcels(
    db: &DatabaseConnection,
    developer_id: i64,
) -> Result<Vec<i64>, ApiError> {
    let dev = developer::Entity::find_by_id(developer_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("developer"))?;

    Ok(decode_saved_ids(&dev.saved_parcel_ids))
}

/// A parcel whose manager selected this developer. Contact channels only
/// appear when the manager opted into them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestedParcel {
    pub parcel_id: i64,
    pub address: String,
    pub contact_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub retrofits: RetrofitFlags,
    pub note: String,
}

/// Parcels on which the developer is currently selected.
pub async fn interested(
    db: &DatabaseConnection,
    developer_id: i64,
) -> Result<Vec<InterestedParcel>, ApiError> {
    let links = parcel_developer::Entity::find()
        .filter(parcel_developer::Column::DeveloperId.eq(developer_id))
        .all(db)
        .await?;
    let parcel_ids: Vec<i64> = links.iter().map(|l| l.parcel_id).collect();

    let parcels = parcel::Entity::find()
        .filter(parcel::Column::Id.is_in(parcel_ids))
        .order_by_asc(parcel::Column::Id)
        .all(db)
        .await?;

    let mut out = Vec::with_capacity(parcels.len());
    for p in &parcels {
        let mgr = manager::Entity::find_by_id(p.manager_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("manager"))?;

        out.push(InterestedParcel {
            parcel_id: p.parcel_id,
            address: p.address.clone(),
            contact_name: mgr.name.clone(),
            contact_email: mgr.prefer_email.then(|| mgr.email.clone()),
            contact_phone: mgr.prefer_phone.then(|| mgr.phone.clone()),
            retrofits: RetrofitFlags::of_parcel(p),
            note: p.note.clone(),
        });
    }

    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledParcel {
    pub parcel_id: i64,
    pub accepts_contacts: bool,
}

/// Every enrolled parcel with its contact gate, for the map overlay.
pub async fn enrolled(db: &DatabaseConnection) -> Result<Vec<EnrolledParcel>, ApiError> {
    let parcels = parcel::Entity::find()
        .order_by_asc(parcel::Column::Id)
        .all(db)
        .await?;

    Ok(parcels
        .iter()
        .map(|p| EnrolledParcel {
            parcel_id: p.parcel_id,
            accepts_contacts: p.accepts_contacts,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_add_leaves_list_unchanged() {
        let mut ids = vec![3, 8];
        assert!(insert_sorted(&mut ids, 5));
        assert!(!insert_sorted(&mut ids, 5));
        assert_eq!(ids, vec![3, 5, 8]);
    }

    #[test]
    fn remove_of_absent_id_is_not_an_error() {
        let mut ids = vec![1, 2];
        assert!(!remove_sorted(&mut ids, 99));
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn list_stays_strictly_ascending() {
        let mut ids = Vec::new();
        for id in [42, 7, 19, 7, 42, 1] {
            insert_sorted(&mut ids, id);
        }
        assert_eq!(ids, vec![1, 7, 19, 42]);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn saved_ids_codec_tolerates_empty_column() {
        assert_eq!(decode_saved_ids(""), Vec::<i64>::new());
        assert_eq!(decode_saved_ids("[1,5,9]"), vec![1, 5, 9]);
        assert_eq!(encode_saved_ids(&[2, 4]), "[2,4]");
    }

    #[test]
    fn malformed_parcel_id_is_a_validation_error() {
        assert!(matches!(
            parse_parcel_id("abc"),
            Err(ApiError::Validation(_))
        ));
        assert_eq!(parse_parcel_id(" 17 ").unwrap(), 17);
    }
}
