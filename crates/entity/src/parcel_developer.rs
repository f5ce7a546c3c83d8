use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Selected-developer mapping (parcels_developers).
///
/// One row per developer currently subscribed to a parcel. The list is the
/// single source of truth for "who to notify on change" and is always read
/// and rewritten wholesale, ordered by `position`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parcels_developers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub parcel_id: i64,
    pub developer_id: i64,

    /// Preserves the submission order of the selected list.
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
