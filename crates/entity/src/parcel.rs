use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single property listing, owned by one manager.
///
/// `parcel_id` is the external identifier used by the city parcel registry
/// and is unique system-wide, not merely per manager.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "parcels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(unique)]
    pub parcel_id: i64,

    pub manager_id: i64,

    pub address: String,
    pub building_type: String,

    pub rain_garden: bool,
    pub subsurface_storage: bool,
    pub green_roof: bool,
    pub permeable_pavement: bool,
    pub cistern: bool,

    #[sea_orm(column_type = "Text")]
    pub note: String,

    /// Gates whether developers may see or contact this parcel.
    pub accepts_contacts: bool,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
