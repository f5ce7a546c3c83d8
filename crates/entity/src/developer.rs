use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Approval status values for `Model::status`.
///
/// Transitions are staff-driven and linear; exactly one of the status
/// timestamps is meaningful at a time.
pub const STATUS_PENDING: i32 = 0;
pub const STATUS_DENIED: i32 = 1;
pub const STATUS_ACTIVE: i32 = 2;
pub const STATUS_DEACTIVATED: i32 = 3;

/// A retrofit developer (contractor) who can be selected on parcels.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "developers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(unique)]
    pub email: String,

    pub name: String,
    pub phone: String,

    pub is_staff: bool,

    /// Approval status (pending/denied/active/deactivated).
    pub status: i32,

    /// Unix timestamp (seconds).
    pub approved_at: Option<i64>,

    /// Unix timestamp (seconds).
    pub denied_at: Option<i64>,

    /// Unix timestamp (seconds).
    pub deactivated_at: Option<i64>,

    #[sea_orm(column_type = "Text")]
    pub reason_for_denial: String,

    pub company_name: String,
    pub company_email: String,
    pub company_phone: String,
    pub company_website: String,

    pub rain_garden: bool,
    pub subsurface_storage: bool,
    pub green_roof: bool,
    pub permeable_pavement: bool,
    pub cistern: bool,
    pub other_retrofit: String,

    pub ein: String,
    pub commercial_activity_license: String,

    pub has_grant_approval: bool,
    pub email_parcel_updates: bool,

    pub is_design_firm: bool,
    pub is_construction_firm: bool,
    pub is_maintenance_firm: bool,

    /// JSON array of bookmarked parcel identifiers, ascending and
    /// deduplicated.
    #[sea_orm(column_type = "Text")]
    pub saved_parcel_ids: String,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
