use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Managers table. Email and unsubscribe token are both lookup keys.
        manager
            .create_table(
                Table::create()
                    .table(Managers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Managers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Managers::Name).string().not_null())
                    .col(ColumnDef::new(Managers::Email).string().not_null())
                    .col(ColumnDef::new(Managers::Phone).string().not_null())
                    .col(ColumnDef::new(Managers::PreferEmail).boolean().not_null())
                    .col(ColumnDef::new(Managers::PreferPhone).boolean().not_null())
                    .col(
                        ColumnDef::new(Managers::UnsubscribeToken)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Managers::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Managers::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx_managers_email")
                    .table(Managers::Table)
                    .col(Managers::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx_managers_unsubscribe_token")
                    .table(Managers::Table)
                    .col(Managers::UnsubscribeToken)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Parcels table.
        manager
            .create_table(
                Table::create()
                    .table(Parcels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Parcels::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Parcels::ParcelId).big_integer().not_null())
                    .col(ColumnDef::new(Parcels::ManagerId).big_integer().not_null())
                    .col(ColumnDef::new(Parcels::Address).string().not_null())
                    .col(ColumnDef::new(Parcels::BuildingType).string().not_null())
                    .col(ColumnDef::new(Parcels::RainGarden).boolean().not_null())
                    .col(
                        ColumnDef::new(Parcels::SubsurfaceStorage)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Parcels::GreenRoof).boolean().not_null())
                    .col(
                        ColumnDef::new(Parcels::PermeablePavement)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Parcels::Cistern).boolean().not_null())
                    .col(ColumnDef::new(Parcels::Note).text().not_null())
                    .col(
                        ColumnDef::new(Parcels::AcceptsContacts)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Parcels::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Parcels::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parcels_manager_id")
                            .from(Parcels::Table, Parcels::ManagerId)
                            .to(Managers::Table, Managers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The external parcel id is unique system-wide, not just per manager.
        manager
            .create_index(
                Index::create()
                    .name("uidx_parcels_parcel_id")
                    .table(Parcels::Table)
                    .col(Parcels::ParcelId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Historical constraint: the pair is also unique, redundantly.
        manager
            .create_index(
                Index::create()
                    .name("uidx_parcels_parcel_id_manager_id")
                    .table(Parcels::Table)
                    .col(Parcels::ParcelId)
                    .col(Parcels::ManagerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parcels_manager_id")
                    .table(Parcels::Table)
                    .col(Parcels::ManagerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse dependency order.
        manager
            .drop_table(Table::drop().table(Parcels::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Managers::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Managers {
    Table,
    Id,
    Name,
    Email,
    Phone,
    PreferEmail,
    PreferPhone,
    UnsubscribeToken,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Parcels {
    Table,
    Id,
    ParcelId,
    ManagerId,
    Address,
    BuildingType,
    RainGarden,
    SubsurfaceStorage,
    GreenRoof,
    PermeablePavement,
    Cistern,
    Note,
    AcceptsContacts,
    CreatedAt,
    UpdatedAt,
}
