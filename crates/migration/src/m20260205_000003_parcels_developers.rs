use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // parcels_developers join table (selected-developer list).
        manager
            .create_table(
                Table::create()
                    .table(ParcelsDevelopers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParcelsDevelopers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ParcelsDevelopers::ParcelId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParcelsDevelopers::DeveloperId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParcelsDevelopers::Position)
                            .integer()
                            .not_null(),
                    )
                    .index(
                        Index::create()
                            .name("uidx_parcels_developers_parcel_developer")
                            .col(ParcelsDevelopers::ParcelId)
                            .col(ParcelsDevelopers::DeveloperId)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parcels_developers_parcel_id")
                            .from(ParcelsDevelopers::Table, ParcelsDevelopers::ParcelId)
                            .to(Parcels::Table, Parcels::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parcels_developers_developer_id")
                            .from(ParcelsDevelopers::Table, ParcelsDevelopers::DeveloperId)
                            .to(Developers::Table, Developers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parcels_developers_parcel_id")
                    .table(ParcelsDevelopers::Table)
                    .col(ParcelsDevelopers::ParcelId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parcels_developers_developer_id")
                    .table(ParcelsDevelopers::Table)
                    .col(ParcelsDevelopers::DeveloperId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParcelsDevelopers::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Parcels {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Developers {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ParcelsDevelopers {
    Table,
    Id,
    ParcelId,
    DeveloperId,
    Position,
}
