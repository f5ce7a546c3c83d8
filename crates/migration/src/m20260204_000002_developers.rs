use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Developers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Developers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Developers::Email).string().not_null())
                    .col(ColumnDef::new(Developers::Name).string().not_null())
                    .col(ColumnDef::new(Developers::Phone).string().not_null())
                    .col(ColumnDef::new(Developers::IsStaff).boolean().not_null())
                    .col(ColumnDef::new(Developers::Status).integer().not_null())
                    .col(ColumnDef::new(Developers::ApprovedAt).big_integer())
                    .col(ColumnDef::new(Developers::DeniedAt).big_integer())
                    .col(ColumnDef::new(Developers::DeactivatedAt).big_integer())
                    .col(
                        ColumnDef::new(Developers::ReasonForDenial)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Developers::CompanyName).string().not_null())
                    .col(ColumnDef::new(Developers::CompanyEmail).string().not_null())
                    .col(ColumnDef::new(Developers::CompanyPhone).string().not_null())
                    .col(
                        ColumnDef::new(Developers::CompanyWebsite)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Developers::RainGarden).boolean().not_null())
                    .col(
                        ColumnDef::new(Developers::SubsurfaceStorage)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Developers::GreenRoof).boolean().not_null())
                    .col(
                        ColumnDef::new(Developers::PermeablePavement)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Developers::Cistern).boolean().not_null())
                    .col(
                        ColumnDef::new(Developers::OtherRetrofit)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Developers::Ein).string().not_null())
                    .col(
                        ColumnDef::new(Developers::CommercialActivityLicense)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Developers::HasGrantApproval)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Developers::EmailParcelUpdates)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Developers::IsDesignFirm)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Developers::IsConstructionFirm)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Developers::IsMaintenanceFirm)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Developers::SavedParcelIds)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Developers::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Developers::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx_developers_email")
                    .table(Developers::Table)
                    .col(Developers::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Developers::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Developers {
    Table,
    Id,
    Email,
    Name,
    Phone,
    IsStaff,
    Status,
    ApprovedAt,
    DeniedAt,
    DeactivatedAt,
    ReasonForDenial,
    CompanyName,
    CompanyEmail,
    CompanyPhone,
    CompanyWebsite,
    RainGarden,
    SubsurfaceStorage,
    GreenRoof,
    PermeablePavement,
    Cistern,
    OtherRetrofit,
    Ein,
    CommercialActivityLicense,
    HasGrantApproval,
    EmailParcelUpdates,
    IsDesignFirm,
    IsConstructionFirm,
    IsMaintenanceFirm,
    SavedParcelIds,
    CreatedAt,
    UpdatedAt,
}
