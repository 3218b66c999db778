use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Photostate::Table)
                    .if_not_exists()
                    .col(pk_auto(Photostate::Id))
                    .col(string_uniq(Photostate::FileName))
                    .col(string(Photostate::Mime))
                    .col(ColumnDef::new(Photostate::Payload).blob().not_null())
                    .col(
                        ColumnDef::new(Photostate::IsOnS3)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Photostate::SyncOperation)
                            .string()
                            .not_null()
                            .default("insert"),
                    )
                    .col(
                        ColumnDef::new(Photostate::IsStoredByUser)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(big_integer(Photostate::ExpirationDate))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Photostate::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Photostate {
    Table,
    Id,
    FileName,
    Mime,
    Payload,
    #[sea_orm(iden = "is_on_s3")]
    IsOnS3,
    SyncOperation,
    IsStoredByUser,
    ExpirationDate,
}
