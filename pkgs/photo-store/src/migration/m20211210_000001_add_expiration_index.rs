use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Photostate {
    Table,
    ExpirationDate,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20211210_000001_add_expiration_index"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Non-unique: many captures share an expiration instant
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_photostate_expiration_date")
                    .table(Photostate::Table)
                    .col(Photostate::ExpirationDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_photostate_expiration_date")
                    .table(Photostate::Table)
                    .to_owned(),
            )
            .await
    }
}
