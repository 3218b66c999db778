//! SQLite backend through Sea-ORM

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Database, DatabaseConnection, DbErr, EntityTrait, NotSet,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::PhotoBackend;
use crate::entities::photostate;
use crate::error::{Result, StoreError};
use crate::migration::Migrator;
use crate::types::StoredPhoto;

/// Durable photo table in a SQLite database
///
/// The connection is opened and migrated on first use and then shared for
/// the lifetime of the backend.
#[derive(Debug)]
pub struct SqliteBackend {
    url: String,
    db: OnceCell<DatabaseConnection>,
}

impl SqliteBackend {
    /// Backend for a Sea-ORM database URL such as `sqlite:photos.db?mode=rwc`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            db: OnceCell::new(),
        }
    }

    /// Backend for a database file, created if missing
    pub fn from_path(path: &Path) -> Self {
        Self::new(sqlite_url(path))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn connection(&self) -> Result<&DatabaseConnection> {
        self.db
            .get_or_try_init(|| async {
                let db = Database::connect(self.url.as_str()).await.map_err(|source| {
                    StoreError::StoreUnavailable {
                        url: self.url.clone(),
                        source,
                    }
                })?;

                Migrator::up(&db, None)
                    .await
                    .map_err(|source| StoreError::StoreUnavailable {
                        url: self.url.clone(),
                        source,
                    })?;

                info!("Photo store opened at {}", self.url);
                Ok(db)
            })
            .await
    }
}

/// Render a database file path as a Sea-ORM SQLite URL
pub(crate) fn sqlite_url(path: &Path) -> String {
    format!(
        "sqlite:{}?mode=rwc",
        path.to_string_lossy().replace('\\', "/")
    )
}

impl TryFrom<photostate::Model> for StoredPhoto {
    type Error = DbErr;

    fn try_from(model: photostate::Model) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: Some(model.id),
            sync_operation: model
                .sync_operation
                .parse()
                .map_err(|e| DbErr::Type(format!("{e}")))?,
            file_name: model.file_name,
            mime: model.mime,
            payload: model.payload,
            is_on_s3: model.is_on_s3,
            is_stored_by_user: model.is_stored_by_user,
            expiration_date: model.expiration_date,
        })
    }
}

fn to_active_model(record: StoredPhoto) -> photostate::ActiveModel {
    photostate::ActiveModel {
        id: NotSet,
        file_name: Set(record.file_name),
        mime: Set(record.mime),
        payload: Set(record.payload),
        is_on_s3: Set(record.is_on_s3),
        sync_operation: Set(record.sync_operation.as_str().to_string()),
        is_stored_by_user: Set(record.is_stored_by_user),
        expiration_date: Set(record.expiration_date),
    }
}

fn map_write_err(err: DbErr, file_name: &str) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            StoreError::UniqueConstraintViolation(file_name.to_string())
        }
        _ => StoreError::Database(err),
    }
}

fn into_records(models: Vec<photostate::Model>) -> Result<Vec<StoredPhoto>> {
    models
        .into_iter()
        .map(|m| StoredPhoto::try_from(m).map_err(StoreError::from))
        .collect()
}

#[async_trait]
impl PhotoBackend for SqliteBackend {
    async fn open(&self) -> Result<()> {
        self.connection().await.map(|_| ())
    }

    async fn get_by_file_name(&self, file_name: &str) -> Result<Option<StoredPhoto>> {
        let db = self.connection().await?;

        let model = photostate::Entity::find()
            .filter(photostate::Column::FileName.eq(file_name))
            .one(db)
            .await?;

        Ok(model.map(StoredPhoto::try_from).transpose()?)
    }

    async fn insert(&self, record: StoredPhoto) -> Result<i64> {
        let db = self.connection().await?;
        let file_name = record.file_name.clone();

        let result = photostate::Entity::insert(to_active_model(record))
            .exec(db)
            .await
            .map_err(|e| map_write_err(e, &file_name))?;

        debug!("Inserted {} as row {}", file_name, result.last_insert_id);
        Ok(result.last_insert_id)
    }

    async fn replace(&self, record: StoredPhoto) -> Result<i64> {
        let db = self.connection().await?;
        let file_name = record.file_name.clone();

        // Single upsert on the unique index, so a concurrent insert or delete
        // of the same name cannot slip between lookup and write
        let on_conflict = OnConflict::column(photostate::Column::FileName)
            .update_columns([
                photostate::Column::Mime,
                photostate::Column::Payload,
                photostate::Column::IsOnS3,
                photostate::Column::SyncOperation,
                photostate::Column::IsStoredByUser,
                photostate::Column::ExpirationDate,
            ])
            .to_owned();

        photostate::Entity::insert(to_active_model(record))
            .on_conflict(on_conflict)
            .exec(db)
            .await
            .map_err(|e| map_write_err(e, &file_name))?;

        // The upserted row keeps its original key
        let id = photostate::Entity::find()
            .select_only()
            .column(photostate::Column::Id)
            .filter(photostate::Column::FileName.eq(file_name.as_str()))
            .into_tuple::<i64>()
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(file_name.clone()))?;

        debug!("Replaced {} in row {}", file_name, id);
        Ok(id)
    }

    async fn delete_by_file_name(&self, file_name: &str) -> Result<bool> {
        let db = self.connection().await?;

        let id = photostate::Entity::find()
            .select_only()
            .column(photostate::Column::Id)
            .filter(photostate::Column::FileName.eq(file_name))
            .into_tuple::<i64>()
            .one(db)
            .await?;

        match id {
            Some(id) => self.delete_by_id(id).await,
            None => Ok(false),
        }
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool> {
        let db = self.connection().await?;

        let result = photostate::Entity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn range_by_file_name(
        &self,
        lower: &str,
        upper: Option<&str>,
    ) -> Result<Vec<StoredPhoto>> {
        let db = self.connection().await?;

        let mut query =
            photostate::Entity::find().filter(photostate::Column::FileName.gte(lower));
        if let Some(upper) = upper {
            query = query.filter(photostate::Column::FileName.lt(upper));
        }

        let models = query
            .order_by_asc(photostate::Column::FileName)
            .all(db)
            .await?;

        into_records(models)
    }

    async fn cursor_by_file_name(
        &self,
        after: Option<&str>,
        limit: u64,
    ) -> Result<Vec<StoredPhoto>> {
        let db = self.connection().await?;

        let mut query = photostate::Entity::find();
        if let Some(after) = after {
            query = query.filter(photostate::Column::FileName.gt(after));
        }

        let models = query
            .order_by_asc(photostate::Column::FileName)
            .limit(limit)
            .all(db)
            .await?;

        into_records(models)
    }

    async fn cursor_by_id(&self, after: Option<i64>, limit: u64) -> Result<Vec<StoredPhoto>> {
        let db = self.connection().await?;

        let mut query = photostate::Entity::find();
        if let Some(after) = after {
            query = query.filter(photostate::Column::Id.gt(after));
        }

        let models = query
            .order_by_asc(photostate::Column::Id)
            .limit(limit)
            .all(db)
            .await?;

        into_records(models)
    }

    async fn range_by_expiration(&self, before: i64) -> Result<Vec<String>> {
        let db = self.connection().await?;

        let names = photostate::Entity::find()
            .select_only()
            .column(photostate::Column::FileName)
            .filter(photostate::Column::ExpirationDate.lt(before))
            .order_by_asc(photostate::Column::ExpirationDate)
            .into_tuple::<String>()
            .all(db)
            .await?;

        Ok(names)
    }

    async fn count(&self) -> Result<u64> {
        let db = self.connection().await?;
        Ok(photostate::Entity::find().count(db).await?)
    }
}
