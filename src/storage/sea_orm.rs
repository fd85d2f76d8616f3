//! sea-orm backed durable store
//!
//! Entities live in the `migration` crate; migrations run on connect so a
//! fresh database is usable immediately.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use migration::entities::{sequence_counter, url_mapping};
use migration::{Migrator, MigratorTrait};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, Database, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    TransactionTrait,
};
use tracing::{debug, info};

use crate::errors::{Result, SnaplinkError};
use crate::storage::{LinkStore, UrlMapping};

pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let db = Database::connect(url)
            .await
            .map_err(|e| SnaplinkError::database_connection(format!("connect '{url}': {e}")))?;

        Migrator::up(&db, None)
            .await
            .map_err(|e| SnaplinkError::database_operation(format!("migration failed: {e}")))?;

        info!("Durable store connected: {}", url);
        Ok(Self { db })
    }

    fn from_model(model: url_mapping::Model) -> UrlMapping {
        UrlMapping {
            short_code: model.short_code,
            original_url: model.original_url,
            created_at: model.created_at,
            expires_at: model.expires_at,
            click_count: model.click_count.max(0) as u64,
        }
    }
}

#[async_trait]
impl LinkStore for SeaOrmStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<UrlMapping>> {
        let found = url_mapping::Entity::find_by_id(code.to_string())
            .one(&self.db)
            .await?;
        Ok(found.map(Self::from_model))
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<UrlMapping>> {
        let found = url_mapping::Entity::find()
            .filter(url_mapping::Column::OriginalUrl.eq(url))
            .one(&self.db)
            .await?;
        Ok(found.map(Self::from_model))
    }

    async fn insert(&self, mapping: &UrlMapping) -> Result<()> {
        let model = url_mapping::ActiveModel {
            short_code: Set(mapping.short_code.clone()),
            original_url: Set(mapping.original_url.clone()),
            created_at: Set(mapping.created_at),
            expires_at: Set(mapping.expires_at),
            click_count: Set(mapping.click_count as i64),
        };

        url_mapping::Entity::insert(model)
            .exec(&self.db)
            .await
            .map_err(|e| {
                SnaplinkError::database_operation(format!(
                    "insert mapping '{}': {e}",
                    mapping.short_code
                ))
            })?;

        debug!("Mapping inserted: {}", mapping.short_code);
        Ok(())
    }

    async fn set_click_count(&self, code: &str, clicks: u64) -> Result<()> {
        let result = url_mapping::Entity::update_many()
            .col_expr(url_mapping::Column::ClickCount, Expr::value(clicks as i64))
            .filter(url_mapping::Column::ShortCode.eq(code))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(SnaplinkError::not_found(format!(
                "mapping '{code}' vanished before sync"
            )));
        }
        Ok(())
    }

    async fn increment_click(&self, code: &str) -> Result<()> {
        let result = url_mapping::Entity::update_many()
            .col_expr(
                url_mapping::Column::ClickCount,
                sea_orm::sea_query::ExprTrait::add(Expr::col(url_mapping::Column::ClickCount), 1),
            )
            .filter(url_mapping::Column::ShortCode.eq(code))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(SnaplinkError::not_found(format!("mapping '{code}' not found")));
        }
        Ok(())
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = url_mapping::Entity::delete_many()
            .filter(url_mapping::Column::ExpiresAt.lt(cutoff))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn ensure_counter(&self, name: &str) -> Result<()> {
        let model = sequence_counter::ActiveModel {
            name: Set(name.to_string()),
            seq: Set(0),
        };

        let result = sequence_counter::Entity::insert(model)
            .on_conflict(
                OnConflict::column(sequence_counter::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.db)
            .await;

        match result {
            Ok(_) => {
                info!("Sequence counter '{}' bootstrapped at 0", name);
                Ok(())
            }
            // Row already present; nothing to do
            Err(DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(SnaplinkError::database_operation(format!(
                "bootstrap counter '{name}': {e}"
            ))),
        }
    }

    async fn allocate_sequence_range(&self, name: &str, size: u64) -> Result<u64> {
        // UPDATE + SELECT inside one transaction is the portable equivalent
        // of findAndModify(inc, returnNew)
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SnaplinkError::allocation(format!("begin allocation txn: {e}")))?;

        let updated = sequence_counter::Entity::update_many()
            .col_expr(
                sequence_counter::Column::Seq,
                sea_orm::sea_query::ExprTrait::add(
                    Expr::col(sequence_counter::Column::Seq),
                    size as i64,
                ),
            )
            .filter(sequence_counter::Column::Name.eq(name))
            .exec(&txn)
            .await
            .map_err(|e| SnaplinkError::allocation(format!("increment counter '{name}': {e}")))?;

        if updated.rows_affected == 0 {
            let _ = txn.rollback().await;
            return Err(SnaplinkError::allocation(format!(
                "counter '{name}' missing; ensure_counter must run at startup"
            )));
        }

        let row = sequence_counter::Entity::find_by_id(name.to_string())
            .one(&txn)
            .await
            .map_err(|e| SnaplinkError::allocation(format!("read counter '{name}': {e}")))?
            .ok_or_else(|| {
                SnaplinkError::allocation(format!("counter '{name}' vanished mid-allocation"))
            })?;

        txn.commit()
            .await
            .map_err(|e| SnaplinkError::allocation(format!("commit allocation txn: {e}")))?;

        Ok(row.seq as u64)
    }

    async fn backend_name(&self) -> String {
        "sea-orm".to_string()
    }
}
