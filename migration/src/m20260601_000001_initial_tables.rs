use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UrlMapping::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UrlMapping::ShortCode)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UrlMapping::OriginalUrl).text().not_null())
                    .col(
                        ColumnDef::new(UrlMapping::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UrlMapping::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UrlMapping::ClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // Shorten requests dedupe by original URL
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_original_url")
                    .table(UrlMapping::Table)
                    .col(UrlMapping::OriginalUrl)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Expiry cleanup scans by expires_at
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_expires_at")
                    .table(UrlMapping::Table)
                    .col(UrlMapping::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SequenceCounter::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SequenceCounter::Name)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SequenceCounter::Seq)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SequenceCounter::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_expires_at").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_original_url").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UrlMapping::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum UrlMapping {
    #[sea_orm(iden = "url_mappings")]
    Table,
    ShortCode,
    OriginalUrl,
    CreatedAt,
    ExpiresAt,
    ClickCount,
}

#[derive(DeriveIden)]
enum SequenceCounter {
    #[sea_orm(iden = "sequence_counters")]
    Table,
    Name,
    Seq,
}
