use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // urls 表：id 自增即短链接标识
        manager
            .create_table(
                Table::create()
                    .table(Urls::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Urls::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Urls::FullUrl).text().not_null())
                    .col(ColumnDef::new(Urls::UserToken).text().null())
                    .col(ColumnDef::new(Urls::CorrelationId).text().null())
                    .to_owned(),
            )
            .await?;

        // full_url 唯一索引，去重和并发插入都依赖它
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("urls_full_url_uindex")
                    .table(Urls::Table)
                    .col(Urls::FullUrl)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 按用户列出链接
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_urls_user_token")
                    .table(Urls::Table)
                    .col(Urls::UserToken)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_urls_user_token").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("urls_full_url_uindex").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Urls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Urls {
    Table,
    Id,
    FullUrl,
    UserToken,
    CorrelationId,
}
