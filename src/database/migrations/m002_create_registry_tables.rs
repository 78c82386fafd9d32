use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Audit, soft-delete and validity columns carried by every registry table.
fn with_history_columns(table: &mut TableCreateStatement) -> &mut TableCreateStatement {
    table
        .col(ColumnDef::new(History::JsonExt).json())
        .col(ColumnDef::new(History::Version).integer().not_null().default(1))
        .col(
            ColumnDef::new(History::IsDeleted)
                .boolean()
                .not_null()
                .default(false),
        )
        .col(ColumnDef::new(History::DateCreated).timestamp().not_null())
        .col(ColumnDef::new(History::DateUpdated).timestamp().not_null())
        .col(ColumnDef::new(History::UserCreated).integer())
        .col(ColumnDef::new(History::UserUpdated).integer())
        .col(ColumnDef::new(History::DateValidFrom).timestamp().not_null())
        .col(ColumnDef::new(History::DateValidTo).timestamp())
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut individuals = Table::create();
        individuals
            .table(Individuals::Table)
            .if_not_exists()
            .col(ColumnDef::new(Individuals::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Individuals::FirstName).string().not_null())
            .col(ColumnDef::new(Individuals::LastName).string().not_null())
            .col(ColumnDef::new(Individuals::Dob).date().not_null());
        with_history_columns(&mut individuals);
        manager.create_table(individuals).await?;

        let mut groups = Table::create();
        groups
            .table(Groups::Table)
            .if_not_exists()
            .col(ColumnDef::new(Groups::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Groups::Code).string().not_null());
        with_history_columns(&mut groups);
        manager.create_table(groups).await?;

        let mut group_individuals = Table::create();
        group_individuals
            .table(GroupIndividuals::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(GroupIndividuals::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(GroupIndividuals::GroupId).uuid().not_null())
            .col(
                ColumnDef::new(GroupIndividuals::IndividualId)
                    .uuid()
                    .not_null(),
            )
            .col(ColumnDef::new(GroupIndividuals::Role).string())
            .col(ColumnDef::new(GroupIndividuals::RecipientType).string())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_group_individuals_group_id")
                    .from(GroupIndividuals::Table, GroupIndividuals::GroupId)
                    .to(Groups::Table, Groups::Id),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_group_individuals_individual_id")
                    .from(GroupIndividuals::Table, GroupIndividuals::IndividualId)
                    .to(Individuals::Table, Individuals::Id),
            );
        with_history_columns(&mut group_individuals);
        manager.create_table(group_individuals).await?;

        let mut uploads = Table::create();
        uploads
            .table(IndividualDataSourceUploads::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(IndividualDataSourceUploads::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(IndividualDataSourceUploads::SourceName)
                    .string()
                    .not_null(),
            )
            .col(
                ColumnDef::new(IndividualDataSourceUploads::SourceType)
                    .string()
                    .not_null(),
            )
            .col(
                ColumnDef::new(IndividualDataSourceUploads::Status)
                    .string()
                    .not_null()
                    .default("PENDING"),
            )
            .col(ColumnDef::new(IndividualDataSourceUploads::Error).json());
        with_history_columns(&mut uploads);
        manager.create_table(uploads).await?;

        let mut data_sources = Table::create();
        data_sources
            .table(IndividualDataSources::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(IndividualDataSources::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(IndividualDataSources::IndividualId).uuid())
            .col(ColumnDef::new(IndividualDataSources::UploadId).uuid())
            .col(ColumnDef::new(IndividualDataSources::Validations).json())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_individual_data_sources_individual_id")
                    .from(
                        IndividualDataSources::Table,
                        IndividualDataSources::IndividualId,
                    )
                    .to(Individuals::Table, Individuals::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_individual_data_sources_upload_id")
                    .from(IndividualDataSources::Table, IndividualDataSources::UploadId)
                    .to(
                        IndividualDataSourceUploads::Table,
                        IndividualDataSourceUploads::Id,
                    )
                    .on_delete(ForeignKeyAction::Cascade),
            );
        with_history_columns(&mut data_sources);
        manager.create_table(data_sources).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_individuals_group_id")
                    .table(GroupIndividuals::Table)
                    .col(GroupIndividuals::GroupId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_individuals_individual_id")
                    .table(GroupIndividuals::Table)
                    .col(GroupIndividuals::IndividualId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_groups_code")
                    .table(Groups::Table)
                    .col(Groups::Code)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_individual_data_sources_upload_id")
                    .table(IndividualDataSources::Table)
                    .col(IndividualDataSources::UploadId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IndividualDataSources::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(IndividualDataSourceUploads::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(GroupIndividuals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Individuals::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum History {
    JsonExt,
    Version,
    IsDeleted,
    DateCreated,
    DateUpdated,
    UserCreated,
    UserUpdated,
    DateValidFrom,
    DateValidTo,
}

#[derive(DeriveIden)]
enum Individuals {
    Table,
    Id,
    FirstName,
    LastName,
    Dob,
}

#[derive(DeriveIden)]
enum Groups {
    Table,
    Id,
    Code,
}

#[derive(DeriveIden)]
enum GroupIndividuals {
    Table,
    Id,
    GroupId,
    IndividualId,
    Role,
    RecipientType,
}

#[derive(DeriveIden)]
enum IndividualDataSourceUploads {
    Table,
    Id,
    SourceName,
    SourceType,
    Status,
    Error,
}

#[derive(DeriveIden)]
enum IndividualDataSources {
    Table,
    Id,
    IndividualId,
    UploadId,
    Validations,
}
