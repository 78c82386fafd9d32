use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MutationLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MutationLogs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(MutationLogs::ClientMutationId).string())
                    .col(ColumnDef::new(MutationLogs::ClientMutationLabel).string())
                    .col(ColumnDef::new(MutationLogs::MutationName).string().not_null())
                    .col(
                        ColumnDef::new(MutationLogs::Status)
                            .string()
                            .not_null()
                            .default("RECEIVED"),
                    )
                    .col(ColumnDef::new(MutationLogs::Error).text())
                    .col(ColumnDef::new(MutationLogs::UserId).integer())
                    .col(
                        ColumnDef::new(MutationLogs::RequestDateTime)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_mutation_logs_client_mutation_id")
                    .table(MutationLogs::Table)
                    .col(MutationLogs::ClientMutationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RecordMutations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecordMutations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RecordMutations::MutationId).uuid().not_null())
                    .col(ColumnDef::new(RecordMutations::EntityType).string().not_null())
                    .col(ColumnDef::new(RecordMutations::RecordId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_record_mutations_mutation_id")
                            .from(RecordMutations::Table, RecordMutations::MutationId)
                            .to(MutationLogs::Table, MutationLogs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_record_mutations_record")
                    .table(RecordMutations::Table)
                    .col(RecordMutations::EntityType)
                    .col(RecordMutations::RecordId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecordMutations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MutationLogs::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum MutationLogs {
    Table,
    Id,
    ClientMutationId,
    ClientMutationLabel,
    MutationName,
    Status,
    Error,
    UserId,
    RequestDateTime,
}

#[derive(DeriveIden)]
enum RecordMutations {
    Table,
    Id,
    MutationId,
    EntityType,
    RecordId,
}
