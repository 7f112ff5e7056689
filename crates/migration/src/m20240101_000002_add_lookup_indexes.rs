use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Prestations: lookup by invoice number
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_prestations_invoice_number")
                    .table(Prestations::Table)
                    .col(Prestations::InvoiceNumber)
                    .to_owned(),
            )
            .await?;

        // Prestations: lookup by matricule
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_prestations_matricule")
                    .table(Prestations::Table)
                    .col(Prestations::Matricule)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_prestations_invoice_number").table(Prestations::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_prestations_matricule").table(Prestations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Prestations { Table, InvoiceNumber, Matricule }
