use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Users
        manager
            .create_table(
                Table::create()
                    .table(Usuarios::Table)
                    .if_not_exists()
                    .col(pk_auto(Usuarios::Id))
                    .col(string_len(Usuarios::Email, 255).unique_key())
                    .col(string_len(Usuarios::Name, 100))
                    .col(string(Usuarios::PasswordHash))
                    .col(boolean(Usuarios::Active).default(true))
                    .col(date_time(Usuarios::RegisteredAt))
                    .to_owned(),
            )
            .await?;

        // Accounts, optionally owned by a user
        manager
            .create_table(
                Table::create()
                    .table(Cuentas::Table)
                    .if_not_exists()
                    .col(pk_auto(Cuentas::Id))
                    .col(string_len(Cuentas::AccountNumber, 50).unique_key())
                    .col(string_len(Cuentas::Holder, 100))
                    .col(decimal_len(Cuentas::Balance, 15, 2))
                    .col(boolean(Cuentas::Active).default(true))
                    .col(integer_null(Cuentas::UsuarioId))
                    .col(date_time(Cuentas::CreatedAt))
                    .col(date_time(Cuentas::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cuenta_usuario")
                            .from(Cuentas::Table, Cuentas::UsuarioId)
                            .to(Usuarios::Table, Usuarios::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Ledger entries
        manager
            .create_table(
                Table::create()
                    .table(Transacciones::Table)
                    .if_not_exists()
                    .col(pk_auto(Transacciones::Id))
                    .col(string_len(Transacciones::Kind, 20))
                    .col(decimal_len(Transacciones::Amount, 15, 2))
                    .col(decimal_len(Transacciones::ResultingBalance, 15, 2))
                    .col(string_len_null(Transacciones::Note, 500))
                    .col(date_time(Transacciones::CreatedAt))
                    .col(integer(Transacciones::CuentaId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaccion_cuenta")
                            .from(Transacciones::Table, Transacciones::CuentaId)
                            .to(Cuentas::Table, Cuentas::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transacciones_cuenta_fecha")
                    .table(Transacciones::Table)
                    .col(Transacciones::CuentaId)
                    .col(Transacciones::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Notifications
        manager
            .create_table(
                Table::create()
                    .table(Notificaciones::Table)
                    .if_not_exists()
                    .col(pk_auto(Notificaciones::Id))
                    .col(string_len(Notificaciones::Message, 500))
                    .col(string_len(Notificaciones::Category, 50))
                    .col(boolean(Notificaciones::IsRead).default(false))
                    .col(date_time(Notificaciones::CreatedAt))
                    .col(integer(Notificaciones::UsuarioId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notificacion_usuario")
                            .from(Notificaciones::Table, Notificaciones::UsuarioId)
                            .to(Usuarios::Table, Usuarios::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notificaciones_usuario")
                    .table(Notificaciones::Table)
                    .col(Notificaciones::UsuarioId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notificaciones::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transacciones::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cuentas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Usuarios::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Usuarios {
    Table,
    Id,
    Email,
    Name,
    PasswordHash,
    Active,
    RegisteredAt,
}

#[derive(DeriveIden)]
enum Cuentas {
    Table,
    Id,
    AccountNumber,
    Holder,
    Balance,
    Active,
    UsuarioId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Transacciones {
    Table,
    Id,
    Kind,
    Amount,
    ResultingBalance,
    Note,
    CreatedAt,
    CuentaId,
}

#[derive(DeriveIden)]
enum Notificaciones {
    Table,
    Id,
    Message,
    Category,
    IsRead,
    CreatedAt,
    UsuarioId,
}
