use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// A savings account.
///
/// The balance is never negative and is only changed through the ledger
/// writer in the `compute` crate; every change leaves a row in
/// `transacciones`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cuentas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Externally visible account number, distinct from `id`.
    #[sea_orm(unique)]
    pub account_number: String,
    /// Name of the account holder.
    pub holder: String,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub balance: Decimal,
    #[sea_orm(default_value = "true")]
    pub active: bool,
    /// The user who owns this account, if any. Notifications are only sent
    /// for owned accounts.
    #[sea_orm(column_name = "usuario_id")]
    pub owner_id: Option<i32>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Owner,
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transaction,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
