use sea_orm::entity::prelude::*;

/// Category tag of notifications produced after a deposit.
pub const CATEGORY_DEPOSIT: &str = "TRANSACCION_DEPOSITO";
/// Category tag of notifications produced after a withdrawal.
pub const CATEGORY_WITHDRAWAL: &str = "TRANSACCION_RETIRO";
/// Category tag of low-balance warnings.
pub const CATEGORY_LOW_BALANCE: &str = "SALDO_BAJO";

/// A message addressed to a user. The category is a free-form tag.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notificaciones")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub message: String,
    pub category: String,
    #[sea_orm(default_value = "false")]
    pub is_read: bool,
    pub created_at: DateTime,
    #[sea_orm(column_name = "usuario_id")]
    pub user_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
