use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use thiserror::Error;

/// The kind of balance mutation a ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum TransactionKind {
    #[sea_orm(string_value = "DEPOSITO")]
    Deposit,
    #[sea_orm(string_value = "RETIRO")]
    Withdrawal,
}

impl TransactionKind {
    /// The code used on the wire and in the database.
    pub fn code(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSITO",
            TransactionKind::Withdrawal => "RETIRO",
        }
    }

    /// Human readable label.
    pub fn description(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "Deposit",
            TransactionKind::Withdrawal => "Withdrawal",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transaction kind '{0}', expected DEPOSITO or RETIRO")]
pub struct ParseTransactionKindError(pub String);

impl FromStr for TransactionKind {
    type Err = ParseTransactionKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEPOSITO" => Ok(TransactionKind::Deposit),
            "RETIRO" => Ok(TransactionKind::Withdrawal),
            _ => Err(ParseTransactionKindError(s.to_string())),
        }
    }
}

/// An immutable ledger entry.
///
/// `resulting_balance` is a snapshot of the account balance right after the
/// mutation was applied, not a value recomputed from earlier entries.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transacciones")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub kind: TransactionKind,
    /// Always positive; the direction is given by `kind`.
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub resulting_balance: Decimal,
    pub note: Option<String>,
    pub created_at: DateTime,
    #[sea_orm(column_name = "cuenta_id")]
    pub account_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing_is_case_insensitive() {
        assert_eq!("deposito".parse::<TransactionKind>(), Ok(TransactionKind::Deposit));
        assert_eq!("RETIRO".parse::<TransactionKind>(), Ok(TransactionKind::Withdrawal));
        assert_eq!(" Retiro ".parse::<TransactionKind>(), Ok(TransactionKind::Withdrawal));
    }

    #[test]
    fn test_kind_parsing_rejects_unknown_codes() {
        let err = "transfer".parse::<TransactionKind>().unwrap_err();
        assert_eq!(err, ParseTransactionKindError("transfer".to_string()));
    }

    #[test]
    fn test_kind_display_matches_code() {
        assert_eq!(TransactionKind::Deposit.to_string(), "DEPOSITO");
        assert_eq!(TransactionKind::Withdrawal.description(), "Withdrawal");
    }
}
