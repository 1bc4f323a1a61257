use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Aggregates over every account in the system.
///
/// `min_balance`, `max_balance` and `average_balance` are `None` when there
/// are no accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatistics {
    pub total_accounts: u64,
    pub active_accounts: u64,
    #[schema(value_type = String)]
    pub total_balance: Decimal,
    #[schema(value_type = String)]
    pub total_active_balance: Decimal,
    #[schema(value_type = Option<String>)]
    pub min_balance: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub max_balance: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub average_balance: Option<Decimal>,
}

/// Deposit and withdrawal totals for a single account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountTransactionStatistics {
    pub account_id: i32,
    #[schema(value_type = String)]
    pub total_deposits: Decimal,
    #[schema(value_type = String)]
    pub total_withdrawals: Decimal,
    pub transaction_count: u64,
}

/// Sum of one kind of movement for a single account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountKindTotal {
    pub account_id: i32,
    /// `DEPOSITO` or `RETIRO`
    pub kind: String,
    #[schema(value_type = String)]
    pub total: Decimal,
}

/// Deposit and withdrawal totals across the whole ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GlobalTransactionStatistics {
    #[schema(value_type = String)]
    pub total_deposits: Decimal,
    #[schema(value_type = String)]
    pub total_withdrawals: Decimal,
    pub transaction_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub user_id: i32,
    pub count: u64,
}
