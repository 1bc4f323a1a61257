//! In-memory balance mutations.
//!
//! These functions only touch `account.balance`. Whether the account is
//! active and whether the change gets persisted is decided by
//! [`crate::ledger`].

use rust_decimal::Decimal;
use tracing::debug;

use model::entities::account;
use model::entities::transaction::TransactionKind;

use crate::error::{ComputeError, Result};

/// Decimal places kept by the `decimal(15,2)` money columns.
pub const MONEY_SCALE: u32 = 2;

/// Largest value a `decimal(15,2)` column holds: 13 integer digits.
pub const MAX_BALANCE: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, 2);

/// Checks that `amount` is positive and representable in a money column.
pub fn validate_amount(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO || !fits_money_column(amount) {
        return Err(ComputeError::InvalidAmount);
    }
    Ok(amount)
}

/// True when `value` has at most two significant decimal places and at most
/// 13 integer digits.
pub fn fits_money_column(value: Decimal) -> bool {
    value.normalize().scale() <= MONEY_SCALE && value.abs() <= MAX_BALANCE
}

/// Adds `amount` to the balance and returns the new balance.
///
/// Fails without touching the balance when the sum would not fit the money
/// column.
pub fn deposit(account: &mut account::Model, amount: Decimal) -> Result<Decimal> {
    validate_amount(amount)?;
    let balance = account
        .balance
        .checked_add(amount)
        .filter(|balance| *balance <= MAX_BALANCE)
        .ok_or(ComputeError::BalanceLimitExceeded { limit: MAX_BALANCE })?;
    account.balance = balance;
    debug!(account_id = account.id, %amount, balance = %account.balance, "Deposit applied");
    Ok(account.balance)
}

/// Subtracts `amount` from the balance and returns the new balance.
///
/// The balance is left untouched when it does not cover `amount`.
pub fn withdraw(account: &mut account::Model, amount: Decimal) -> Result<Decimal> {
    validate_amount(amount)?;
    if amount > account.balance {
        return Err(ComputeError::InsufficientFunds {
            balance: account.balance,
            requested: amount,
        });
    }
    account.balance -= amount;
    debug!(account_id = account.id, %amount, balance = %account.balance, "Withdrawal applied");
    Ok(account.balance)
}

pub fn apply(account: &mut account::Model, kind: TransactionKind, amount: Decimal) -> Result<Decimal> {
    match kind {
        TransactionKind::Deposit => deposit(account, amount),
        TransactionKind::Withdrawal => withdraw(account, amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn account_with(balance: Decimal) -> account::Model {
        let now = Utc::now().naive_utc();
        account::Model {
            id: 1,
            account_number: "ACC-001".to_string(),
            holder: "Test".to_string(),
            balance,
            active: true,
            owner_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_deposit_adds_exact_amount() {
        let mut account = account_with(Decimal::ZERO);
        let balance = deposit(&mut account, Decimal::new(2550, 2)).unwrap();
        assert_eq!(balance, Decimal::new(2550, 2));
        assert_eq!(account.balance, Decimal::new(2550, 2));
    }

    #[test]
    fn test_withdraw_subtracts_exact_amount() {
        let mut account = account_with(Decimal::new(5000, 2));
        let balance = withdraw(&mut account, Decimal::new(3000, 2)).unwrap();
        assert_eq!(balance, Decimal::new(2000, 2));
    }

    #[test]
    fn test_withdraw_whole_balance() {
        let mut account = account_with(Decimal::new(5000, 2));
        assert_eq!(withdraw(&mut account, Decimal::new(5000, 2)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_over_withdrawal_leaves_balance_untouched() {
        let mut account = account_with(Decimal::new(1000, 2));
        let err = withdraw(&mut account, Decimal::new(1001, 2)).unwrap_err();
        assert!(matches!(err, ComputeError::InsufficientFunds { .. }));
        assert_eq!(account.balance, Decimal::new(1000, 2));
    }

    #[test]
    fn test_non_positive_amounts_are_rejected() {
        let mut account = account_with(Decimal::new(1000, 2));
        for amount in [Decimal::ZERO, Decimal::new(-100, 2)] {
            assert!(matches!(deposit(&mut account, amount), Err(ComputeError::InvalidAmount)));
            assert!(matches!(withdraw(&mut account, amount), Err(ComputeError::InvalidAmount)));
        }
        assert_eq!(account.balance, Decimal::new(1000, 2));
    }

    #[test]
    fn test_sub_cent_amounts_are_rejected() {
        let mut account = account_with(Decimal::new(1000, 2));
        assert!(matches!(
            deposit(&mut account, Decimal::new(1, 3)),
            Err(ComputeError::InvalidAmount)
        ));
        assert!(matches!(
            withdraw(&mut account, Decimal::new(1005, 3)),
            Err(ComputeError::InvalidAmount)
        ));
        assert_eq!(account.balance, Decimal::new(1000, 2));

        // Trailing zeros are not extra precision
        assert_eq!(deposit(&mut account, Decimal::new(1000, 3)).unwrap(), Decimal::new(1100, 2));
    }

    #[test]
    fn test_max_balance_matches_column_precision() {
        assert_eq!(MAX_BALANCE, Decimal::from_str_exact("9999999999999.99").unwrap());
        assert!(fits_money_column(MAX_BALANCE));
        assert!(!fits_money_column(MAX_BALANCE + Decimal::new(1, 2)));
    }

    #[test]
    fn test_amounts_beyond_column_precision_are_rejected() {
        let mut account = account_with(Decimal::new(123456789012345, 2));
        assert!(matches!(
            deposit(&mut account, Decimal::new(9999999999999999, 2)),
            Err(ComputeError::InvalidAmount)
        ));
        assert_eq!(account.balance, Decimal::new(123456789012345, 2));
    }

    #[test]
    fn test_deposit_past_max_balance_is_rejected() {
        let mut account = account_with(MAX_BALANCE - Decimal::ONE);
        let err = deposit(&mut account, Decimal::new(101, 2)).unwrap_err();
        assert!(matches!(err, ComputeError::BalanceLimitExceeded { .. }));
        assert_eq!(account.balance, MAX_BALANCE - Decimal::ONE);

        assert_eq!(deposit(&mut account, Decimal::ONE).unwrap(), MAX_BALANCE);
    }

    #[test]
    fn test_apply_dispatches_on_kind() {
        let mut account = account_with(Decimal::new(1000, 2));
        apply(&mut account, TransactionKind::Deposit, Decimal::ONE).unwrap();
        apply(&mut account, TransactionKind::Withdrawal, Decimal::new(500, 2)).unwrap();
        assert_eq!(account.balance, Decimal::new(600, 2));
    }

    #[test]
    fn test_decimal_arithmetic_is_exact() {
        let mut account = account_with(Decimal::ZERO);
        for _ in 0..10 {
            deposit(&mut account, Decimal::new(10, 2)).unwrap();
        }
        assert_eq!(account.balance, Decimal::ONE);
    }
}
