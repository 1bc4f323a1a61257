pub mod accounts;
pub mod health;
pub mod notifications;
pub mod transactions;
pub mod users;
