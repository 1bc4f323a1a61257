//! SeaORM entities for the savings backend.
//!
//! Table and foreign key column names are kept in Spanish (`cuentas`,
//! `transacciones`, `usuarios`, `notificaciones`, `cuenta_id`, `usuario_id`)
//! so existing databases keep working; the Rust side uses English names.

pub mod account;
pub mod notification;
pub mod transaction;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::account::Entity as Account;
    pub use super::notification::Entity as Notification;
    pub use super::transaction::Entity as Transaction;
    pub use super::user::Entity as User;
}
