use crate::handlers::{
    accounts::{
        create_account, delete_account, get_account, get_account_by_number,
        get_account_statistics, get_accounts, get_accounts_above_average,
        get_accounts_by_balance, get_active_accounts, search_accounts, update_account,
    },
    health::health_check,
    notifications::{
        count_unread_notifications, create_notification, delete_notification, get_notification,
        get_unread_notifications, get_user_notifications, mark_all_as_read, mark_as_read,
        notify_low_balance, notify_transaction,
    },
    transactions::{
        deposit, get_account_deposit_total, get_account_transaction_statistics,
        get_account_transactions, get_account_transactions_by_kind,
        get_account_withdrawal_total, get_global_statistics, get_recent_transactions,
        get_transaction, get_transactions, get_transactions_by_kind, withdraw,
    },
    users::{
        activate_user, change_password, deactivate_user, get_user, get_users, login,
        register_user, update_user,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let timeout = state.settings.request_timeout();

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Accounts
        .route("/cuentas", post(create_account).get(get_accounts))
        .route("/cuentas/estadisticas", get(get_account_statistics))
        .route("/cuentas/ordenadas/saldo", get(get_accounts_by_balance))
        .route("/cuentas/superior-promedio", get(get_accounts_above_average))
        .route("/cuentas/activas", get(get_active_accounts))
        .route("/cuentas/buscar", get(search_accounts))
        .route("/cuentas/numero/:numero", get(get_account_by_number))
        .route(
            "/cuentas/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
        // Deposits, withdrawals and the ledger
        .route("/transacciones", get(get_transactions))
        .route("/transacciones/deposito", post(deposit))
        .route("/transacciones/retiro", post(withdraw))
        .route("/transacciones/recientes", get(get_recent_transactions))
        .route("/transacciones/estadisticas/globales", get(get_global_statistics))
        .route(
            "/transacciones/estadisticas/cuenta/:cuenta_id",
            get(get_account_transaction_statistics),
        )
        .route("/transacciones/depositos/cuenta/:cuenta_id", get(get_account_deposit_total))
        .route("/transacciones/retiros/cuenta/:cuenta_id", get(get_account_withdrawal_total))
        .route("/transacciones/tipo/:tipo", get(get_transactions_by_kind))
        .route("/transacciones/cuenta/:cuenta_id", get(get_account_transactions))
        .route(
            "/transacciones/cuenta/:cuenta_id/tipo/:tipo",
            get(get_account_transactions_by_kind),
        )
        .route("/transacciones/:id", get(get_transaction))
        // Users
        .route("/api/usuarios", get(get_users))
        .route("/api/usuarios/registro", post(register_user))
        .route("/api/usuarios/login", post(login))
        .route("/api/usuarios/:id", get(get_user).put(update_user))
        .route("/api/usuarios/:id/password", put(change_password))
        .route("/api/usuarios/:id/desactivar", put(deactivate_user))
        .route("/api/usuarios/:id/activar", put(activate_user))
        // Notifications
        .route("/api/notificaciones", post(create_notification))
        .route("/api/notificaciones/transaccion", post(notify_transaction))
        .route("/api/notificaciones/saldo-bajo", post(notify_low_balance))
        .route("/api/notificaciones/usuario/:usuario_id", get(get_user_notifications))
        .route(
            "/api/notificaciones/usuario/:usuario_id/no-leidas",
            get(get_unread_notifications),
        )
        .route(
            "/api/notificaciones/usuario/:usuario_id/contar-no-leidas",
            get(count_unread_notifications),
        )
        .route(
            "/api/notificaciones/usuario/:usuario_id/leer-todas",
            put(mark_all_as_read),
        )
        .route(
            "/api/notificaciones/:id",
            get(get_notification).delete(delete_notification),
        )
        .route("/api/notificaciones/:id/leer", put(mark_as_read))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
