//! Transport-layer types shared between the `compute` crate and the HTTP
//! handlers. Everything here serializes to camelCase JSON, decimals as strings.

mod statistics;

pub use statistics::{
    AccountKindTotal, AccountStatistics, AccountTransactionStatistics,
    GlobalTransactionStatistics, UnreadCount,
};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by every successful endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    /// Wraps `data` in a successful envelope.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_envelope() {
        let response = ApiResponse::ok(vec![1, 2, 3], "Listed");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["message"], "Listed");
        assert_eq!(json["success"], true);

        let back: ApiResponse<Vec<i32>> = serde_json::from_value(json).unwrap();
        assert_eq!(back.data, vec![1, 2, 3]);
    }
}
