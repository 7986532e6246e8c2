//! 统一错误处理模块
//!
//! 定义通知中心所有共享的错误类型，使用 thiserror 提供良好的错误信息。

use thiserror::Error;

/// 系统错误类型
#[derive(Debug, Error)]
pub enum NotifyError {
    // ==================== 查找错误 ====================
    #[error("记录未找到: {entity} id={id}")]
    NotFound { entity: String, id: String },

    #[error("记录已存在: {entity} {field}={value}")]
    AlreadyExists {
        entity: String,
        field: String,
        value: String,
    },

    // ==================== 验证错误 ====================
    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error("无效的参数: {field} - {message}")]
    InvalidField { field: String, message: String },

    // ==================== 投递错误 ====================
    #[error("权限不足: 渠道={channel}, 原因={reason}")]
    PermissionDenied { channel: String, reason: String },

    #[error("功能未配置: {feature} - {reason}")]
    NotConfigured { feature: String, reason: String },

    #[error("投递暂时失败: 渠道={channel}, 原因={reason}")]
    TransientDelivery { channel: String, reason: String },

    // ==================== 存储错误 ====================
    #[error("存储错误: {0}")]
    Storage(String),

    #[error("序列化失败: {0}")]
    Serialization(String),

    // ==================== 通用错误 ====================
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, NotifyError>;

impl NotifyError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidField { .. } => "INVALID_FIELD",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::NotConfigured { .. } => "NOT_CONFIGURED",
            Self::TransientDelivery { .. } => "TRANSIENT_DELIVERY",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否为可重试错误
    ///
    /// 暂时性投递失败和存储错误可在下一轮处理时重试；
    /// 权限和配置错误需要用户介入，重试无意义。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientDelivery { .. } | Self::Storage(_))
    }
}

impl From<serde_json::Error> for NotifyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for NotifyError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = NotifyError::NotFound {
            entity: "NotificationChannel".to_string(),
            id: "ch-123".to_string(),
        };
        assert_eq!(err.code(), "NOT_FOUND");

        let err = NotifyError::PermissionDenied {
            channel: "PUSH".to_string(),
            reason: "推送权限未授予".to_string(),
        };
        assert_eq!(err.code(), "PERMISSION_DENIED");
    }

    #[test]
    fn test_is_retryable() {
        let transient = NotifyError::TransientDelivery {
            channel: "EMAIL".to_string(),
            reason: "网络超时".to_string(),
        };
        assert!(transient.is_retryable());

        let denied = NotifyError::PermissionDenied {
            channel: "PUSH".to_string(),
            reason: "denied".to_string(),
        };
        assert!(!denied.is_retryable());

        let not_found = NotifyError::NotFound {
            entity: "NotificationTemplate".to_string(),
            id: "tpl-1".to_string(),
        };
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = NotifyError::TransientDelivery {
            channel: "EMAIL".to_string(),
            reason: "连接被重置".to_string(),
        };
        assert_eq!(err.to_string(), "投递暂时失败: 渠道=EMAIL, 原因=连接被重置");
    }
}
