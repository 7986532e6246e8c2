//! 通知中心错误类型
//!
//! 在共享错误之上补充投递和渲染阶段特有的错误分类

use notify_shared::error::NotifyError;
use thiserror::Error;

/// 通知中心错误
#[derive(Debug, Error)]
pub enum CenterError {
    /// 共享层错误（存储、序列化、校验等）
    #[error(transparent)]
    Shared(#[from] NotifyError),

    /// 模板渲染失败
    #[error("模板渲染失败: {template_id}: {reason}")]
    TemplateRender { template_id: String, reason: String },

    /// 投递方式无可用传输（如未接入的短信网关）
    #[error("投递方式 {method} 不可用: {reason}")]
    MethodUnavailable { method: String, reason: String },

    /// 瞬时投递失败，下一轮队列处理时重试
    #[error("投递 {method} 瞬时失败: {reason}")]
    TransientDelivery { method: String, reason: String },

    /// 队列处理已在进行中
    #[error("队列处理已在进行中")]
    QueueBusy,
}

impl CenterError {
    /// 错误码，用于日志与事件载荷
    pub fn code(&self) -> &'static str {
        match self {
            Self::Shared(inner) => inner.code(),
            Self::TemplateRender { .. } => "TEMPLATE_RENDER",
            Self::MethodUnavailable { .. } => "METHOD_UNAVAILABLE",
            Self::TransientDelivery { .. } => "TRANSIENT_DELIVERY",
            Self::QueueBusy => "QUEUE_BUSY",
        }
    }

    /// 是否可重试
    ///
    /// 仅瞬时投递失败会被重新入队，其余错误直接记录后丢弃
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TransientDelivery { .. } => true,
            Self::Shared(inner) => inner.is_retryable(),
            _ => false,
        }
    }
}

/// 通知中心统一 Result 类型
pub type Result<T> = std::result::Result<T, CenterError>;
