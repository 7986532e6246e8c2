//! 推送投递
//!
//! 模拟系统级推送。前置条件：宿主环境支持推送且权限已授予，
//! 否则投递失败并记录权限错误。推送载荷以通知 id 作为 tag，
//! URGENT 通知要求用户交互后才消失。

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument};

use notify_shared::error::NotifyError;

use super::{DeliveryChannel, DeliveryContext};
use crate::error::Result;
use crate::types::{DeliveryMethod, NotificationPriority, NotificationRecord, PushPermission};

/// 推送载荷
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushPayload<'a> {
    title: &'a str,
    body: &'a str,
    /// 同 tag 的推送相互替换，避免同一通知重复弹出
    tag: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<&'a str>,
    require_interaction: bool,
}

/// 推送渠道
pub struct PushChannel;

impl PushChannel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PushChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryChannel for PushChannel {
    fn method(&self) -> DeliveryMethod {
        DeliveryMethod::Push
    }

    fn name(&self) -> &str {
        "push"
    }

    /// 宿主环境不支持推送时整体跳过
    fn is_available(&self, ctx: &DeliveryContext) -> bool {
        ctx.push_supported
    }

    #[instrument(skip(self, record, ctx), fields(notification_id = %record.id))]
    async fn send(&self, record: &NotificationRecord, ctx: &DeliveryContext) -> Result<()> {
        if ctx.push_permission != PushPermission::Granted {
            return Err(NotifyError::PermissionDenied {
                channel: "push".to_string(),
                reason: "推送权限未授予".to_string(),
            }
            .into());
        }

        // 故障注入标记，用于测试失败隔离
        if record.metadata.contains_key("simulatePushFailure") {
            return Err(NotifyError::Internal("模拟推送失败".to_string()).into());
        }

        let payload = PushPayload {
            title: &record.title,
            body: &record.message,
            tag: &record.id,
            icon: record.icon.as_deref(),
            require_interaction: record.priority == NotificationPriority::Urgent,
        };

        // 模拟系统推送的展示延迟
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let payload_json = serde_json::to_string(&payload).unwrap_or_default();
        debug!(
            payload = %payload_json,
            subscriptions = ctx.push_subscriptions.len(),
            "推送通知已展示"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NotificationType;

    fn granted() -> DeliveryContext {
        DeliveryContext {
            push_permission: PushPermission::Granted,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_push_requires_permission() {
        let channel = PushChannel::new();
        let record = NotificationRecord::new(NotificationType::Info, "t", "m");

        for permission in [PushPermission::Prompt, PushPermission::Denied] {
            let ctx = DeliveryContext {
                push_permission: permission,
                ..Default::default()
            };
            let err = channel.send(&record, &ctx).await.unwrap_err();
            assert_eq!(err.code(), "PERMISSION_DENIED");
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_push_unavailable_without_support() {
        let channel = PushChannel::new();
        let ctx = DeliveryContext {
            push_permission: PushPermission::Granted,
            push_supported: false,
            ..Default::default()
        };

        assert!(!channel.is_available(&ctx));
        assert!(channel.is_available(&granted()));
    }

    #[tokio::test]
    async fn test_push_delivers_when_granted() {
        let channel = PushChannel::new();
        let record = NotificationRecord::new(NotificationType::Info, "t", "m");

        assert!(channel.send(&record, &granted()).await.is_ok());
    }

    #[tokio::test]
    async fn test_push_failure_injection() {
        let channel = PushChannel::new();
        let record = NotificationRecord::new(NotificationType::Info, "t", "m")
            .with_metadata("simulatePushFailure", serde_json::Value::Bool(true));

        let err = channel.send(&record, &granted()).await.unwrap_err();
        assert!(!err.is_retryable());
    }
}
