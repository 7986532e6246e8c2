//! 邮件投递
//!
//! 模拟邮件发送。前置条件：邮件投递已启用且地址已验证，
//! 否则投递失败并记录配置错误。瞬时失败（如网关超时）
//! 返回可重试错误，由队列处理在下一轮重新投递。

use async_trait::async_trait;
use tracing::{debug, instrument};

use notify_shared::error::NotifyError;

use super::{DeliveryChannel, DeliveryContext};
use crate::error::{CenterError, Result};
use crate::types::{DeliveryMethod, NotificationRecord};

/// 邮件渠道
pub struct EmailChannel;

impl EmailChannel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EmailChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryChannel for EmailChannel {
    fn method(&self) -> DeliveryMethod {
        DeliveryMethod::Email
    }

    fn name(&self) -> &str {
        "email"
    }

    fn is_available(&self, _ctx: &DeliveryContext) -> bool {
        true
    }

    #[instrument(skip(self, record, ctx), fields(notification_id = %record.id))]
    async fn send(&self, record: &NotificationRecord, ctx: &DeliveryContext) -> Result<()> {
        if !ctx.email.enabled {
            return Err(NotifyError::NotConfigured {
                feature: "email".to_string(),
                reason: "邮件投递未启用".to_string(),
            }
            .into());
        }
        if !ctx.email.verified {
            return Err(NotifyError::NotConfigured {
                feature: "email".to_string(),
                reason: "邮件地址未验证".to_string(),
            }
            .into());
        }

        // 故障注入标记：模拟网关瞬时失败
        if record.metadata.contains_key("simulateTransientEmail") {
            return Err(CenterError::TransientDelivery {
                method: "EMAIL".to_string(),
                reason: "模拟网关超时".to_string(),
            });
        }

        // 模拟邮件网关的网络往返
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        debug!(
            to = ?ctx.email.address,
            subject = %record.title,
            "邮件已发送"
        );

        Ok(())
    }
}
