//! 站内投递
//!
//! 把通知送入应用内通知列表并触发浮层提示。记录本身已由 Store
//! 持有，此处只负责提示侧的展示动作，因此永远可用、不会失败。

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{DeliveryChannel, DeliveryContext};
use crate::error::Result;
use crate::types::{DeliveryMethod, NotificationRecord};

/// 站内渠道
pub struct InAppChannel;

impl InAppChannel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InAppChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryChannel for InAppChannel {
    fn method(&self) -> DeliveryMethod {
        DeliveryMethod::InApp
    }

    fn name(&self) -> &str {
        "in_app"
    }

    fn is_available(&self, _ctx: &DeliveryContext) -> bool {
        true
    }

    #[instrument(skip(self, record, _ctx), fields(notification_id = %record.id))]
    async fn send(&self, record: &NotificationRecord, _ctx: &DeliveryContext) -> Result<()> {
        debug!(
            title = %record.title,
            priority = ?record.priority,
            sound = ?record.sound,
            "展示站内通知"
        );
        Ok(())
    }
}
