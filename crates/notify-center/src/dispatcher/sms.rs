//! 短信投递
//!
//! 短信方式可被渠道声明但当前未接入网关，调度时一律跳过。

use async_trait::async_trait;

use super::{DeliveryChannel, DeliveryContext};
use crate::error::{CenterError, Result};
use crate::types::{DeliveryMethod, NotificationRecord};

/// 短信渠道（未接入）
pub struct SmsChannel;

impl SmsChannel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SmsChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryChannel for SmsChannel {
    fn method(&self) -> DeliveryMethod {
        DeliveryMethod::Sms
    }

    fn name(&self) -> &str {
        "sms"
    }

    fn is_available(&self, _ctx: &DeliveryContext) -> bool {
        false
    }

    async fn send(&self, _record: &NotificationRecord, _ctx: &DeliveryContext) -> Result<()> {
        Err(CenterError::MethodUnavailable {
            method: "SMS".to_string(),
            reason: "短信网关未接入".to_string(),
        })
    }
}
