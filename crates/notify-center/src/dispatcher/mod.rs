//! 投递调度
//!
//! 定义投递方式的统一抽象并把一条通知并行分发到多个投递方式。
//! 各投递方式相互隔离：单个方式失败不影响其他方式，失败信息
//! 以结果列表的形式返回给调用方统计。

pub mod email;
pub mod in_app;
pub mod push;
pub mod sms;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::types::{
    DeliveryMethod, EmailSettings, GlobalSettings, NotificationRecord, PushPermission,
    PushSubscription,
};

pub use email::EmailChannel;
pub use in_app::InAppChannel;
pub use push::PushChannel;
pub use sms::SmsChannel;

/// 投递上下文
///
/// 派发前对 Store 状态做的一次性快照，投递过程中不再回读共享状态
#[derive(Debug, Clone)]
pub struct DeliveryContext {
    pub settings: GlobalSettings,
    pub email: EmailSettings,
    pub push_permission: PushPermission,
    /// 宿主环境是否支持推送
    pub push_supported: bool,
    /// 已注册的推送订阅端点
    pub push_subscriptions: Vec<PushSubscription>,
}

impl Default for DeliveryContext {
    fn default() -> Self {
        Self {
            settings: GlobalSettings::default(),
            email: EmailSettings::default(),
            push_permission: PushPermission::default(),
            push_supported: true,
            push_subscriptions: Vec::new(),
        }
    }
}

/// 单次投递状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// 投递成功
    Delivered,
    /// 投递方式被跳过（未注册或不可用）
    Skipped,
    /// 投递失败
    Failed,
}

/// 单次投递结果
#[derive(Debug, Clone)]
pub struct DeliveryResult {
    pub method: DeliveryMethod,
    pub status: DeliveryStatus,
    /// 失败原因或跳过原因
    pub detail: Option<String>,
    /// 失败是否可在下一轮队列处理时重试
    pub retryable: bool,
}

impl DeliveryResult {
    pub fn delivered(method: DeliveryMethod) -> Self {
        Self {
            method,
            status: DeliveryStatus::Delivered,
            detail: None,
            retryable: false,
        }
    }

    pub fn skipped(method: DeliveryMethod, reason: impl Into<String>) -> Self {
        Self {
            method,
            status: DeliveryStatus::Skipped,
            detail: Some(reason.into()),
            retryable: false,
        }
    }

    pub fn failed(method: DeliveryMethod, error: &crate::error::CenterError) -> Self {
        Self {
            method,
            status: DeliveryStatus::Failed,
            detail: Some(error.to_string()),
            retryable: error.is_retryable(),
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.status == DeliveryStatus::Delivered
    }

    pub fn is_failed(&self) -> bool {
        self.status == DeliveryStatus::Failed
    }
}

/// 投递方式抽象
///
/// 每种投递方式实现此 trait。`is_available` 为快速可用性检查，
/// 不可用的方式被跳过；可用但前置条件不满足（如推送权限未授予）
/// 的方式在 `send` 中返回错误，由调度方记入失败结果。
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// 对应的投递方式
    fn method(&self) -> DeliveryMethod;

    /// 渠道名称，用于日志
    fn name(&self) -> &str;

    /// 该方式当前是否参与投递
    fn is_available(&self, ctx: &DeliveryContext) -> bool;

    /// 执行投递
    async fn send(&self, record: &NotificationRecord, ctx: &DeliveryContext) -> Result<()>;
}

/// 投递调度器
///
/// 按投递方式注册渠道实现，并行执行一条通知的全部投递方式
pub struct Dispatcher {
    channels: HashMap<DeliveryMethod, Arc<dyn DeliveryChannel>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }

    /// 注册全部内置投递方式
    pub fn with_defaults() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(Arc::new(InAppChannel::new()));
        dispatcher.register(Arc::new(PushChannel::new()));
        dispatcher.register(Arc::new(EmailChannel::new()));
        dispatcher.register(Arc::new(SmsChannel::new()));
        dispatcher
    }

    pub fn register(&mut self, channel: Arc<dyn DeliveryChannel>) {
        self.channels.insert(channel.method(), channel);
    }

    /// 并行执行一条通知的所有投递方式
    ///
    /// 每种方式独立产出一个结果，互不阻断
    #[instrument(skip(self, record, ctx), fields(notification_id = %record.id))]
    pub async fn dispatch(
        &self,
        record: &NotificationRecord,
        methods: &[DeliveryMethod],
        ctx: &DeliveryContext,
    ) -> Vec<DeliveryResult> {
        let tasks = methods.iter().map(|method| async move {
            let Some(channel) = self.channels.get(method) else {
                warn!(method = %method, "投递方式未注册，跳过");
                return DeliveryResult::skipped(*method, "投递方式未注册");
            };

            if !channel.is_available(ctx) {
                debug!(channel = channel.name(), "渠道不可用，跳过");
                return DeliveryResult::skipped(*method, "渠道不可用");
            }

            match channel.send(record, ctx).await {
                Ok(()) => {
                    debug!(channel = channel.name(), "投递成功");
                    DeliveryResult::delivered(*method)
                }
                Err(e) => {
                    warn!(channel = channel.name(), error = %e, "投递失败");
                    DeliveryResult::failed(*method, &e)
                }
            }
        });

        futures::future::join_all(tasks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NotificationType;
    use mockall::mock;

    mock! {
        Channel {}

        #[async_trait]
        impl DeliveryChannel for Channel {
            fn method(&self) -> DeliveryMethod;
            fn name(&self) -> &str;
            fn is_available(&self, ctx: &DeliveryContext) -> bool;
            async fn send(&self, record: &NotificationRecord, ctx: &DeliveryContext) -> Result<()>;
        }
    }

    fn record() -> NotificationRecord {
        NotificationRecord::new(NotificationType::Info, "标题", "正文")
    }

    #[tokio::test]
    async fn test_dispatch_unregistered_method_skipped() {
        let dispatcher = Dispatcher::new();
        let results = dispatcher
            .dispatch(&record(), &[DeliveryMethod::InApp], &DeliveryContext::default())
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, DeliveryStatus::Skipped);
    }

    #[tokio::test]
    async fn test_dispatch_in_app_delivers() {
        let dispatcher = Dispatcher::with_defaults();
        let results = dispatcher
            .dispatch(&record(), &[DeliveryMethod::InApp], &DeliveryContext::default())
            .await;

        assert_eq!(results.len(), 1);
        assert!(results[0].is_delivered());
    }

    #[tokio::test]
    async fn test_dispatch_failures_are_isolated() {
        let dispatcher = Dispatcher::with_defaults();
        // 推送权限未授予：PUSH 失败但 IN_APP 不受影响
        let ctx = DeliveryContext {
            push_permission: PushPermission::Denied,
            ..Default::default()
        };
        let results = dispatcher
            .dispatch(
                &record(),
                &[DeliveryMethod::InApp, DeliveryMethod::Push],
                &ctx,
            )
            .await;

        assert_eq!(results.len(), 2);
        let in_app = results
            .iter()
            .find(|r| r.method == DeliveryMethod::InApp)
            .unwrap();
        let push = results
            .iter()
            .find(|r| r.method == DeliveryMethod::Push)
            .unwrap();
        assert!(in_app.is_delivered());
        assert!(push.is_failed());
        assert!(!push.retryable);
    }

    #[tokio::test]
    async fn test_dispatch_custom_channel() {
        let mut mock = MockChannel::new();
        mock.expect_method().return_const(DeliveryMethod::Sms);
        mock.expect_name().return_const("mock_sms".to_string());
        mock.expect_is_available().return_const(true);
        mock.expect_send().times(1).returning(|_, _| Ok(()));

        // 注册自定义实现可覆盖内置渠道
        let mut dispatcher = Dispatcher::with_defaults();
        dispatcher.register(Arc::new(mock));

        let results = dispatcher
            .dispatch(&record(), &[DeliveryMethod::Sms], &DeliveryContext::default())
            .await;
        assert!(results[0].is_delivered());
    }

    #[tokio::test]
    async fn test_dispatch_sms_skipped() {
        let dispatcher = Dispatcher::with_defaults();
        let results = dispatcher
            .dispatch(&record(), &[DeliveryMethod::Sms], &DeliveryContext::default())
            .await;

        assert_eq!(results[0].status, DeliveryStatus::Skipped);
    }
}
