//! 通知中心
//!
//! 客户端通知状态引擎：单一 Store 管理通知生命周期、未读计数、
//! 渠道策略、模板实例化、投递队列和分析计数，状态变更通过广播
//! 事件发布；后台 Worker 负责过期清理和队列轮询。
//!
//! ## 模块划分
//!
//! - `types`: 通知记录、渠道、模板、设置等数据结构
//! - `store`: 状态引擎与持久化
//! - `matcher`: 投递匹配纯函数
//! - `template`: 模板渲染引擎
//! - `dispatcher`: 投递方式抽象与并行分发
//! - `worker`: 后台维护任务与浮层计时器
//! - `error`: 统一错误类型

pub mod dispatcher;
pub mod error;
pub mod matcher;
pub mod store;
pub mod template;
pub mod types;
pub mod worker;

pub use dispatcher::{DeliveryChannel, DeliveryContext, DeliveryResult, DeliveryStatus, Dispatcher};
pub use error::{CenterError, Result};
pub use matcher::should_show_notification;
pub use store::{NotificationStore, QueueReport, StoreEvent};
pub use template::{TemplateEngine, TemplateOverrides, builtin_templates};
pub use types::{
    AnalyticsCounters, AnalyticsKind, ChannelSettings, ChannelSettingsUpdate, ChannelUpdate,
    DeliveryMethod, EmailSettings, EmailTemplate, EmailTemplateUpdate, GlobalSettings,
    NotificationAction, NotificationChannel, NotificationDraft, NotificationFilter,
    NotificationPriority, NotificationRecord, NotificationSort, NotificationTemplate,
    NotificationType, PushPermission, PushSubscription, QuietHours, SettingsUpdate,
    SortDirection, SortKey, TemplateSettings, TemplateValue,
};
