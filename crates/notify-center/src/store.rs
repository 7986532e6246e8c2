//! 通知中心 Store
//!
//! 单一事实来源：持有通知列表、未读计数、渠道、模板、全局设置、
//! 分析计数和投递队列，对外提供全部状态操作并以广播事件通知订阅方。
//!
//! 并发模型：状态由 `parking_lot::RwLock` 保护，队列处理用原子标志
//! 防止重入。所有 await 均发生在锁外，投递过程使用进入时的状态快照。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Local, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use notify_shared::error::NotifyError;
use notify_shared::storage::{KeyValueStorage, StorageKey};

use crate::dispatcher::{DeliveryContext, Dispatcher};
use crate::error::{CenterError, Result};
use crate::matcher::should_show_notification;
use crate::template::{TemplateEngine, TemplateOverrides, builtin_templates};
use crate::types::{
    AnalyticsCounters, AnalyticsKind, ChannelUpdate, DeliveryMethod, EmailSettings, EmailTemplate,
    EmailTemplateUpdate, GlobalSettings, NotificationAction, NotificationChannel,
    NotificationDraft, NotificationFilter, NotificationPriority, NotificationRecord,
    NotificationSort, NotificationTemplate, PushPermission, PushSubscription, QuietHours,
    SettingsUpdate, SortDirection, SortKey, TemplateUpdate, TemplateValue,
};

/// 事件广播缓冲区大小
const EVENT_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// 事件
// ---------------------------------------------------------------------------

/// Store 状态变更事件
///
/// 通过 broadcast 通道发布，订阅方（UI、持久化、日志）松耦合消费
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// 新通知入列
    NotificationAdded { record: NotificationRecord },
    /// 单条标记已读
    NotificationRead { id: String },
    /// 全部标记已读
    AllRead,
    /// 单条忽略
    NotificationDismissed { id: String },
    /// 全部忽略
    AllDismissed,
    /// 单条删除
    NotificationRemoved { id: String },
    /// 过期清理删除了若干条
    ExpiredRemoved { count: usize },
    /// 用户触发了通知动作，由宿主执行实际行为
    ActionInvoked {
        notification_id: String,
        action_id: String,
        url: Option<String>,
    },
    /// 一轮队列处理完成
    QueueProcessed { delivered: usize, failed: usize },
    /// 全局设置变更
    SettingsUpdated,
}

/// 一轮队列处理的统计结果
#[derive(Debug, Clone, Default)]
pub struct QueueReport {
    /// 本轮处理的通知条数
    pub processed: usize,
    /// 无失败的通知条数
    pub delivered: usize,
    /// 失败描述列表（通知 id + 投递方式 + 原因）
    pub failures: Vec<String>,
    /// 因瞬时失败重新入队的条数
    pub requeued: usize,
}

// ---------------------------------------------------------------------------
// 内部状态与持久化快照
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreState {
    /// 通知列表，新通知在前
    notifications: Vec<NotificationRecord>,
    /// 未读计数，与列表实际未读数保持一致
    unread_count: usize,
    channels: Vec<NotificationChannel>,
    templates: Vec<NotificationTemplate>,
    email_templates: Vec<EmailTemplate>,
    email_settings: EmailSettings,
    push_permission: PushPermission,
    push_subscriptions: Vec<PushSubscription>,
    settings: GlobalSettings,
    analytics: AnalyticsCounters,
    /// 待投递通知 id 队列
    queue: Vec<String>,
    /// 历次队列处理累计的失败描述，供设置页排障展示
    delivery_errors: Vec<String>,
    /// 宿主环境是否支持推送
    push_supported: bool,
    /// UI 态：当前过滤条件、排序与选中项（不持久化）
    filter: NotificationFilter,
    sort: NotificationSort,
    selected_id: Option<String>,
}

/// 持久化快照
///
/// 仅包含需要跨会话保留的状态：过滤、排序、选中项、队列、错误列表
/// 和推送权限属于会话内状态，不落盘；未读计数在加载时由列表重新计算。
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreSnapshot {
    notifications: Vec<NotificationRecord>,
    channels: Vec<NotificationChannel>,
    templates: Vec<NotificationTemplate>,
    email_templates: Vec<EmailTemplate>,
    email_settings: EmailSettings,
    push_subscriptions: Vec<PushSubscription>,
    settings: GlobalSettings,
    analytics: AnalyticsCounters,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// 通知中心 Store
pub struct NotificationStore {
    state: RwLock<StoreState>,
    events: broadcast::Sender<StoreEvent>,
    /// 队列处理重入保护
    processing: AtomicBool,
    dispatcher: Dispatcher,
    engine: TemplateEngine,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl NotificationStore {
    /// 创建空 Store（无渠道、无模板）
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(StoreState {
                push_supported: true,
                ..StoreState::default()
            }),
            events,
            processing: AtomicBool::new(false),
            dispatcher: Dispatcher::with_defaults(),
            engine: TemplateEngine::new(),
        }
    }

    /// 创建带内置渠道和模板的 Store
    pub fn with_defaults() -> Self {
        let store = Self::new();
        {
            let mut state = store.state.write();
            state.channels = default_channels();
            state.templates = builtin_templates();
            state.email_templates = default_email_templates();
        }
        store
    }

    /// 订阅状态变更事件
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // 无订阅方时发送失败属正常情况
        let _ = self.events.send(event);
    }

    // -----------------------------------------------------------------------
    // 通知生命周期
    // -----------------------------------------------------------------------

    /// 添加通知
    ///
    /// 校验失败整条拒绝。成功后通知进入待投递队列，sent 计数加一。
    #[instrument(skip(self, draft))]
    pub fn add_notification(&self, draft: NotificationDraft) -> Result<String> {
        draft
            .validate()
            .map_err(|e| NotifyError::Validation(e.to_string()))?;

        let record = draft.into_record();
        let id = record.id.clone();

        {
            let mut state = self.state.write();
            state.unread_count += 1;
            state.queue.push(id.clone());
            state.analytics.increment(AnalyticsKind::Sent);
            state.notifications.insert(0, record.clone());
        }

        debug!(notification_id = %id, title = %record.title, "通知已添加");
        self.emit(StoreEvent::NotificationAdded { record });
        Ok(id)
    }

    /// 从模板实例化通知
    ///
    /// 模板不存在时记录警告并返回 None，不视为错误；
    /// 变量校验或渲染失败返回错误，不产出任何通知。
    #[instrument(skip(self, variables, overrides))]
    pub fn create_from_template(
        &self,
        template_id: &str,
        variables: &HashMap<String, TemplateValue>,
        overrides: TemplateOverrides,
    ) -> Result<Option<String>> {
        let template = {
            let state = self.state.read();
            state.templates.iter().find(|t| t.id == template_id).cloned()
        };

        let Some(template) = template else {
            warn!(template_id, "模板不存在，忽略创建请求");
            return Ok(None);
        };

        let record = self.engine.instantiate(&template, variables, overrides)?;
        let id = record.id.clone();

        {
            let mut state = self.state.write();
            state.unread_count += 1;
            state.queue.push(id.clone());
            state.analytics.increment(AnalyticsKind::Sent);
            state.notifications.insert(0, record.clone());
        }

        self.emit(StoreEvent::NotificationAdded { record });
        Ok(Some(id))
    }

    /// 标记单条已读（幂等）
    ///
    /// 仅未读转已读时递减未读计数并累计 opened，重复调用无副作用
    pub fn mark_as_read(&self, id: &str) {
        let changed = {
            let mut guard = self.state.write();
            let state = &mut *guard;
            match state.notifications.iter_mut().find(|n| n.id == id) {
                Some(record) if !record.read => {
                    let was_unread = record.counts_as_unread();
                    record.mark_read();
                    if was_unread {
                        state.unread_count = state.unread_count.saturating_sub(1);
                    }
                    state.analytics.increment(AnalyticsKind::Opened);
                    true
                }
                _ => false,
            }
        };

        if changed {
            self.emit(StoreEvent::NotificationRead { id: id.to_string() });
        }
    }

    /// 全部标记已读
    ///
    /// 单次写锁内完成全部翻转并把未读计数清零，外部观察不到中间态
    pub fn mark_all_as_read(&self) {
        {
            let mut state = self.state.write();
            for record in state.notifications.iter_mut() {
                record.read = true;
            }
            state.unread_count = 0;
        }
        self.emit(StoreEvent::AllRead);
    }

    /// 忽略单条通知
    ///
    /// 忽略未读通知时未读计数恰好递减一次；重复忽略无副作用
    pub fn dismiss_notification(&self, id: &str) {
        let changed = {
            let mut guard = self.state.write();
            let state = &mut *guard;
            match state.notifications.iter_mut().find(|n| n.id == id) {
                Some(record) if !record.dismissed => {
                    let was_unread = record.counts_as_unread();
                    record.dismiss();
                    if was_unread {
                        state.unread_count = state.unread_count.saturating_sub(1);
                    }
                    state.analytics.increment(AnalyticsKind::Dismissed);
                    true
                }
                _ => false,
            }
        };

        if changed {
            self.emit(StoreEvent::NotificationDismissed { id: id.to_string() });
        }
    }

    /// 全部忽略
    pub fn dismiss_all_notifications(&self) {
        {
            let mut state = self.state.write();
            for record in state.notifications.iter_mut() {
                record.dismissed = true;
            }
            state.unread_count = 0;
        }
        self.emit(StoreEvent::AllDismissed);
    }

    /// 删除单条通知
    pub fn remove_notification(&self, id: &str) {
        let removed = {
            let mut state = self.state.write();
            match state.notifications.iter().position(|n| n.id == id) {
                Some(index) => {
                    let record = state.notifications.remove(index);
                    if record.counts_as_unread() {
                        state.unread_count = state.unread_count.saturating_sub(1);
                    }
                    state.queue.retain(|queued| queued != id);
                    if state.selected_id.as_deref() == Some(id) {
                        state.selected_id = None;
                    }
                    true
                }
                None => false,
            }
        };

        if removed {
            self.emit(StoreEvent::NotificationRemoved { id: id.to_string() });
        }
    }

    /// 清理过期通知
    ///
    /// 常驻通知豁免。单次写锁内完成删除和未读计数修正，返回删除条数。
    #[instrument(skip(self))]
    pub fn remove_expired_notifications(&self, now: DateTime<Utc>) -> usize {
        let count = {
            let mut state = self.state.write();
            let before = state.notifications.len();
            let mut expired_ids = Vec::new();

            state.notifications.retain(|record| {
                if record.is_expired(now) {
                    expired_ids.push(record.id.clone());
                    false
                } else {
                    true
                }
            });

            // 直接按剩余列表重算未读，避免逐条增减
            state.unread_count = state
                .notifications
                .iter()
                .filter(|n| n.counts_as_unread())
                .count();
            state.queue.retain(|id| !expired_ids.contains(id));

            before - state.notifications.len()
        };

        if count > 0 {
            info!(count, "已清理过期通知");
            self.emit(StoreEvent::ExpiredRemoved { count });
        }
        count
    }

    /// 触发通知动作
    ///
    /// 动作本身是数据，实际行为由订阅 `ActionInvoked` 事件的宿主执行。
    /// 触发同时把通知标记为已读并累计 clicked。返回命中的动作，
    /// 方便调用方直接使用其 url 等字段。
    pub fn perform_action(
        &self,
        notification_id: &str,
        action_id: &str,
    ) -> Result<NotificationAction> {
        let action = {
            let mut guard = self.state.write();
            let state = &mut *guard;
            let record = state
                .notifications
                .iter_mut()
                .find(|n| n.id == notification_id)
                .ok_or_else(|| NotifyError::NotFound {
                    entity: "notification".to_string(),
                    id: notification_id.to_string(),
                })?;

            let action = record
                .actions
                .iter()
                .find(|a| a.id == action_id)
                .ok_or_else(|| NotifyError::NotFound {
                    entity: "action".to_string(),
                    id: action_id.to_string(),
                })?
                .clone();

            if record.counts_as_unread() {
                state.unread_count = state.unread_count.saturating_sub(1);
            }
            record.read = true;
            state.analytics.increment(AnalyticsKind::Clicked);
            action
        };

        self.emit(StoreEvent::ActionInvoked {
            notification_id: notification_id.to_string(),
            action_id: action_id.to_string(),
            url: action.url.clone(),
        });
        Ok(action)
    }

    // -----------------------------------------------------------------------
    // 查询
    // -----------------------------------------------------------------------

    /// 未忽略的通知列表（新通知在前）
    pub fn notifications(&self) -> Vec<NotificationRecord> {
        self.state
            .read()
            .notifications
            .iter()
            .filter(|n| !n.dismissed)
            .cloned()
            .collect()
    }

    /// 未读计数
    pub fn unread_count(&self) -> usize {
        self.state.read().unread_count
    }

    pub fn get_notification(&self, id: &str) -> Option<NotificationRecord> {
        self.state
            .read()
            .notifications
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }

    /// 设置列表过滤条件
    pub fn set_filter(&self, filter: NotificationFilter) {
        self.state.write().filter = filter;
    }

    /// 设置列表排序
    pub fn set_sort(&self, sort: NotificationSort) {
        self.state.write().sort = sort;
    }

    /// 设置当前选中的通知（详情面板联动）
    pub fn select_notification(&self, id: Option<String>) {
        self.state.write().selected_id = id;
    }

    pub fn selected_notification(&self) -> Option<NotificationRecord> {
        let state = self.state.read();
        let id = state.selected_id.as_deref()?;
        state.notifications.iter().find(|n| n.id == id).cloned()
    }

    /// 按当前过滤和排序条件返回通知列表
    ///
    /// 已忽略的通知先行排除，之后才应用过滤链；它们在被清理前
    /// 仍可通过 `get_notification` 按 id 访问
    pub fn get_filtered_notifications(&self) -> Vec<NotificationRecord> {
        let state = self.state.read();
        let filter = &state.filter;

        let mut result: Vec<NotificationRecord> = state
            .notifications
            .iter()
            .filter(|n| !n.dismissed)
            .filter(|n| {
                filter
                    .notification_type
                    .is_none_or(|t| n.notification_type == t)
            })
            .filter(|n| {
                filter
                    .category
                    .as_ref()
                    .is_none_or(|c| &n.category == c)
            })
            .filter(|n| filter.read.is_none_or(|read| n.read == read))
            .filter(|n| filter.priority.is_none_or(|p| n.priority == p))
            .filter(|n| filter.from.is_none_or(|from| n.timestamp >= from))
            .filter(|n| filter.to.is_none_or(|to| n.timestamp <= to))
            .cloned()
            .collect();

        let sort = state.sort;
        result.sort_by(|a, b| {
            let ordering = match sort.key {
                SortKey::Timestamp => a.timestamp.cmp(&b.timestamp),
                SortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
                SortKey::Type => a.notification_type.as_str().cmp(b.notification_type.as_str()),
            };
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        result
    }

    // -----------------------------------------------------------------------
    // 渠道管理
    // -----------------------------------------------------------------------

    pub fn channels(&self) -> Vec<NotificationChannel> {
        self.state.read().channels.clone()
    }

    pub fn get_channel(&self, id: &str) -> Option<NotificationChannel> {
        self.state
            .read()
            .channels
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    /// 添加渠道，id 重复时拒绝
    pub fn add_channel(&self, channel: NotificationChannel) -> Result<()> {
        let mut state = self.state.write();
        if state.channels.iter().any(|c| c.id == channel.id) {
            return Err(NotifyError::AlreadyExists {
                entity: "channel".to_string(),
                field: "id".to_string(),
                value: channel.id,
            }
            .into());
        }
        state.channels.push(channel);
        Ok(())
    }

    /// 部分更新渠道
    ///
    /// 嵌套设置逐字段合并；id 不存在时静默忽略
    pub fn update_channel(&self, id: &str, update: ChannelUpdate) {
        let mut state = self.state.write();
        match state.channels.iter_mut().find(|c| c.id == id) {
            Some(channel) => update.apply(channel),
            None => warn!(channel_id = id, "渠道不存在，忽略更新"),
        }
    }

    pub fn remove_channel(&self, id: &str) {
        self.state.write().channels.retain(|c| c.id != id);
    }

    // -----------------------------------------------------------------------
    // 模板管理
    // -----------------------------------------------------------------------

    pub fn templates(&self) -> Vec<NotificationTemplate> {
        self.state.read().templates.clone()
    }

    pub fn get_template(&self, id: &str) -> Option<NotificationTemplate> {
        self.state
            .read()
            .templates
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub fn add_template(&self, template: NotificationTemplate) -> Result<()> {
        let mut state = self.state.write();
        if state.templates.iter().any(|t| t.id == template.id) {
            return Err(NotifyError::AlreadyExists {
                entity: "template".to_string(),
                field: "id".to_string(),
                value: template.id,
            }
            .into());
        }
        state.templates.push(template);
        Ok(())
    }

    pub fn update_template(&self, id: &str, update: TemplateUpdate) {
        let mut state = self.state.write();
        match state.templates.iter_mut().find(|t| t.id == id) {
            Some(template) => update.apply(template),
            None => warn!(template_id = id, "模板不存在，忽略更新"),
        }
    }

    pub fn remove_template(&self, id: &str) {
        self.state.write().templates.retain(|t| t.id != id);
    }

    // -----------------------------------------------------------------------
    // 邮件
    // -----------------------------------------------------------------------

    pub fn email_settings(&self) -> EmailSettings {
        self.state.read().email_settings.clone()
    }

    /// 设置邮件地址，地址变更后需重新验证
    pub fn set_email_address(&self, address: impl Into<String>) {
        let mut state = self.state.write();
        state.email_settings.address = Some(address.into());
        state.email_settings.verified = false;
    }

    pub fn set_email_enabled(&self, enabled: bool) {
        self.state.write().email_settings.enabled = enabled;
    }

    /// 校验验证码并标记邮件地址为已验证（模拟验证流程）
    ///
    /// 未设置地址时返回配置错误；全零验证码固定拒绝，用于联调失败路径
    #[instrument(skip(self, code))]
    pub async fn verify_email(&self, code: &str) -> Result<()> {
        let address = self
            .state
            .read()
            .email_settings
            .address
            .clone()
            .ok_or_else(|| NotifyError::NotConfigured {
                feature: "email".to_string(),
                reason: "未设置邮件地址".to_string(),
            })?;

        // 模拟验证邮件往返
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        if code == "000000" {
            return Err(NotifyError::Validation("验证码不正确".to_string()).into());
        }

        self.state.write().email_settings.verified = true;
        info!(address = %address, "邮件地址已验证");
        Ok(())
    }

    pub fn email_templates(&self) -> Vec<EmailTemplate> {
        self.state.read().email_templates.clone()
    }

    pub fn add_email_template(&self, template: EmailTemplate) -> Result<()> {
        let mut state = self.state.write();
        if state.email_templates.iter().any(|t| t.id == template.id) {
            return Err(NotifyError::AlreadyExists {
                entity: "email_template".to_string(),
                field: "id".to_string(),
                value: template.id,
            }
            .into());
        }
        state.email_templates.push(template);
        Ok(())
    }

    pub fn update_email_template(&self, id: &str, update: EmailTemplateUpdate) {
        let mut state = self.state.write();
        match state.email_templates.iter_mut().find(|t| t.id == id) {
            Some(template) => update.apply(template),
            None => warn!(template_id = id, "邮件模板不存在，忽略更新"),
        }
    }

    pub fn remove_email_template(&self, id: &str) {
        self.state.write().email_templates.retain(|t| t.id != id);
    }

    // -----------------------------------------------------------------------
    // 推送
    // -----------------------------------------------------------------------

    pub fn push_permission(&self) -> PushPermission {
        self.state.read().push_permission
    }

    /// 请求推送权限（模拟用户授权流程）
    ///
    /// 处于 PROMPT 状态时授予；用户已明确拒绝的不再打扰
    pub async fn request_push_permission(&self) -> PushPermission {
        let current = self.state.read().push_permission;
        if current != PushPermission::Prompt {
            return current;
        }

        // 模拟权限弹窗等待
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let mut state = self.state.write();
        state.push_permission = PushPermission::Granted;
        state.push_permission
    }

    /// 直接设置推送权限（宿主环境回传实际权限状态时使用）
    pub fn set_push_permission(&self, permission: PushPermission) {
        self.state.write().push_permission = permission;
    }

    pub fn push_subscriptions(&self) -> Vec<PushSubscription> {
        self.state.read().push_subscriptions.clone()
    }

    /// 注册推送订阅，要求权限已授予
    pub fn subscribe_push(&self, endpoint: impl Into<String>) -> Result<String> {
        let mut state = self.state.write();
        if state.push_permission != PushPermission::Granted {
            return Err(NotifyError::PermissionDenied {
                channel: "push".to_string(),
                reason: "推送权限未授予".to_string(),
            }
            .into());
        }
        let subscription = PushSubscription::new(endpoint);
        let id = subscription.id.clone();
        state.push_subscriptions.push(subscription);
        Ok(id)
    }

    pub fn unsubscribe_push(&self, id: &str) {
        self.state.write().push_subscriptions.retain(|s| s.id != id);
    }

    /// 标记宿主环境是否支持推送（不支持时推送投递直接跳过）
    pub fn set_push_support(&self, supported: bool) {
        self.state.write().push_supported = supported;
    }

    pub fn push_supported(&self) -> bool {
        self.state.read().push_supported
    }

    // -----------------------------------------------------------------------
    // 设置与分析
    // -----------------------------------------------------------------------

    pub fn settings(&self) -> GlobalSettings {
        self.state.read().settings.clone()
    }

    pub fn update_settings(&self, update: SettingsUpdate) {
        {
            let mut state = self.state.write();
            update.apply(&mut state.settings);
        }
        self.emit(StoreEvent::SettingsUpdated);
    }

    /// 切换免打扰
    pub fn set_do_not_disturb(&self, enabled: bool) {
        self.update_settings(SettingsUpdate {
            do_not_disturb: Some(enabled),
            ..SettingsUpdate::default()
        });
    }

    /// 设置全局静默时段；`None` 表示关闭
    pub fn set_quiet_hours(&self, quiet_hours: Option<QuietHours>) {
        match quiet_hours {
            Some(hours) => self.update_settings(SettingsUpdate {
                quiet_hours_enabled: Some(true),
                quiet_hours: Some(hours),
                ..SettingsUpdate::default()
            }),
            None => self.update_settings(SettingsUpdate {
                quiet_hours_enabled: Some(false),
                ..SettingsUpdate::default()
            }),
        }
    }

    pub fn analytics(&self) -> AnalyticsCounters {
        self.state.read().analytics
    }

    /// 累计一次分析计数（宿主回传 opened/clicked 等事件时使用）
    pub fn increment_analytics(&self, kind: AnalyticsKind) {
        self.state.write().analytics.increment(kind);
    }

    pub fn reset_analytics(&self) {
        self.state.write().analytics.reset();
    }

    // -----------------------------------------------------------------------
    // 队列处理
    // -----------------------------------------------------------------------

    /// 待投递队列长度
    pub fn queue_len(&self) -> usize {
        self.state.read().queue.len()
    }

    /// 清空待投递队列
    pub fn clear_queue(&self) {
        self.state.write().queue.clear();
    }

    /// 把已有通知重新加入待投递队列（手动重发）
    pub fn enqueue_for_delivery(&self, id: &str) -> Result<()> {
        let mut state = self.state.write();
        if !state.notifications.iter().any(|n| n.id == id) {
            return Err(NotifyError::NotFound {
                entity: "notification".to_string(),
                id: id.to_string(),
            }
            .into());
        }
        if !state.queue.iter().any(|queued| queued == id) {
            state.queue.push(id.to_string());
        }
        Ok(())
    }

    /// 累计的投递失败描述
    pub fn delivery_errors(&self) -> Vec<String> {
        self.state.read().delivery_errors.clone()
    }

    pub fn clear_errors(&self) {
        self.state.write().delivery_errors.clear();
    }

    /// 处理待投递队列
    ///
    /// 带重入保护：已有一轮在进行时返回 `QueueBusy`。进入时取走
    /// 整个队列并对设置、渠道做快照，处理期间的状态变更不影响本轮。
    /// 每条通知并行执行其匹配渠道声明的全部投递方式；无任何失败的
    /// 通知计入 delivered，瞬时失败的通知重新入队等待下一轮。
    #[instrument(skip(self))]
    pub async fn process_queue(&self) -> Result<QueueReport> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("队列处理已在进行，跳过本次触发");
            return Err(CenterError::QueueBusy);
        }
        let _guard = ProcessingGuard(&self.processing);

        // 锁内取队列并做状态快照，之后不再回读共享状态
        let (pending, channels, ctx) = {
            let mut guard = self.state.write();
            let state = &mut *guard;
            let pending: Vec<NotificationRecord> = std::mem::take(&mut state.queue)
                .iter()
                .filter_map(|id| {
                    state.notifications.iter().find(|n| &n.id == id).cloned()
                })
                .collect();
            let ctx = DeliveryContext {
                settings: state.settings.clone(),
                email: state.email_settings.clone(),
                push_permission: state.push_permission,
                push_supported: state.push_supported,
                push_subscriptions: state.push_subscriptions.clone(),
            };
            (pending, state.channels.clone(), ctx)
        };

        let now = Local::now().time();
        let mut report = QueueReport::default();
        let mut requeue_ids = Vec::new();

        for record in &pending {
            report.processed += 1;

            // 匹配渠道并按声明顺序合并去重投递方式
            let mut methods: Vec<DeliveryMethod> = Vec::new();
            for channel in &channels {
                if should_show_notification(record, channel, &ctx.settings, now) {
                    for method in &channel.methods {
                        if !methods.contains(method) {
                            methods.push(*method);
                        }
                    }
                }
            }

            let results = self.dispatcher.dispatch(record, &methods, &ctx).await;

            let mut failed = false;
            let mut retryable = false;
            for result in &results {
                if result.is_failed() {
                    failed = true;
                    retryable |= result.retryable;
                    report.failures.push(format!(
                        "{}/{}: {}",
                        record.id,
                        result.method,
                        result.detail.as_deref().unwrap_or("未知错误")
                    ));
                }
            }

            if !failed {
                report.delivered += 1;
            }
            if retryable {
                requeue_ids.push(record.id.clone());
            }
        }

        report.requeued = requeue_ids.len();

        {
            let mut state = self.state.write();
            for _ in 0..report.delivered {
                state.analytics.increment(AnalyticsKind::Delivered);
            }
            state.queue.extend(requeue_ids);
            state.delivery_errors.extend(report.failures.iter().cloned());
        }

        if report.processed > 0 {
            info!(
                processed = report.processed,
                delivered = report.delivered,
                failed = report.failures.len(),
                requeued = report.requeued,
                "队列处理完成"
            );
            self.emit(StoreEvent::QueueProcessed {
                delivered: report.delivered,
                failed: report.failures.len(),
            });
        }

        Ok(report)
    }

    // -----------------------------------------------------------------------
    // 持久化
    // -----------------------------------------------------------------------

    /// 保存状态快照
    #[instrument(skip(self, storage))]
    pub async fn save(&self, storage: &dyn KeyValueStorage, namespace: &str) -> Result<()> {
        let snapshot = {
            let state = self.state.read();
            StoreSnapshot {
                notifications: state.notifications.clone(),
                channels: state.channels.clone(),
                templates: state.templates.clone(),
                email_templates: state.email_templates.clone(),
                email_settings: state.email_settings.clone(),
                push_subscriptions: state.push_subscriptions.clone(),
                settings: state.settings.clone(),
                analytics: state.analytics,
            }
        };

        let payload =
            serde_json::to_string(&snapshot).map_err(NotifyError::from)?;
        storage
            .set(&StorageKey::snapshot(namespace), &payload)
            .await?;
        debug!(namespace, "状态快照已保存");
        Ok(())
    }

    /// 加载状态快照
    ///
    /// 快照不存在时保持当前状态并返回 false。未读计数按加载的
    /// 列表重新计算，不信任快照中的派生值；队列和推送权限不恢复。
    #[instrument(skip(self, storage))]
    pub async fn load(&self, storage: &dyn KeyValueStorage, namespace: &str) -> Result<bool> {
        let Some(payload) = storage.get(&StorageKey::snapshot(namespace)).await? else {
            debug!(namespace, "无状态快照，使用当前状态");
            return Ok(false);
        };

        let snapshot: StoreSnapshot =
            serde_json::from_str(&payload).map_err(NotifyError::from)?;

        let mut state = self.state.write();
        state.unread_count = snapshot
            .notifications
            .iter()
            .filter(|n| n.counts_as_unread())
            .count();
        state.notifications = snapshot.notifications;
        state.channels = snapshot.channels;
        state.templates = snapshot.templates;
        state.email_templates = snapshot.email_templates;
        state.email_settings = snapshot.email_settings;
        state.push_subscriptions = snapshot.push_subscriptions;
        state.settings = snapshot.settings;
        state.analytics = snapshot.analytics;
        state.queue.clear();

        info!(namespace, count = state.notifications.len(), "状态快照已加载");
        Ok(true)
    }
}

/// 队列处理标志的释放保护
///
/// 处理提前返回或 panic 时也能复位标志
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 内置渠道集合
fn default_channels() -> Vec<NotificationChannel> {
    vec![
        NotificationChannel::new("system", "系统通知"),
        NotificationChannel::new("task", "任务通知")
            .with_categories(["task"])
            .with_methods(vec![DeliveryMethod::InApp, DeliveryMethod::Push]),
        NotificationChannel::new("chat", "消息通知")
            .with_categories(["chat"])
            .with_methods(vec![DeliveryMethod::InApp, DeliveryMethod::Push]),
        NotificationChannel::new("alerts", "重要告警")
            .with_min_priority(NotificationPriority::High)
            .with_methods(vec![
                DeliveryMethod::InApp,
                DeliveryMethod::Push,
                DeliveryMethod::Email,
            ]),
    ]
}

/// 内置邮件模板集合
fn default_email_templates() -> Vec<EmailTemplate> {
    vec![EmailTemplate {
        id: "notification_digest".to_string(),
        subject: "【通知】{{title}}".to_string(),
        body: "{{message}}\n\n—— 通知中心".to_string(),
        variables: vec!["title".to_string(), "message".to_string()],
    }]
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------
