//! 通知类型定义
//!
//! 定义通知中心相关的数据结构和枚举类型：通知记录及其生命周期标志、
//! 投递渠道与策略、模板蓝图、全局设置以及分析计数器。

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// ---------------------------------------------------------------------------
// 枚举类型
// ---------------------------------------------------------------------------

/// 通知类型
///
/// 不同类型对应不同的展示样式和默认图标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    #[default]
    Info,
    Success,
    Warning,
    Error,
    Task,
    Message,
    System,
}

impl NotificationType {
    /// 类型的稳定字符串形式，用于日志和排序
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Success => "SUCCESS",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Task => "TASK",
            Self::Message => "MESSAGE",
            Self::System => "SYSTEM",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 通知优先级
///
/// 固定顺序 low < normal < high < urgent，比较一律基于序号而非字面值
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl NotificationPriority {
    /// 优先级序号，渠道阈值比较使用此值
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Normal => 1,
            Self::High => 2,
            Self::Urgent => 3,
        }
    }
}

/// 通知动作的视觉样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStyle {
    #[default]
    Primary,
    Secondary,
    Success,
    Danger,
    Ghost,
}

/// 投递方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMethod {
    InApp,
    Push,
    Email,
    Sms,
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InApp => "IN_APP",
            Self::Push => "PUSH",
            Self::Email => "EMAIL",
            Self::Sms => "SMS",
        };
        write!(f, "{s}")
    }
}

/// 渠道投递频率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelFrequency {
    #[default]
    Immediate,
    Batched,
    Daily,
    Weekly,
}

/// 推送权限状态
///
/// 模拟浏览器 Notification.permission 的三态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PushPermission {
    #[default]
    Prompt,
    Granted,
    Denied,
}

// ---------------------------------------------------------------------------
// 通知记录
// ---------------------------------------------------------------------------

/// 通知动作
///
/// 附加在通知记录上的用户可触发操作。动作本身只承载数据，
/// 触发行为由 Store 的 `perform_action` 以事件形式广播给宿主执行。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationAction {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub style: ActionStyle,
    /// 点击后跳转的链接（如有）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// 执行前需要用户确认的提示文案（如有）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_message: Option<String>,
}

impl NotificationAction {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            style: ActionStyle::default(),
            url: None,
            confirm_message: None,
        }
    }

    pub fn with_style(mut self, style: ActionStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_confirm(mut self, message: impl Into<String>) -> Self {
        self.confirm_message = Some(message.into());
        self
    }
}

/// 通知记录
///
/// 一条可提醒事件及其生命周期标志。生命周期：
/// 活跃未读 -> 活跃已读 -> 已忽略 -> 已删除，过期删除可从任意未删除状态发生。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// 通知唯一标识（UUID v7，时间有序）
    pub id: String,
    /// 通知类型
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    /// 通知标题（已渲染）
    pub title: String,
    /// 通知正文（已渲染）
    pub message: String,
    /// 创建时间
    pub timestamp: DateTime<Utc>,
    /// 是否已读
    #[serde(default)]
    pub read: bool,
    /// 是否已忽略
    #[serde(default)]
    pub dismissed: bool,
    /// 常驻通知不参与自动过期和自动消失
    #[serde(default)]
    pub persistent: bool,
    /// 优先级
    #[serde(default)]
    pub priority: NotificationPriority,
    /// 分类键，用于过滤和渠道匹配
    pub category: String,
    /// 业务元数据（userId、sessionId、taskId、url 等）
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    /// 附加动作列表
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NotificationAction>,
    /// 过期时间（如有）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// 提示音标识（如有）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    /// 图标标识（如有）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl NotificationRecord {
    /// 创建新通知记录，其余字段取默认值
    pub fn new(
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            notification_type,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
            read: false,
            dismissed: false,
            persistent: false,
            priority: NotificationPriority::default(),
            category: "system".to_string(),
            metadata: HashMap::new(),
            actions: Vec::new(),
            expires_at: None,
            sound: None,
            icon: None,
        }
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn add_action(&mut self, action: NotificationAction) {
        self.actions.push(action);
    }

    /// 是否已过期（常驻通知永不过期）
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if self.persistent {
            return false;
        }
        matches!(self.expires_at, Some(at) if at <= now)
    }

    /// 是否计入未读数
    pub fn counts_as_unread(&self) -> bool {
        !self.read && !self.dismissed
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }
}

/// 通知创建输入
///
/// 所有字段可选，缺省字段由 Store 填充默认值。
/// 校验规则在插入前统一执行，失败时整条拒绝、不做部分插入。
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
    #[validate(length(max = 200, message = "标题不能超过 200 字符"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "正文不能超过 2000 字符"))]
    pub message: Option<String>,
    pub persistent: Option<bool>,
    pub priority: Option<NotificationPriority>,
    #[validate(length(min = 1, message = "分类不能为空字符串"))]
    pub category: Option<String>,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    pub actions: Option<Vec<NotificationAction>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub sound: Option<String>,
    pub icon: Option<String>,
}

impl NotificationDraft {
    /// 填充默认值并生成通知记录
    ///
    /// 默认值：type=INFO、标题正文为空串、创建时间为当前时刻、
    /// 未读未忽略非常驻、优先级 NORMAL、分类 system。
    pub fn into_record(self) -> NotificationRecord {
        NotificationRecord {
            id: self.id.unwrap_or_else(|| Uuid::now_v7().to_string()),
            notification_type: self.notification_type.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            message: self.message.unwrap_or_default(),
            timestamp: Utc::now(),
            read: false,
            dismissed: false,
            persistent: self.persistent.unwrap_or(false),
            priority: self.priority.unwrap_or_default(),
            category: self.category.unwrap_or_else(|| "system".to_string()),
            metadata: self.metadata.unwrap_or_default(),
            actions: self.actions.unwrap_or_default(),
            expires_at: self.expires_at,
            sound: self.sound,
            icon: self.icon,
        }
    }
}

// ---------------------------------------------------------------------------
// 渠道
// ---------------------------------------------------------------------------

/// 免打扰时段
///
/// "HH:mm" 格式的起止时间。start <= end 时为当日区间 [start, end]；
/// start > end 时跨越午夜，now >= start 或 now <= end 均视为处于时段内。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuietHours {
    pub start: String,
    pub end: String,
}

impl QuietHours {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// 给定时刻是否落在时段内（闭区间）
    ///
    /// 起止时间无法解析时视为无时段，返回 false。
    pub fn contains(&self, now: NaiveTime) -> bool {
        let (Some(start), Some(end)) = (Self::parse(&self.start), Self::parse(&self.end)) else {
            return false;
        };

        if start <= end {
            now >= start && now <= end
        } else {
            // 跨午夜时段
            now >= start || now <= end
        }
    }

    fn parse(value: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(value, "%H:%M").ok()
    }
}

/// 渠道策略设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSettings {
    #[serde(default)]
    pub frequency: ChannelFrequency,
    /// 渠道级免打扰时段（生效还需全局 quiet_hours_enabled 为真）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_hours: Option<QuietHours>,
    /// 允许投递的分类集合
    pub categories: HashSet<String>,
    /// 最低优先级阈值，低于此序号的通知不投递
    #[serde(default)]
    pub min_priority: NotificationPriority,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            frequency: ChannelFrequency::Immediate,
            quiet_hours: None,
            categories: HashSet::new(),
            min_priority: NotificationPriority::Low,
        }
    }
}

/// 通知渠道
///
/// 一个命名的投递策略。各渠道相互独立，一条通知可匹配零个或多个渠道。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    /// 按声明顺序执行的投递方式列表
    pub methods: Vec<DeliveryMethod>,
    pub settings: ChannelSettings,
}

impl NotificationChannel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: true,
            methods: vec![DeliveryMethod::InApp],
            settings: ChannelSettings::default(),
        }
    }

    pub fn with_methods(mut self, methods: Vec<DeliveryMethod>) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_min_priority(mut self, min_priority: NotificationPriority) -> Self {
        self.settings.min_priority = min_priority;
        self
    }

    pub fn with_quiet_hours(mut self, quiet_hours: QuietHours) -> Self {
        self.settings.quiet_hours = Some(quiet_hours);
        self
    }
}

/// 渠道设置的部分更新
///
/// 仅覆盖提供的字段，未提供的字段保持原值（逐字段合并，不整体替换）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSettingsUpdate {
    pub frequency: Option<ChannelFrequency>,
    pub quiet_hours: Option<QuietHours>,
    pub categories: Option<HashSet<String>>,
    pub min_priority: Option<NotificationPriority>,
}

impl ChannelSettingsUpdate {
    pub fn apply(self, settings: &mut ChannelSettings) {
        if let Some(frequency) = self.frequency {
            settings.frequency = frequency;
        }
        if let Some(quiet_hours) = self.quiet_hours {
            settings.quiet_hours = Some(quiet_hours);
        }
        if let Some(categories) = self.categories {
            settings.categories = categories;
        }
        if let Some(min_priority) = self.min_priority {
            settings.min_priority = min_priority;
        }
    }
}

/// 渠道的部分更新
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelUpdate {
    pub name: Option<String>,
    pub enabled: Option<bool>,
    pub methods: Option<Vec<DeliveryMethod>>,
    pub settings: Option<ChannelSettingsUpdate>,
}

impl ChannelUpdate {
    pub fn apply(self, channel: &mut NotificationChannel) {
        if let Some(name) = self.name {
            channel.name = name;
        }
        if let Some(enabled) = self.enabled {
            channel.enabled = enabled;
        }
        if let Some(methods) = self.methods {
            channel.methods = methods;
        }
        if let Some(settings) = self.settings {
            settings.apply(&mut channel.settings);
        }
    }
}

// ---------------------------------------------------------------------------
// 模板
// ---------------------------------------------------------------------------

/// 模板变量值
///
/// 替换值为类型化的标签联合而非任意 JSON，注册时按模板声明的
/// 变量列表校验，杜绝把 "undefined" 字面量渲染进文案的可能。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl TemplateValue {
    /// 渲染为替换文本
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }

    /// 条件块的真值判定：非空字符串、非零数值、true 为真
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty(),
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Bool(b) => *b,
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for TemplateValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for TemplateValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for TemplateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// 模板派生字段设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSettings {
    #[serde(default)]
    pub persistent: bool,
    #[serde(default)]
    pub priority: NotificationPriority,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// 过期时长（分钟），实例化时据此计算 expires_at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_minutes: Option<i64>,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            persistent: false,
            priority: NotificationPriority::Normal,
            category: "system".to_string(),
            sound: None,
            icon: None,
            expires_in_minutes: None,
        }
    }
}

/// 通知模板
///
/// 可复用的通知蓝图。标题与正文支持 `{{variable}}` 占位符和
/// 单层 `{{#if cond}}...{{/if}}` 条件块。模板本身不可变，
/// 每次实例化产出独立的通知记录。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationTemplate {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    /// 声明的变量名列表，渲染前据此校验传入变量
    #[serde(default)]
    pub variables: Vec<String>,
    /// 默认动作（不含回调，回调在宿主侧绑定）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_actions: Vec<NotificationAction>,
    #[serde(default)]
    pub settings: TemplateSettings,
}

impl NotificationTemplate {
    pub fn new(
        id: impl Into<String>,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            notification_type,
            title: title.into(),
            message: message.into(),
            variables: Vec::new(),
            default_actions: Vec::new(),
            settings: TemplateSettings::default(),
        }
    }

    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables = variables.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_settings(mut self, settings: TemplateSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_default_action(mut self, action: NotificationAction) -> Self {
        self.default_actions.push(action);
        self
    }
}

/// 模板设置的部分更新
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSettingsUpdate {
    pub persistent: Option<bool>,
    pub priority: Option<NotificationPriority>,
    pub category: Option<String>,
    pub sound: Option<String>,
    pub icon: Option<String>,
    pub expires_in_minutes: Option<i64>,
}

impl TemplateSettingsUpdate {
    pub fn apply(self, settings: &mut TemplateSettings) {
        if let Some(persistent) = self.persistent {
            settings.persistent = persistent;
        }
        if let Some(priority) = self.priority {
            settings.priority = priority;
        }
        if let Some(category) = self.category {
            settings.category = category;
        }
        if let Some(sound) = self.sound {
            settings.sound = Some(sound);
        }
        if let Some(icon) = self.icon {
            settings.icon = Some(icon);
        }
        if let Some(minutes) = self.expires_in_minutes {
            settings.expires_in_minutes = Some(minutes);
        }
    }
}

/// 模板的部分更新
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUpdate {
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub variables: Option<Vec<String>>,
    pub default_actions: Option<Vec<NotificationAction>>,
    pub settings: Option<TemplateSettingsUpdate>,
}

impl TemplateUpdate {
    pub fn apply(self, template: &mut NotificationTemplate) {
        if let Some(notification_type) = self.notification_type {
            template.notification_type = notification_type;
        }
        if let Some(title) = self.title {
            template.title = title;
        }
        if let Some(message) = self.message {
            template.message = message;
        }
        if let Some(variables) = self.variables {
            template.variables = variables;
        }
        if let Some(default_actions) = self.default_actions {
            template.default_actions = default_actions;
        }
        if let Some(settings) = self.settings {
            settings.apply(&mut template.settings);
        }
    }
}

// ---------------------------------------------------------------------------
// 邮件与推送
// ---------------------------------------------------------------------------

/// 邮件投递设置
///
/// enabled 且 verified 同时为真时邮件渠道才可用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmailSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// 邮件模板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    pub id: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub variables: Vec<String>,
}

/// 邮件模板的部分更新
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplateUpdate {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub variables: Option<Vec<String>>,
}

impl EmailTemplateUpdate {
    pub fn apply(self, template: &mut EmailTemplate) {
        if let Some(subject) = self.subject {
            template.subject = subject;
        }
        if let Some(body) = self.body {
            template.body = body;
        }
        if let Some(variables) = self.variables {
            template.variables = variables;
        }
    }
}

/// 推送订阅
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub id: String,
    pub endpoint: String,
    pub created_at: DateTime<Utc>,
}

impl PushSubscription {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            endpoint: endpoint.into(),
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// 全局设置
// ---------------------------------------------------------------------------

/// 全局通知设置
///
/// 最终裁决权：全局禁用时任何渠道都不投递，与渠道级开关无关
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    pub enabled: bool,
    pub sound: bool,
    pub vibration: bool,
    pub desktop: bool,
    pub mobile: bool,
    /// 免打扰时段总开关，关闭时渠道级时段不生效
    pub quiet_hours_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_hours: Option<QuietHours>,
    /// 勿扰模式：抑制除 URGENT 外的一切投递
    pub do_not_disturb: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
            vibration: true,
            desktop: true,
            mobile: true,
            quiet_hours_enabled: false,
            quiet_hours: None,
            do_not_disturb: false,
        }
    }
}

/// 全局设置的部分更新
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub enabled: Option<bool>,
    pub sound: Option<bool>,
    pub vibration: Option<bool>,
    pub desktop: Option<bool>,
    pub mobile: Option<bool>,
    pub quiet_hours_enabled: Option<bool>,
    pub quiet_hours: Option<QuietHours>,
    pub do_not_disturb: Option<bool>,
}

impl SettingsUpdate {
    pub fn apply(self, settings: &mut GlobalSettings) {
        if let Some(enabled) = self.enabled {
            settings.enabled = enabled;
        }
        if let Some(sound) = self.sound {
            settings.sound = sound;
        }
        if let Some(vibration) = self.vibration {
            settings.vibration = vibration;
        }
        if let Some(desktop) = self.desktop {
            settings.desktop = desktop;
        }
        if let Some(mobile) = self.mobile {
            settings.mobile = mobile;
        }
        if let Some(quiet_hours_enabled) = self.quiet_hours_enabled {
            settings.quiet_hours_enabled = quiet_hours_enabled;
        }
        if let Some(quiet_hours) = self.quiet_hours {
            settings.quiet_hours = Some(quiet_hours);
        }
        if let Some(do_not_disturb) = self.do_not_disturb {
            settings.do_not_disturb = do_not_disturb;
        }
    }
}

// ---------------------------------------------------------------------------
// 分析计数器
// ---------------------------------------------------------------------------

/// 分析计数器种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyticsKind {
    Sent,
    Delivered,
    Opened,
    Clicked,
    Dismissed,
}

/// 分析计数器
///
/// 五个单调递增计数，作用域为 Store 生命周期，仅显式重置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsCounters {
    pub sent: u64,
    pub delivered: u64,
    pub opened: u64,
    pub clicked: u64,
    pub dismissed: u64,
}

impl AnalyticsCounters {
    pub fn increment(&mut self, kind: AnalyticsKind) {
        match kind {
            AnalyticsKind::Sent => self.sent += 1,
            AnalyticsKind::Delivered => self.delivered += 1,
            AnalyticsKind::Opened => self.opened += 1,
            AnalyticsKind::Clicked => self.clicked += 1,
            AnalyticsKind::Dismissed => self.dismissed += 1,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// 过滤与排序（仅 UI 态，不参与持久化）
// ---------------------------------------------------------------------------

/// 通知列表过滤条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationFilter {
    pub notification_type: Option<NotificationType>,
    pub category: Option<String>,
    /// Some(true) 只看已读，Some(false) 只看未读，None 不过滤
    pub read: Option<bool>,
    pub priority: Option<NotificationPriority>,
    /// 创建时间范围（闭区间）
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// 排序键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Timestamp,
    /// 按优先级序号比较
    Priority,
    /// 按类型名字面值比较
    Type,
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// 排序状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotificationSort {
    pub key: SortKey,
    pub direction: SortDirection,
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------
