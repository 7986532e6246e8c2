//! 通知模板引擎
//!
//! 提供模板渲染与实例化功能，支持 `{{variable}}` 变量替换和
//! 单层 `{{#if condition}}...{{/if}}` 条件块。
//!
//! ## 使用示例
//!
//! ```ignore
//! let engine = TemplateEngine::new();
//! let template = NotificationTemplate::new(
//!     "task_completed",
//!     NotificationType::Task,
//!     "任务完成",
//!     "{{taskName}} 已完成{{#if hasOutput}}，产出已就绪{{/if}}",
//! )
//! .with_variables(["taskName", "hasOutput"]);
//!
//! let mut vars = HashMap::new();
//! vars.insert("taskName".to_string(), TemplateValue::from("构建"));
//! vars.insert("hasOutput".to_string(), TemplateValue::from(true));
//!
//! let record = engine.instantiate(&template, &vars, TemplateOverrides::default())?;
//! // record.message == "构建 已完成，产出已就绪"
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use tracing::warn;

use crate::error::{CenterError, Result};
use crate::types::{NotificationDraft, NotificationRecord, NotificationTemplate, TemplateValue};

/// 实例化时的字段覆盖
///
/// 在模板派生字段之后应用，显式覆盖优先于模板默认值
#[derive(Debug, Clone, Default)]
pub struct TemplateOverrides {
    /// 覆盖自动生成的记录 id
    pub id: Option<String>,
    pub notification_type: Option<crate::types::NotificationType>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub persistent: Option<bool>,
    pub priority: Option<crate::types::NotificationPriority>,
    pub category: Option<String>,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    pub actions: Option<Vec<crate::types::NotificationAction>>,
    pub sound: Option<String>,
    pub icon: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// 模板引擎
///
/// 无状态的渲染器，模板本身由 Store 持有
pub struct TemplateEngine {
    /// 变量匹配正则，变量名支持字母、数字、下划线
    variable_regex: Regex,
    /// 条件块匹配正则（单层，非贪婪）
    conditional_regex: Regex,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self {
            variable_regex: Regex::new(r"\{\{(\w+)\}\}").unwrap(),
            conditional_regex: Regex::new(r"(?s)\{\{#if\s+(\w+)\}\}(.*?)\{\{/if\}\}").unwrap(),
        }
    }

    /// 渲染模板字符串
    ///
    /// 先处理条件块再做变量替换，因此条件块内部的占位符
    /// 仅在条件为真时被替换。引用了未提供变量的占位符会导致
    /// 渲染失败，绝不把占位符或占位文本留在产出文案里。
    pub fn render(
        &self,
        template: &str,
        variables: &HashMap<String, TemplateValue>,
    ) -> Result<String> {
        // 条件块：真值保留内部内容，假值（含变量缺失）整块移除
        let after_conditionals = self
            .conditional_regex
            .replace_all(template, |caps: &regex::Captures| {
                let truthy = variables
                    .get(&caps[1])
                    .map(TemplateValue::is_truthy)
                    .unwrap_or(false);
                if truthy { caps[2].to_string() } else { String::new() }
            })
            .into_owned();

        let mut missing = Vec::new();
        let rendered = self
            .variable_regex
            .replace_all(&after_conditionals, |caps: &regex::Captures| {
                match variables.get(&caps[1]) {
                    Some(value) => value.render(),
                    None => {
                        missing.push(caps[1].to_string());
                        String::new()
                    }
                }
            })
            .into_owned();

        if missing.is_empty() {
            Ok(rendered)
        } else {
            Err(CenterError::TemplateRender {
                template_id: String::new(),
                reason: format!("缺少变量: {}", missing.join(", ")),
            })
        }
    }

    /// 校验传入变量覆盖模板声明的变量列表
    ///
    /// 返回缺失的变量名（空列表表示通过）
    pub fn validate_variables(
        &self,
        template: &NotificationTemplate,
        variables: &HashMap<String, TemplateValue>,
    ) -> Vec<String> {
        template
            .variables
            .iter()
            .filter(|name| !variables.contains_key(*name))
            .cloned()
            .collect()
    }

    /// 提取模板字符串中引用的所有变量名（含条件块的条件名）
    pub fn extract_variables(&self, template: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .conditional_regex
            .captures_iter(template)
            .map(|caps| caps[1].to_string())
            .collect();

        let without_conditionals = self.conditional_regex.replace_all(template, "$2");
        for caps in self.variable_regex.captures_iter(&without_conditionals) {
            names.push(caps[1].to_string());
        }

        names.sort();
        names.dedup();
        names
    }

    /// 从模板实例化一条通知记录
    ///
    /// 流程：变量校验 -> 渲染标题和正文 -> 填充模板派生字段
    /// （类型、常驻、优先级、分类、提示音、图标、过期时间、默认动作）
    /// -> 应用调用方覆盖。校验失败时整体拒绝，不产出记录。
    pub fn instantiate(
        &self,
        template: &NotificationTemplate,
        variables: &HashMap<String, TemplateValue>,
        overrides: TemplateOverrides,
    ) -> Result<NotificationRecord> {
        let missing = self.validate_variables(template, variables);
        if !missing.is_empty() {
            warn!(
                template_id = %template.id,
                missing = ?missing,
                "模板变量缺失，拒绝实例化"
            );
            return Err(CenterError::TemplateRender {
                template_id: template.id.clone(),
                reason: format!("缺少变量: {}", missing.join(", ")),
            });
        }

        let title = self
            .render(&template.title, variables)
            .map_err(|e| Self::with_template_id(e, &template.id))?;
        let message = self
            .render(&template.message, variables)
            .map_err(|e| Self::with_template_id(e, &template.id))?;

        let settings = &template.settings;
        let draft = NotificationDraft {
            id: overrides.id,
            notification_type: Some(
                overrides
                    .notification_type
                    .unwrap_or(template.notification_type),
            ),
            title: Some(overrides.title.unwrap_or(title)),
            message: Some(overrides.message.unwrap_or(message)),
            persistent: Some(overrides.persistent.unwrap_or(settings.persistent)),
            priority: Some(overrides.priority.unwrap_or(settings.priority)),
            category: Some(overrides.category.unwrap_or_else(|| settings.category.clone())),
            metadata: overrides.metadata,
            actions: Some(
                overrides
                    .actions
                    .unwrap_or_else(|| template.default_actions.clone()),
            ),
            expires_at: overrides.expires_at.or_else(|| {
                settings
                    .expires_in_minutes
                    .map(|minutes| Utc::now() + Duration::minutes(minutes))
            }),
            sound: overrides.sound.or_else(|| settings.sound.clone()),
            icon: overrides.icon.or_else(|| settings.icon.clone()),
        };

        Ok(draft.into_record())
    }

    fn with_template_id(err: CenterError, template_id: &str) -> CenterError {
        match err {
            CenterError::TemplateRender { reason, .. } => CenterError::TemplateRender {
                template_id: template_id.to_string(),
                reason,
            },
            other => other,
        }
    }
}

/// 内置模板集合
///
/// Store 初始化时注册的默认模板
pub fn builtin_templates() -> Vec<NotificationTemplate> {
    use crate::types::{NotificationAction, NotificationPriority, NotificationType, TemplateSettings};

    vec![
        NotificationTemplate::new(
            "task_completed",
            NotificationType::Task,
            "任务完成",
            "{{taskName}} 已完成{{#if hasOutput}}，产出已就绪{{/if}}",
        )
        .with_variables(["taskName", "hasOutput"])
        .with_default_action(NotificationAction::new("view", "查看"))
        .with_settings(TemplateSettings {
            category: "task".to_string(),
            expires_in_minutes: Some(60),
            ..Default::default()
        }),
        NotificationTemplate::new(
            "task_failed",
            NotificationType::Error,
            "任务失败",
            "{{taskName}} 执行失败：{{reason}}",
        )
        .with_variables(["taskName", "reason"])
        .with_default_action(NotificationAction::new("retry", "重试"))
        .with_settings(TemplateSettings {
            category: "task".to_string(),
            priority: NotificationPriority::High,
            persistent: true,
            ..Default::default()
        }),
        NotificationTemplate::new(
            "new_message",
            NotificationType::Message,
            "新消息",
            "{{senderName}}：{{preview}}",
        )
        .with_variables(["senderName", "preview"])
        .with_settings(TemplateSettings {
            category: "chat".to_string(),
            sound: Some("message".to_string()),
            ..Default::default()
        }),
        NotificationTemplate::new(
            "system_maintenance",
            NotificationType::System,
            "系统维护通知",
            "系统将于 {{startTime}} 进行维护，预计持续 {{durationMinutes}} 分钟",
        )
        .with_variables(["startTime", "durationMinutes"])
        .with_settings(TemplateSettings {
            category: "system".to_string(),
            priority: NotificationPriority::High,
            persistent: true,
            ..Default::default()
        }),
    ]
}
