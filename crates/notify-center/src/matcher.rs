//! 投递匹配判定
//!
//! 纯函数判定一条通知是否应通过某个渠道投递。判定不产生任何副作用，
//! 当前时刻由调用方显式传入，便于对免打扰时段做确定性测试。

use chrono::NaiveTime;

use crate::types::{GlobalSettings, NotificationChannel, NotificationPriority, NotificationRecord};

/// 判定通知是否应通过指定渠道投递
///
/// 按固定顺序短路检查，任一不满足即拒绝：
/// 1. 全局开关关闭 -> 拒绝
/// 2. 渠道开关关闭 -> 拒绝
/// 3. 优先级序号低于渠道阈值 -> 拒绝
/// 4. 渠道声明了分类集合且不含该通知分类 -> 拒绝（空集合视为不限制）
/// 5. 免打扰时段生效且当前时刻处于时段内 -> 拒绝
/// 6. 勿扰模式开启且优先级非 URGENT -> 拒绝
pub fn should_show_notification(
    record: &NotificationRecord,
    channel: &NotificationChannel,
    settings: &GlobalSettings,
    now: NaiveTime,
) -> bool {
    if !settings.enabled {
        return false;
    }

    if !channel.enabled {
        return false;
    }

    if record.priority.rank() < channel.settings.min_priority.rank() {
        return false;
    }

    if !channel.settings.categories.is_empty()
        && !channel.settings.categories.contains(&record.category)
    {
        return false;
    }

    if settings.quiet_hours_enabled {
        if let Some(quiet_hours) = &channel.settings.quiet_hours {
            if quiet_hours.contains(now) {
                return false;
            }
        }
    }

    if settings.do_not_disturb && record.priority != NotificationPriority::Urgent {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NotificationType, QuietHours};

    fn record(priority: NotificationPriority, category: &str) -> NotificationRecord {
        NotificationRecord::new(NotificationType::Info, "t", "m")
            .with_priority(priority)
            .with_category(category)
    }

    fn channel() -> NotificationChannel {
        NotificationChannel::new("ch", "测试渠道")
    }

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_allows_by_default() {
        let settings = GlobalSettings::default();
        assert!(should_show_notification(
            &record(NotificationPriority::Normal, "system"),
            &channel(),
            &settings,
            at(12, 0),
        ));
    }

    #[test]
    fn test_global_disabled_rejects_everything() {
        let settings = GlobalSettings {
            enabled: false,
            ..Default::default()
        };
        // 全局关闭连 URGENT 也拒绝
        assert!(!should_show_notification(
            &record(NotificationPriority::Urgent, "system"),
            &channel(),
            &settings,
            at(12, 0),
        ));
    }

    #[test]
    fn test_channel_disabled() {
        let mut ch = channel();
        ch.enabled = false;
        assert!(!should_show_notification(
            &record(NotificationPriority::Urgent, "system"),
            &ch,
            &GlobalSettings::default(),
            at(12, 0),
        ));
    }

    #[test]
    fn test_min_priority_threshold() {
        let ch = channel().with_min_priority(NotificationPriority::High);
        let settings = GlobalSettings::default();

        assert!(!should_show_notification(
            &record(NotificationPriority::Normal, "system"),
            &ch,
            &settings,
            at(12, 0),
        ));
        assert!(should_show_notification(
            &record(NotificationPriority::High, "system"),
            &ch,
            &settings,
            at(12, 0),
        ));
        assert!(should_show_notification(
            &record(NotificationPriority::Urgent, "system"),
            &ch,
            &settings,
            at(12, 0),
        ));
    }

    #[test]
    fn test_category_membership() {
        let ch = channel().with_categories(["chat", "task"]);
        let settings = GlobalSettings::default();

        assert!(should_show_notification(
            &record(NotificationPriority::Normal, "chat"),
            &ch,
            &settings,
            at(12, 0),
        ));
        assert!(!should_show_notification(
            &record(NotificationPriority::Normal, "billing"),
            &ch,
            &settings,
            at(12, 0),
        ));
    }

    #[test]
    fn test_empty_categories_allow_all() {
        assert!(should_show_notification(
            &record(NotificationPriority::Normal, "anything"),
            &channel(),
            &GlobalSettings::default(),
            at(12, 0),
        ));
    }

    #[test]
    fn test_quiet_hours_overnight() {
        let ch = channel().with_quiet_hours(QuietHours::new("22:00", "08:00"));
        let settings = GlobalSettings {
            quiet_hours_enabled: true,
            ..Default::default()
        };
        let rec = record(NotificationPriority::Normal, "system");

        // 23:30 跨午夜时段内，拒绝
        assert!(!should_show_notification(&rec, &ch, &settings, at(23, 30)));
        // 09:00 时段外，放行
        assert!(should_show_notification(&rec, &ch, &settings, at(9, 0)));
    }

    #[test]
    fn test_quiet_hours_require_global_toggle() {
        let ch = channel().with_quiet_hours(QuietHours::new("22:00", "08:00"));
        // 全局开关关闭时渠道级时段不生效
        assert!(should_show_notification(
            &record(NotificationPriority::Normal, "system"),
            &ch,
            &GlobalSettings::default(),
            at(23, 30),
        ));
    }

    #[test]
    fn test_do_not_disturb_urgent_bypass() {
        let settings = GlobalSettings {
            do_not_disturb: true,
            ..Default::default()
        };

        assert!(!should_show_notification(
            &record(NotificationPriority::High, "system"),
            &channel(),
            &settings,
            at(12, 0),
        ));
        assert!(should_show_notification(
            &record(NotificationPriority::Urgent, "system"),
            &channel(),
            &settings,
            at(12, 0),
        ));
    }

    #[test]
    fn test_do_not_disturb_does_not_bypass_channel_filters() {
        // URGENT 仅豁免勿扰模式，不豁免分类过滤
        let ch = channel().with_categories(["chat"]);
        let settings = GlobalSettings {
            do_not_disturb: true,
            ..Default::default()
        };
        assert!(!should_show_notification(
            &record(NotificationPriority::Urgent, "billing"),
            &ch,
            &settings,
            at(12, 0),
        ));
    }
}
