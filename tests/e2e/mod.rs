//! 通知中心端到端测试
//!
//! 测试覆盖完整的业务流程，包括：
//! - 通知生命周期与未读计数一致性
//! - 模板实例化到投递的全链路
//! - 渠道过滤与勿扰设置
//! - 瞬时失败重试
//! - 持久化与会话恢复

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use notify_center::worker::MaintenanceWorker;
use notify_center::{
    ChannelUpdate, DeliveryMethod, NotificationChannel, NotificationDraft, NotificationPriority,
    NotificationStore, PushPermission, SettingsUpdate, StoreEvent, TemplateOverrides,
    TemplateValue,
};
use notify_shared::config::MaintenanceConfig;
use notify_shared::storage::MemoryStorage;

fn draft(title: &str, category: &str) -> NotificationDraft {
    NotificationDraft {
        title: Some(title.to_string()),
        message: Some(format!("{title} 的正文")),
        category: Some(category.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_full_notification_lifecycle() {
    let store = NotificationStore::with_defaults();

    let a = store.add_notification(draft("一", "system")).unwrap();
    let b = store.add_notification(draft("二", "system")).unwrap();
    let c = store.add_notification(draft("三", "system")).unwrap();
    assert_eq!(store.unread_count(), 3);

    // 已读 -> 忽略 -> 删除，未读计数每一步都保持一致
    store.mark_as_read(&a);
    assert_eq!(store.unread_count(), 2);

    store.dismiss_notification(&b);
    assert_eq!(store.unread_count(), 1);
    assert_eq!(store.notifications().len(), 2);

    store.remove_notification(&c);
    assert_eq!(store.unread_count(), 0);

    let report = store.process_queue().await.unwrap();
    // c 已删除，队列中只剩 a 和 b
    assert_eq!(report.processed, 2);
    assert_eq!(store.queue_len(), 0);
}

#[tokio::test]
async fn test_template_to_delivery_pipeline() {
    let store = NotificationStore::with_defaults();
    store.set_push_permission(PushPermission::Granted);
    let mut events = store.subscribe();

    let mut vars = HashMap::new();
    vars.insert("taskName".to_string(), TemplateValue::from("夜间备份"));
    vars.insert("hasOutput".to_string(), TemplateValue::from(true));

    let id = store
        .create_from_template("task_completed", &vars, TemplateOverrides::default())
        .unwrap()
        .unwrap();

    let record = store.get_notification(&id).unwrap();
    assert_eq!(record.message, "夜间备份 已完成，产出已就绪");
    assert_eq!(record.category, "task");
    assert!(!record.message.contains("{{"));

    let report = store.process_queue().await.unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(store.analytics().sent, 1);
    assert_eq!(store.analytics().delivered, 1);

    // 事件序列：添加 -> 队列处理
    assert!(matches!(
        events.try_recv().unwrap(),
        StoreEvent::NotificationAdded { .. }
    ));
    assert!(matches!(
        events.try_recv().unwrap(),
        StoreEvent::QueueProcessed { delivered: 1, .. }
    ));
}

#[tokio::test]
async fn test_do_not_disturb_suppresses_except_urgent() {
    let store = NotificationStore::new();
    store
        .add_channel(NotificationChannel::new("inbox", "站内"))
        .unwrap();
    store.update_settings(SettingsUpdate {
        do_not_disturb: Some(true),
        ..Default::default()
    });

    store.add_notification(draft("普通", "system")).unwrap();
    store
        .add_notification(NotificationDraft {
            title: Some("紧急".to_string()),
            priority: Some(NotificationPriority::Urgent),
            ..Default::default()
        })
        .unwrap();

    let report = store.process_queue().await.unwrap();
    // 两条都被处理，普通那条无渠道匹配但不算失败
    assert_eq!(report.processed, 2);
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn test_channel_threshold_routing() {
    let store = NotificationStore::new();
    store
        .add_channel(
            NotificationChannel::new("important", "重要")
                .with_min_priority(NotificationPriority::High)
                .with_methods(vec![DeliveryMethod::InApp, DeliveryMethod::Push]),
        )
        .unwrap();
    store.set_push_permission(PushPermission::Granted);

    store
        .add_notification(NotificationDraft {
            title: Some("高优".to_string()),
            priority: Some(NotificationPriority::High),
            ..Default::default()
        })
        .unwrap();
    store.add_notification(draft("普通", "system")).unwrap();

    let report = store.process_queue().await.unwrap();
    assert_eq!(report.processed, 2);
    assert!(report.failures.is_empty());

    // 渠道禁用后不再投递
    store.update_channel(
        "important",
        ChannelUpdate {
            enabled: Some(false),
            ..Default::default()
        },
    );
    store
        .add_notification(NotificationDraft {
            title: Some("再来一条".to_string()),
            priority: Some(NotificationPriority::Urgent),
            ..Default::default()
        })
        .unwrap();
    let report = store.process_queue().await.unwrap();
    assert_eq!(report.processed, 1);
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn test_transient_email_retry_until_success() {
    let store = NotificationStore::with_defaults();
    store.set_push_permission(PushPermission::Granted);
    store.set_email_address("user@example.com");
    store.set_email_enabled(true);
    store.verify_email("135790").await.unwrap();

    let id = store
        .add_notification(NotificationDraft {
            title: Some("邮件".to_string()),
            priority: Some(NotificationPriority::High),
            metadata: Some(HashMap::from([(
                "simulateTransientEmail".to_string(),
                serde_json::Value::Bool(true),
            )])),
            ..Default::default()
        })
        .unwrap();

    // 第一轮瞬时失败，重新入队
    let report = store.process_queue().await.unwrap();
    assert_eq!(report.requeued, 1);
    assert_eq!(store.queue_len(), 1);

    // 故障排除后第二轮成功
    store.remove_notification(&id);
    let fixed = store
        .add_notification(NotificationDraft {
            title: Some("邮件".to_string()),
            priority: Some(NotificationPriority::High),
            ..Default::default()
        })
        .unwrap();
    let report = store.process_queue().await.unwrap();
    assert_eq!(report.delivered, 1);
    assert!(store.get_notification(&fixed).is_some());
}

#[tokio::test]
async fn test_expiry_sweep_via_worker() {
    let store = Arc::new(NotificationStore::with_defaults());
    store
        .add_notification(NotificationDraft {
            title: Some("短命".to_string()),
            expires_at: Some(Utc::now() - chrono::Duration::seconds(1)),
            ..Default::default()
        })
        .unwrap();
    store.add_notification(draft("常规", "system")).unwrap();

    let config = MaintenanceConfig {
        sweep_interval_seconds: 1,
        queue_interval_seconds: 3600,
        ..Default::default()
    };
    let worker = MaintenanceWorker::new(store.clone(), &config);
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(async move { worker.run(rx).await });

    tokio::time::sleep(Duration::from_millis(1500)).await;
    tx.send(true).unwrap();
    let _ = handle.await;

    assert_eq!(store.notifications().len(), 1);
    assert_eq!(store.unread_count(), 1);
}

#[tokio::test]
async fn test_session_persistence_roundtrip() {
    let storage = MemoryStorage::new();
    let namespace = "e2e";

    // 第一个会话：积累状态后落盘
    {
        let store = NotificationStore::with_defaults();
        let id = store.add_notification(draft("会话一", "system")).unwrap();
        store.mark_as_read(&id);
        store.add_notification(draft("未读", "chat")).unwrap();
        store.update_settings(SettingsUpdate {
            do_not_disturb: Some(true),
            ..Default::default()
        });
        store.process_queue().await.unwrap();
        store.save(&storage, namespace).await.unwrap();
    }

    // 第二个会话：恢复并校验派生状态
    let store = NotificationStore::new();
    assert!(store.load(&storage, namespace).await.unwrap());

    assert_eq!(store.notifications().len(), 2);
    assert_eq!(store.unread_count(), 1);
    assert!(store.settings().do_not_disturb);
    assert_eq!(store.analytics().sent, 2);
    // 队列不跨会话
    assert_eq!(store.queue_len(), 0);
}
