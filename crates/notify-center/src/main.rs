//! 通知中心演示程序
//!
//! 加载配置并初始化日志后，恢复上次会话的状态快照，启动后台
//! 维护 Worker，创建几条演示通知并处理投递队列，退出前落盘。

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;

use notify_center::{
    NotificationDraft, NotificationPriority, NotificationStore, StoreEvent, TemplateOverrides,
    TemplateValue,
};
use notify_shared::config::AppConfig;
use notify_shared::observability::init_tracing;
use notify_shared::storage::FileStorage;
use notify_center::worker::MaintenanceWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("notify-center").context("加载配置失败")?;
    init_tracing(&config.observability).map_err(|e| anyhow::anyhow!(e))?;

    info!(
        service = %config.service_name,
        environment = %config.environment,
        "通知中心启动"
    );

    let storage = FileStorage::new(&config.storage.data_dir);
    let store = Arc::new(NotificationStore::with_defaults());
    let namespace = config.storage.namespace.clone();

    if store.load(&storage, &namespace).await? {
        info!(unread = store.unread_count(), "已恢复上次会话状态");
    }

    // 事件订阅：把状态变更打到日志
    let mut events = store.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                StoreEvent::NotificationAdded { record } => {
                    info!(id = %record.id, title = %record.title, "新通知");
                }
                StoreEvent::QueueProcessed { delivered, failed } => {
                    info!(delivered, failed, "队列处理");
                }
                _ => {}
            }
        }
    });

    // 后台维护 Worker
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = MaintenanceWorker::new(store.clone(), &config.maintenance);
    let worker_handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    // 演示：直接创建一条通知
    store.add_notification(NotificationDraft {
        title: Some("欢迎使用通知中心".to_string()),
        message: Some("这是一条演示通知".to_string()),
        priority: Some(NotificationPriority::Normal),
        ..Default::default()
    })?;

    // 演示：从模板实例化
    let mut vars = HashMap::new();
    vars.insert("taskName".to_string(), TemplateValue::from("数据同步"));
    vars.insert("hasOutput".to_string(), TemplateValue::from(true));
    store.create_from_template("task_completed", &vars, TemplateOverrides::default())?;

    let report = store.process_queue().await?;
    info!(
        processed = report.processed,
        delivered = report.delivered,
        "演示投递完成"
    );
    info!(unread = store.unread_count(), analytics = ?store.analytics(), "当前状态");

    store.save(&storage, &namespace).await.context("保存状态失败")?;

    let _ = shutdown_tx.send(true);
    let _ = worker_handle.await;

    info!("通知中心退出");
    Ok(())
}
