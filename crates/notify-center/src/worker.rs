//! 后台维护 Worker
//!
//! 定期执行两类维护任务：
//! 1. 清理已过期的通知（常驻通知豁免）
//! 2. 处理待投递队列，包括瞬时失败后重新入队的通知
//!
//! 另提供浮层提示的自动消失计时器，可在用户手动关闭时取消。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use notify_shared::config::MaintenanceConfig;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::error::CenterError;
use crate::store::NotificationStore;

/// 维护 Worker
///
/// 以固定间隔轮询 Store，直到收到停机信号。
/// 过期清理和队列处理使用各自独立的间隔。
pub struct MaintenanceWorker {
    store: Arc<NotificationStore>,
    /// 过期清理间隔
    sweep_interval: Duration,
    /// 队列处理间隔
    queue_interval: Duration,
}

impl MaintenanceWorker {
    pub fn new(store: Arc<NotificationStore>, config: &MaintenanceConfig) -> Self {
        Self {
            store,
            sweep_interval: Duration::from_secs(config.sweep_interval_seconds),
            queue_interval: Duration::from_secs(config.queue_interval_seconds),
        }
    }

    /// 使用默认间隔创建 Worker
    pub fn with_defaults(store: Arc<NotificationStore>) -> Self {
        Self::new(store, &MaintenanceConfig::default())
    }

    /// 主循环：持续执行维护任务直到收到停机信号
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            sweep_interval = ?self.sweep_interval,
            queue_interval = ?self.queue_interval,
            "维护 Worker 已启动"
        );

        let mut sweep_tick = tokio::time::interval(self.sweep_interval);
        let mut queue_tick = tokio::time::interval(self.queue_interval);
        // 首个 tick 立即到期，跳过以避免启动时空转
        sweep_tick.tick().await;
        queue_tick.tick().await;

        loop {
            tokio::select! {
                _ = sweep_tick.tick() => {
                    let removed = self.store.remove_expired_notifications(Utc::now());
                    if removed > 0 {
                        debug!(removed, "过期清理完成");
                    }
                }
                _ = queue_tick.tick() => {
                    match self.store.process_queue().await {
                        Ok(report) if report.processed > 0 => {
                            debug!(
                                processed = report.processed,
                                delivered = report.delivered,
                                "队列处理完成"
                            );
                        }
                        Ok(_) => {}
                        // 上一轮尚未结束，等下个 tick
                        Err(CenterError::QueueBusy) => {
                            debug!("队列处理仍在进行，跳过本轮");
                        }
                        Err(e) => {
                            error!(error = %e, "队列处理出错");
                        }
                    }
                }
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("收到停机信号，维护 Worker 退出");
                        return;
                    }
                }
            }
        }
    }
}

/// 浮层自动消失计时器
///
/// 到期后忽略对应通知；用户手动关闭时取消计时，避免重复忽略。
/// 常驻通知不应启动计时器，由调用方判断。
pub struct ToastTimer {
    cancel: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<()>,
}

impl ToastTimer {
    /// 启动计时器，`duration` 后忽略指定通知
    pub fn start(store: Arc<NotificationStore>, notification_id: String, duration: Duration) -> Self {
        let (cancel, mut cancelled) = watch::channel(false);
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {
                    debug!(notification_id = %notification_id, "浮层计时到期，自动忽略");
                    store.dismiss_notification(&notification_id);
                }
                _ = cancelled.changed() => {
                    debug!(notification_id = %notification_id, "浮层计时已取消");
                }
            }
        });
        Self { cancel, handle }
    }

    /// 取消计时，通知不再被自动忽略
    pub fn cancel(self) {
        let _ = self.cancel.send(true);
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NotificationDraft;

    fn store_with(title: &str) -> (Arc<NotificationStore>, String) {
        let store = Arc::new(NotificationStore::with_defaults());
        let id = store
            .add_notification(NotificationDraft {
                title: Some(title.to_string()),
                ..Default::default()
            })
            .unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_worker_creation_defaults() {
        let store = Arc::new(NotificationStore::new());
        let worker = MaintenanceWorker::with_defaults(store);

        assert_eq!(worker.sweep_interval.as_secs(), 60);
        assert_eq!(worker.queue_interval.as_secs(), 5);
    }

    #[tokio::test]
    async fn test_worker_shutdown() {
        let store = Arc::new(NotificationStore::new());
        let config = MaintenanceConfig {
            sweep_interval_seconds: 3600,
            queue_interval_seconds: 3600,
            ..Default::default()
        };
        let worker = MaintenanceWorker::new(store, &config);

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { worker.run(rx).await });

        tx.send(true).unwrap();
        // 停机信号应使主循环及时返回
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_processes_queue_on_tick() {
        let (store, _) = store_with("队列");
        let config = MaintenanceConfig {
            sweep_interval_seconds: 3600,
            queue_interval_seconds: 1,
            ..Default::default()
        };
        let worker = MaintenanceWorker::new(store.clone(), &config);

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { worker.run(rx).await });

        // 推进虚拟时间触发一次队列 tick
        tokio::time::sleep(Duration::from_millis(1100)).await;
        tokio::task::yield_now().await;

        assert_eq!(store.queue_len(), 0);
        tx.send(true).unwrap();
        let _ = handle.await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_timer_dismisses() {
        let (store, id) = store_with("浮层");
        let timer = ToastTimer::start(store.clone(), id.clone(), Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(150)).await;
        let _ = timer.handle.await;

        assert!(store.get_notification(&id).unwrap().dismissed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_timer_cancel() {
        let (store, id) = store_with("浮层");
        let timer = ToastTimer::start(store.clone(), id.clone(), Duration::from_millis(100));

        timer.cancel();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(!store.get_notification(&id).unwrap().dismissed);
    }
}
