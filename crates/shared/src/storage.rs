//! 本地键值存储模块
//!
//! 提供统一的键值存储接口和两种实现：进程内内存存储（测试与默认）
//! 和按键落盘的 JSON 文件存储（宿主应用的本地缓存镜像）。
//! 存储语义为尽力而为，不提供跨设备同步或持久性保证。

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use crate::error::{NotifyError, Result};

/// 键值存储接口
///
/// 值统一为字符串（调用方负责 JSON 序列化），保证 trait 对象安全，
/// 便于 Store 以 `Arc<dyn KeyValueStorage>` 持有任意实现。
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// 获取值，键不存在时返回 None
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 设置值，覆盖已有内容
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// 删除键，键不存在时静默成功
    async fn delete(&self, key: &str) -> Result<()>;

    /// 检查键是否存在
    async fn exists(&self, key: &str) -> Result<bool>;
}

/// 存储键生成器
///
/// 键遵循命名空间约定：`{namespace}:notify:snapshot` 等，
/// 与同一存储介质中其他状态槽（如会话、用户配置）隔离。
pub struct StorageKey;

impl StorageKey {
    /// 通知中心完整快照
    pub fn snapshot(namespace: &str) -> String {
        format!("{}:notify:snapshot", namespace)
    }

    /// 全局通知设置（单独存储，便于设置页快速读取）
    pub fn settings(namespace: &str) -> String {
        format!("{}:notify:settings", namespace)
    }
}

// ---------------------------------------------------------------------------
// 内存存储
// ---------------------------------------------------------------------------

/// 进程内内存存储
///
/// 默认实现，也用于单元测试。进程退出后数据即丢失。
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前存储的键数量
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.entries.read().contains_key(key))
    }
}

// ---------------------------------------------------------------------------
// 文件存储
// ---------------------------------------------------------------------------

/// JSON 文件存储
///
/// 每个键对应 data_dir 下的一个 `.json` 文件。键中的冒号等
/// 非文件名安全字符统一替换为下划线。
pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// 键到文件路径的映射
    fn path_for(&self, key: &str) -> PathBuf {
        let sanitized: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.data_dir.join(format!("{}.json", sanitized))
    }

    async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(NotifyError::from)
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(NotifyError::from(e)),
        }
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_dir().await?;
        let path = self.path_for(key);
        tokio::fs::write(&path, value).await?;
        debug!(key, path = %path.display(), "存储写入完成");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(NotifyError::from(e)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path_for(key)).await?)
    }
}
