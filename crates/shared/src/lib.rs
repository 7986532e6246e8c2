//! 共享库
//!
//! 包含通知中心各模块共用的配置、错误处理、可观测性初始化和
//! 本地键值存储等基础设施代码。

pub mod config;
pub mod error;
pub mod observability;
pub mod storage;
