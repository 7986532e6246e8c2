//! 可观测性初始化模块
//!
//! 提供结构化日志的初始化。通知引擎运行在宿主应用进程内，
//! 不导出分布式追踪，日志是唯一的可观测性出口。

use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::ObservabilityConfig;

/// 初始化 tracing 日志
///
/// 环境变量 RUST_LOG 优先于配置文件中的 log_level。
/// 重复初始化（如测试进程内多次调用）返回 Err，调用方可安全忽略。
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), String> {
    // 构建环境过滤器
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // 构建日志层
    let fmt_layer = if config.log_format == "json" {
        fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer().with_target(true).with_ansi(true).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent_safe() {
        let config = ObservabilityConfig::default();
        // 第一次初始化可能成功也可能因测试并行早已初始化而失败，
        // 但第二次调用必定返回 Err 且不会 panic
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
