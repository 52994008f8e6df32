use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "vocab-cards.log";

/// 持有非阻塞文件写入器，最后丢弃以刷新缓冲
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// 按日滚动的日志文件目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLogSettings {
    pub dir: PathBuf,
}

impl FileLogSettings {
    /// `ENABLE_FILE_LOGS=true|1` 开启文件日志，`LOG_DIR` 指定目录
    pub fn from_env() -> Option<Self> {
        Self::from_vars(
            std::env::var("ENABLE_FILE_LOGS").ok().as_deref(),
            std::env::var("LOG_DIR").ok(),
        )
    }

    fn from_vars(enabled: Option<&str>, dir: Option<String>) -> Option<Self> {
        match enabled {
            Some("true") | Some("1") => Some(Self {
                dir: PathBuf::from(dir.unwrap_or_else(|| "./logs".to_string())),
            }),
            _ => None,
        }
    }
}

/// 安装全局 subscriber
///
/// 日志写到 stderr，stdout 留给命令输出；带线程名以区分存储线程的事件。
pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr);

    let file = FileLogSettings::from_env().and_then(|settings| {
        if let Err(err) = std::fs::create_dir_all(&settings.dir) {
            eprintln!("无法创建日志目录 {}: {err}", settings.dir.display());
            return None;
        }
        let appender = RollingFileAppender::new(Rotation::DAILY, &settings.dir, LOG_FILE_PREFIX);
        Some(tracing_appender::non_blocking(appender))
    });

    let (file_layer, guard) = match file {
        Some((writer, guard)) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true);
            (Some(layer), Some(FileLogGuard { _guard: guard }))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_logging_needs_explicit_opt_in() {
        assert_eq!(FileLogSettings::from_vars(None, None), None);
        assert_eq!(FileLogSettings::from_vars(Some("yes"), None), None);
        assert_eq!(
            FileLogSettings::from_vars(Some("1"), None),
            Some(FileLogSettings { dir: PathBuf::from("./logs") })
        );
        assert_eq!(
            FileLogSettings::from_vars(Some("true"), Some("/tmp/vocab".to_string())),
            Some(FileLogSettings { dir: PathBuf::from("/tmp/vocab") })
        );
    }
}
