//! SQLite 离线存储模块
//!
//! 提供本地 SQLite 单词库存储功能，支持：
//! - 单词的持久化与按首字母浏览
//! - 熟悉 / 收藏状态切换
//! - 字母统计

// ============================================================
// 子模块声明
// ============================================================

pub mod migrations;
pub mod models;
pub mod word;

// ============================================================
// 重新导出主要类型
// ============================================================

pub use migrations::{health_check, run_migrations, DatabaseHealth};
pub use models::*;
pub use word::{WordRepository, WordRepositoryRef};

// ============================================================
// 依赖导入
// ============================================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::config::SqliteConfig;

// ============================================================
// 错误类型定义
// ============================================================

/// 存储模块错误类型
///
/// 只表示存储层不可用；"未找到" 与 "影响 0 行" 是正常结果，不是错误。
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("迁移错误: {0}")]
    Migration(String),

    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("锁获取失败: {0}")]
    LockError(String),

    #[error("存储线程已退出")]
    WorkerDisconnected,
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================
// Storage - 统一存储结构体
// ============================================================

/// 统一存储结构体
///
/// 持有唯一的数据库连接；由它创建的所有 Repository 共享同一把锁，
/// 因此对同一个数据库句柄的访问总是串行的。
pub struct Storage {
    conn: Arc<Mutex<Connection>>,
    db_path: String,
}

impl Storage {
    /// 按配置打开（或创建）数据库文件并运行迁移
    ///
    /// # Example
    /// ```ignore
    /// let config = AppConfig::from_env();
    /// let storage = Storage::open(&config.sqlite)?;
    /// ```
    pub fn open(config: &SqliteConfig) -> StorageResult<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let connection = Connection::open(&config.path)?;
        connection.busy_timeout(config.busy_timeout)?;
        connection.execute_batch(&format!(
            "PRAGMA journal_mode={};
             PRAGMA synchronous={};
             PRAGMA cache_size={};",
            config.journal_mode.as_pragma_value(),
            config.synchronous.as_pragma_value(),
            config.cache_size,
        ))?;

        let db_path = config.path.to_string_lossy().to_string();
        tracing::info!(path = %db_path, "打开单词数据库");

        Self::with_connection(connection, db_path)
    }

    /// 创建内存数据库（用于测试）
    pub fn in_memory() -> StorageResult<Self> {
        let connection = Connection::open_in_memory()?;
        connection.execute_batch("PRAGMA cache_size=-64000;")?;

        Self::with_connection(connection, ":memory:".to_string())
    }

    fn with_connection(connection: Connection, db_path: String) -> StorageResult<Self> {
        let version = migrations::run_migrations(&connection)?;
        tracing::debug!(path = %db_path, version, "数据库就绪");

        Ok(Self {
            conn: Arc::new(Mutex::new(connection)),
            db_path,
        })
    }

    /// 获取数据库连接
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// 获取数据库路径
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// 获取单词仓库
    pub fn words(&self) -> WordRepository {
        WordRepository::new(Arc::clone(&self.conn))
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    /// 数据库健康检查
    pub fn health(&self) -> StorageResult<DatabaseHealth> {
        let conn = self.lock()?;
        migrations::health_check(&conn)
    }

    /// 执行事务
    ///
    /// # Example
    /// ```ignore
    /// let id = storage.transaction(|conn| {
    ///     let repo = WordRepositoryRef::new(conn);
    ///     repo.add(&NewWord::new("apple", "", "苹果", ""))
    /// })?;
    /// ```
    pub fn transaction<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T>,
    {
        let mut conn = self.lock()?;

        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;

        Ok(result)
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SqliteJournalMode, SqliteSynchronous};
    use std::time::Duration;

    fn file_config(path: std::path::PathBuf) -> SqliteConfig {
        SqliteConfig {
            path,
            journal_mode: SqliteJournalMode::Wal,
            synchronous: SqliteSynchronous::Normal,
            busy_timeout: Duration::from_millis(5000),
            cache_size: -64000,
        }
    }

    #[test]
    fn test_storage_new_in_memory() {
        let storage = Storage::in_memory().expect("Failed to create in-memory storage");
        assert_eq!(storage.db_path(), ":memory:");
        assert!(storage.health().unwrap().is_healthy());
    }

    #[test]
    fn test_open_creates_parent_dirs_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("vocabulary.db");

        {
            let storage = Storage::open(&file_config(path.clone())).unwrap();
            storage
                .words()
                .add(&NewWord::new("apple", "", "苹果", ""))
                .unwrap();
        }

        assert!(path.exists());

        let storage = Storage::open(&file_config(path)).unwrap();
        assert!(storage.words().exists("apple").unwrap());
        assert_eq!(storage.health().unwrap().word_count, 1);
    }

    #[test]
    fn test_open_fails_when_path_is_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = Storage::open(&file_config(dir.path().to_path_buf()));
        assert!(result.is_err());
    }

    #[test]
    fn test_storage_transaction_commits() {
        let storage = Storage::in_memory().unwrap();

        let id = storage
            .transaction(|conn| WordRepositoryRef::new(conn).add(&NewWord::new("cat", "", "猫", "")))
            .unwrap();

        assert!(storage.words().get_by_id(id).unwrap().is_some());
    }

    #[test]
    fn test_storage_transaction_rolls_back_on_error() {
        let storage = Storage::in_memory().unwrap();

        let result: StorageResult<()> = storage.transaction(|conn| {
            WordRepositoryRef::new(conn).add(&NewWord::new("cat", "", "猫", ""))?;
            Err(StorageError::Migration("abort".to_string()))
        });

        assert!(result.is_err());
        assert!(!storage.words().exists("cat").unwrap());
    }
}
