//! 数据库迁移模块
//!
//! 单词表结构按版本号递增演进，已应用的版本记录在 `schema_migrations` 中。
//! 每个版本在独立的 IMMEDIATE 事务中应用，重复运行不会重复执行。

use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;

use crate::storage::{StorageError, StorageResult};

/// 当前数据库 schema 版本
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// 单个版本的结构变更
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i32,
    pub name: &'static str,
    pub sql: &'static str,
}

/// 全部迁移，按版本号升序
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "初始表结构",
        sql: include_str!("schema.sql"),
    },
    Migration {
        version: 2,
        name: "添加字母与查重索引",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_words_first_letter
                ON words(first_letter, english);

            CREATE INDEX IF NOT EXISTS idx_words_english
                ON words(english);
        "#,
    },
];

const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_migrations (
        version INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        applied_at TEXT NOT NULL
    );
"#;

/// 已应用的版本号，升序
fn applied_versions(conn: &Connection) -> StorageResult<Vec<i32>> {
    conn.execute_batch(MIGRATIONS_TABLE)?;

    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<i32>, _>>()?;

    Ok(versions)
}

/// 当前数据库版本，尚未迁移时为 0
pub fn current_version(conn: &Connection) -> StorageResult<i32> {
    Ok(applied_versions(conn)?.last().copied().unwrap_or(0))
}

/// 应用所有未执行的迁移，返回最终版本号
pub fn run_migrations(conn: &Connection) -> StorageResult<i32> {
    let applied = applied_versions(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .collect();

    if pending.is_empty() {
        tracing::debug!(version = CURRENT_SCHEMA_VERSION, "数据库已是最新版本");
        return current_version(conn);
    }

    for migration in pending {
        tracing::info!(version = migration.version, name = migration.name, "运行迁移");
        apply(conn, migration).inspect_err(|e| {
            tracing::error!(version = migration.version, error = %e, "迁移失败");
        })?;
    }

    current_version(conn)
}

fn apply(conn: &Connection, migration: &Migration) -> StorageResult<()> {
    conn.execute_batch(MIGRATIONS_TABLE)?;
    conn.execute_batch("BEGIN IMMEDIATE")?;

    let result = conn
        .execute_batch(migration.sql)
        .and_then(|()| {
            conn.execute(
                "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![
                    migration.version,
                    migration.name,
                    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
                ],
            )
        });

    match result {
        Ok(_) => {
            conn.execute_batch("COMMIT")?;
            Ok(())
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(StorageError::Migration(format!(
                "v{} {}: {}",
                migration.version, migration.name, e
            )))
        }
    }
}

/// 已应用的迁移记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    pub version: i32,
    pub name: String,
    /// RFC 3339，UTC
    pub applied_at: String,
}

pub fn migration_history(conn: &Connection) -> StorageResult<Vec<MigrationRecord>> {
    conn.execute_batch(MIGRATIONS_TABLE)?;

    let mut stmt =
        conn.prepare("SELECT version, name, applied_at FROM schema_migrations ORDER BY version")?;
    let records = stmt
        .query_map([], |row| {
            Ok(MigrationRecord {
                version: row.get(0)?,
                name: row.get(1)?,
                applied_at: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

/// 数据库健康状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseHealth {
    pub schema_version: i32,
    /// 尚未应用的版本号
    pub pending_versions: Vec<i32>,
    pub has_words_table: bool,
    pub word_count: i64,
    pub db_size_bytes: i64,
}

impl DatabaseHealth {
    pub fn needs_migration(&self) -> bool {
        !self.pending_versions.is_empty()
    }

    pub fn is_healthy(&self) -> bool {
        self.has_words_table && !self.needs_migration()
    }
}

pub fn health_check(conn: &Connection) -> StorageResult<DatabaseHealth> {
    let applied = applied_versions(conn)?;
    let pending_versions = MIGRATIONS
        .iter()
        .map(|m| m.version)
        .filter(|v| !applied.contains(v))
        .collect();

    let has_words_table: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'words'",
        [],
        |row| row.get(0),
    )?;

    let word_count: i64 = if has_words_table {
        conn.query_row("SELECT COUNT(*) FROM words", [], |row| row.get(0))?
    } else {
        0
    };

    let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
    let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;

    Ok(DatabaseHealth {
        schema_version: applied.last().copied().unwrap_or(0),
        pending_versions,
        has_words_table,
        word_count,
        db_size_bytes: page_count * page_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_versions_are_contiguous() {
        assert_eq!(MIGRATIONS.len(), CURRENT_SCHEMA_VERSION as usize);
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version, i as i32 + 1);
        }
    }

    #[test]
    fn test_fresh_database_migrates_to_current() {
        let conn = fresh();

        assert_eq!(run_migrations(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
        assert_eq!(current_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);

        let health = health_check(&conn).unwrap();
        assert!(health.is_healthy());
        assert!(health.pending_versions.is_empty());
        assert_eq!(health.word_count, 0);
        assert!(health.db_size_bytes > 0);
    }

    #[test]
    fn test_rerun_applies_nothing() {
        let conn = fresh();

        run_migrations(&conn).unwrap();
        let first = migration_history(&conn).unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(migration_history(&conn).unwrap(), first);
    }

    #[test]
    fn test_history_records_utc_timestamp() {
        let conn = fresh();
        run_migrations(&conn).unwrap();

        let history = migration_history(&conn).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].name, "初始表结构");
        assert!(history[0].applied_at.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&history[0].applied_at).is_ok());
    }

    #[test]
    fn test_indexes_created() {
        let conn = fresh();
        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name IN ('idx_words_first_letter', 'idx_words_english')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_partial_database_gets_remaining_versions() {
        let conn = fresh();
        apply(&conn, &MIGRATIONS[0]).unwrap();

        let health = health_check(&conn).unwrap();
        assert_eq!(health.schema_version, 1);
        assert_eq!(health.pending_versions, vec![2]);
        assert!(!health.is_healthy());

        assert_eq!(run_migrations(&conn).unwrap(), 2);
        assert_eq!(migration_history(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_failed_migration_rolls_back() {
        let conn = fresh();
        run_migrations(&conn).unwrap();

        let broken = Migration {
            version: 99,
            name: "broken",
            sql: "CREATE TABLE extra (id INTEGER); NOT VALID SQL;",
        };
        assert!(matches!(apply(&conn, &broken), Err(StorageError::Migration(_))));

        let extra: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'extra'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(extra, 0);
        assert_eq!(current_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_health_before_migration() {
        let health = health_check(&fresh()).unwrap();
        assert!(!health.has_words_table);
        assert!(health.needs_migration());
        assert_eq!(health.schema_version, 0);
    }
}
