//! 单词数据库操作
//!
//! 提供单词的增查、按首字母浏览、状态切换、字母统计与清空操作。

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use crate::storage::models::{first_letter_of, LetterProgress, LetterStats, NewWord, WordRecord};
use crate::storage::{StorageError, StorageResult};

const WORD_COLUMNS: &str =
    "id, english, phonetic, chinese, example, is_favorite, is_familiar, first_letter";

/// 单词数据库操作仓库
///
/// 支持两种使用方式：
/// 1. 使用 `Arc<Mutex<Connection>>` 进行线程安全操作
/// 2. 使用 `&Connection` 引用进行直接操作（适用于事务内操作，见 [`WordRepositoryRef`]）
///
/// 仓库本身不做唯一性约束：导入前的查重由调用方通过 [`WordRepository::exists`] 完成。
pub struct WordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WordRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    // ============================================================
    // 写操作
    // ============================================================

    /// 添加单词，返回新分配的 id
    pub fn add(&self, word: &NewWord) -> StorageResult<i64> {
        let conn = self.get_conn()?;
        Self::add_internal(&conn, word)
    }

    /// 设置熟悉状态，返回受影响行数（id 不存在时为 0）
    pub fn set_familiar(&self, id: i64, value: bool) -> StorageResult<usize> {
        let conn = self.get_conn()?;
        Self::set_familiar_internal(&conn, id, value)
    }

    /// 设置收藏状态，返回受影响行数（id 不存在时为 0）
    pub fn set_favorite(&self, id: i64, value: bool) -> StorageResult<usize> {
        let conn = self.get_conn()?;
        Self::set_favorite_internal(&conn, id, value)
    }

    /// 清空所有单词（不可恢复），返回删除的行数
    pub fn clear_all(&self) -> StorageResult<usize> {
        let conn = self.get_conn()?;
        Self::clear_all_internal(&conn)
    }

    // ============================================================
    // 读操作
    // ============================================================

    /// 检查是否存在英文完全相同（区分大小写）的单词
    pub fn exists(&self, english: &str) -> StorageResult<bool> {
        let conn = self.get_conn()?;
        Self::exists_internal(&conn, english)
    }

    /// 根据 ID 获取单词
    pub fn get_by_id(&self, id: i64) -> StorageResult<Option<WordRecord>> {
        let conn = self.get_conn()?;
        Self::get_by_id_internal(&conn, id)
    }

    /// 根据首字母获取单词列表，按英文升序
    pub fn list_by_letter(&self, letter: &str) -> StorageResult<Vec<WordRecord>> {
        let conn = self.get_conn()?;
        Self::list_by_letter_internal(&conn, letter)
    }

    /// 根据首字母和熟悉度获取单词列表，按英文升序
    pub fn list_by_letter_and_familiarity(
        &self,
        letter: &str,
        is_familiar: bool,
    ) -> StorageResult<Vec<WordRecord>> {
        let conn = self.get_conn()?;
        Self::list_by_letter_and_familiarity_internal(&conn, letter, is_familiar)
    }

    /// 获取所有单词，按英文升序
    pub fn list_all(&self) -> StorageResult<Vec<WordRecord>> {
        let conn = self.get_conn()?;
        Self::list_all_internal(&conn)
    }

    /// 获取字母统计信息
    pub fn stats_for_letter(&self, letter: &str) -> StorageResult<LetterStats> {
        let conn = self.get_conn()?;
        Self::stats_for_letter_internal(&conn, letter)
    }

    /// 获取 A-Z 全部字母卡片的统计
    pub fn letter_overview(&self) -> StorageResult<Vec<LetterProgress>> {
        let conn = self.get_conn()?;
        Self::letter_overview_internal(&conn)
    }

    // ============================================================
    // 内部实现方法（静态方法，接受 &Connection）
    // ============================================================

    pub fn add_internal(conn: &Connection, word: &NewWord) -> StorageResult<i64> {
        let first_letter = word.first_letter();

        conn.execute(
            r#"
            INSERT INTO words (
                english, phonetic, chinese, example,
                is_favorite, is_familiar, first_letter
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                word.english,
                word.phonetic,
                word.chinese,
                word.example,
                word.is_favorite as i32,
                word.is_familiar as i32,
                first_letter,
            ],
        )?;

        let id = conn.last_insert_rowid();
        tracing::debug!(id, english = %word.english, first_letter = %first_letter, "添加单词");

        Ok(id)
    }

    pub fn exists_internal(conn: &Connection, english: &str) -> StorageResult<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM words WHERE english = ?1)",
            params![english],
            |row| row.get(0),
        )?;

        Ok(exists)
    }

    pub fn get_by_id_internal(conn: &Connection, id: i64) -> StorageResult<Option<WordRecord>> {
        let sql = format!("SELECT {} FROM words WHERE id = ?1", WORD_COLUMNS);

        let word = conn
            .query_row(&sql, params![id], |row| WordRecord::from_row(row))
            .optional()?;

        Ok(word)
    }

    pub fn list_by_letter_internal(
        conn: &Connection,
        letter: &str,
    ) -> StorageResult<Vec<WordRecord>> {
        let sql = format!(
            "SELECT {} FROM words WHERE first_letter = ?1 ORDER BY english ASC",
            WORD_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let words = stmt
            .query_map(params![letter.to_uppercase()], |row| WordRecord::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(words)
    }

    pub fn list_by_letter_and_familiarity_internal(
        conn: &Connection,
        letter: &str,
        is_familiar: bool,
    ) -> StorageResult<Vec<WordRecord>> {
        let sql = format!(
            "SELECT {} FROM words WHERE first_letter = ?1 AND is_familiar = ?2 ORDER BY english ASC",
            WORD_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let words = stmt
            .query_map(params![letter.to_uppercase(), is_familiar as i32], |row| {
                WordRecord::from_row(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(words)
    }

    pub fn list_all_internal(conn: &Connection) -> StorageResult<Vec<WordRecord>> {
        let sql = format!("SELECT {} FROM words ORDER BY english ASC", WORD_COLUMNS);

        let mut stmt = conn.prepare(&sql)?;
        let words = stmt
            .query_map([], |row| WordRecord::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(words)
    }

    pub fn set_familiar_internal(conn: &Connection, id: i64, value: bool) -> StorageResult<usize> {
        let affected = conn.execute(
            "UPDATE words SET is_familiar = ?1 WHERE id = ?2",
            params![value as i32, id],
        )?;

        if affected == 0 {
            tracing::warn!(id, "更新熟悉度：单词不存在");
        } else {
            tracing::debug!(id, value, "更新熟悉度");
        }

        Ok(affected)
    }

    pub fn set_favorite_internal(conn: &Connection, id: i64, value: bool) -> StorageResult<usize> {
        let affected = conn.execute(
            "UPDATE words SET is_favorite = ?1 WHERE id = ?2",
            params![value as i32, id],
        )?;

        if affected == 0 {
            tracing::warn!(id, "更新收藏状态：单词不存在");
        } else {
            tracing::debug!(id, value, "更新收藏状态");
        }

        Ok(affected)
    }

    /// 两次独立的计数查询：总数与已熟悉数
    pub fn stats_for_letter_internal(conn: &Connection, letter: &str) -> StorageResult<LetterStats> {
        let target_letter = letter.to_uppercase();

        let total_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM words WHERE first_letter = ?1",
            params![target_letter],
            |row| row.get(0),
        )?;

        let familiar_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM words WHERE first_letter = ?1 AND is_familiar = 1",
            params![target_letter],
            |row| row.get(0),
        )?;

        Ok(LetterStats {
            total_count,
            familiar_count,
        })
    }

    pub fn letter_overview_internal(conn: &Connection) -> StorageResult<Vec<LetterProgress>> {
        ('A'..='Z')
            .map(|letter| -> StorageResult<LetterProgress> {
                let stats = Self::stats_for_letter_internal(conn, &letter.to_string())?;
                Ok(LetterProgress { letter, stats })
            })
            .collect()
    }

    pub fn clear_all_internal(conn: &Connection) -> StorageResult<usize> {
        let deleted = conn.execute("DELETE FROM words", [])?;
        tracing::info!(deleted, "清空单词库");
        Ok(deleted)
    }
}

// ============================================================
// 借用版本的 Repository（用于事务内操作）
// ============================================================

/// 借用连接的单词仓库
///
/// 用于在事务中直接操作数据库，避免重复加锁导致死锁。
pub struct WordRepositoryRef<'a> {
    conn: &'a Connection,
}

impl<'a> WordRepositoryRef<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn add(&self, word: &NewWord) -> StorageResult<i64> {
        WordRepository::add_internal(self.conn, word)
    }

    pub fn exists(&self, english: &str) -> StorageResult<bool> {
        WordRepository::exists_internal(self.conn, english)
    }

    pub fn get_by_id(&self, id: i64) -> StorageResult<Option<WordRecord>> {
        WordRepository::get_by_id_internal(self.conn, id)
    }

    pub fn list_by_letter(&self, letter: &str) -> StorageResult<Vec<WordRecord>> {
        WordRepository::list_by_letter_internal(self.conn, letter)
    }

    pub fn list_by_letter_and_familiarity(
        &self,
        letter: &str,
        is_familiar: bool,
    ) -> StorageResult<Vec<WordRecord>> {
        WordRepository::list_by_letter_and_familiarity_internal(self.conn, letter, is_familiar)
    }

    pub fn list_all(&self) -> StorageResult<Vec<WordRecord>> {
        WordRepository::list_all_internal(self.conn)
    }

    pub fn set_familiar(&self, id: i64, value: bool) -> StorageResult<usize> {
        WordRepository::set_familiar_internal(self.conn, id, value)
    }

    pub fn set_favorite(&self, id: i64, value: bool) -> StorageResult<usize> {
        WordRepository::set_favorite_internal(self.conn, id, value)
    }

    pub fn stats_for_letter(&self, letter: &str) -> StorageResult<LetterStats> {
        WordRepository::stats_for_letter_internal(self.conn, letter)
    }

    pub fn letter_overview(&self) -> StorageResult<Vec<LetterProgress>> {
        WordRepository::letter_overview_internal(self.conn)
    }

    pub fn clear_all(&self) -> StorageResult<usize> {
        WordRepository::clear_all_internal(self.conn)
    }
}

/// 首字母的规范形式，与入库时的计算方式一致
pub fn normalize_letter(letter: &str) -> String {
    first_letter_of(letter.trim())
}
