//! 数据模型定义
//!
//! 定义单词存储所需的数据结构，以及与数据库行之间的转换。

use rusqlite::{Result as SqliteResult, Row};
use serde::{Deserialize, Serialize};

// ============================================================
// WordRecord - 已存储的单词
// ============================================================

/// 已存储的单词词条
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    /// 自增主键，创建后不再变化
    pub id: i64,
    /// 英文单词（区分大小写）
    pub english: String,
    /// 音标
    pub phonetic: String,
    /// 中文释义
    pub chinese: String,
    /// 例句
    pub example: String,
    /// 是否收藏
    pub is_favorite: bool,
    /// 是否已熟悉
    pub is_familiar: bool,
    /// 首字母（大写），创建时计算并保存
    pub first_letter: String,
}

impl WordRecord {
    /// 从数据库行解析
    ///
    /// 可空文本列读为空字符串。
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            english: row.get("english")?,
            phonetic: row.get::<_, Option<String>>("phonetic")?.unwrap_or_default(),
            chinese: row.get::<_, Option<String>>("chinese")?.unwrap_or_default(),
            example: row.get::<_, Option<String>>("example")?.unwrap_or_default(),
            is_favorite: row.get::<_, Option<i32>>("is_favorite")?.unwrap_or(0) != 0,
            is_familiar: row.get::<_, Option<i32>>("is_familiar")?.unwrap_or(0) != 0,
            first_letter: row.get("first_letter")?,
        })
    }
}

// ============================================================
// NewWord - 待插入的单词
// ============================================================

/// 待插入的单词（尚未分配 id）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWord {
    pub english: String,
    pub phonetic: String,
    pub chinese: String,
    pub example: String,
    pub is_favorite: bool,
    pub is_familiar: bool,
}

impl NewWord {
    /// 创建单词，收藏与熟悉状态默认为 false
    pub fn new(
        english: impl Into<String>,
        phonetic: impl Into<String>,
        chinese: impl Into<String>,
        example: impl Into<String>,
    ) -> Self {
        Self {
            english: english.into(),
            phonetic: phonetic.into(),
            chinese: chinese.into(),
            example: example.into(),
            is_favorite: false,
            is_familiar: false,
        }
    }

    pub fn familiar(mut self, is_familiar: bool) -> Self {
        self.is_familiar = is_familiar;
        self
    }

    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    /// 首字母：第一个字符的大写形式，英文为空时为空字符串
    pub fn first_letter(&self) -> String {
        first_letter_of(&self.english)
    }
}

/// 计算单词的首字母（大写）
pub fn first_letter_of(english: &str) -> String {
    english
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

// ============================================================
// 统计
// ============================================================

/// 某个首字母下的单词统计（按需计算，不缓存）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterStats {
    /// 该字母开头的单词总数
    pub total_count: i64,
    /// 该字母开头的已熟悉单词数
    pub familiar_count: i64,
}

/// 主页字母卡片：字母 + 统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterProgress {
    pub letter: char,
    pub stats: LetterStats,
}

impl LetterProgress {
    /// 学习进度百分比（0-100，向下取整）
    pub fn progress_percent(&self) -> u32 {
        if self.stats.total_count <= 0 {
            return 0;
        }
        (self.stats.familiar_count * 100 / self.stats.total_count) as u32
    }
}
