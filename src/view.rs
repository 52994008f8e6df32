//! 单词列表视图状态
//!
//! 当前字母、熟悉度标签页与释义显示开关都保存在 [`WordListView`] 中，
//! 由调用方持有并传入仓库，而不是散落在界面控制器里。

use serde::{Deserialize, Serialize};

use crate::storage::word::normalize_letter;
use crate::storage::{StorageResult, WordRecord, WordRepository};

/// 在线翻译页面
const LOOKUP_BASE_URL: &str = "https://fanyi.baidu.com/m/trans?aldtype=85&from=en&to=zh&query=";

/// 列表标签页
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListTab {
    /// 全部单词
    All,
    /// 未熟悉（分页位置 0）
    Unfamiliar,
    /// 已熟悉（分页位置 1）
    Familiar,
}

impl ListTab {
    /// 分页位置转标签页，越界时返回 `None`
    pub fn from_position(position: usize) -> Option<Self> {
        match position {
            0 => Some(Self::Unfamiliar),
            1 => Some(Self::Familiar),
            _ => None,
        }
    }

    pub fn position(&self) -> Option<usize> {
        match self {
            Self::All => None,
            Self::Unfamiliar => Some(0),
            Self::Familiar => Some(1),
        }
    }

    /// 解析命令行参数
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "unfamiliar" => Some(Self::Unfamiliar),
            "familiar" => Some(Self::Familiar),
            _ => None,
        }
    }

    fn familiarity(&self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::Unfamiliar => Some(false),
            Self::Familiar => Some(true),
        }
    }
}

/// 某个字母下的单词列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordListView {
    letter: String,
    tab: ListTab,
    show_chinese: bool,
}

impl WordListView {
    /// 新建视图，默认显示中文释义
    pub fn new(letter: &str, tab: ListTab) -> Self {
        Self {
            letter: normalize_letter(letter),
            tab,
            show_chinese: true,
        }
    }

    pub fn letter(&self) -> &str {
        &self.letter
    }

    pub fn tab(&self) -> ListTab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: ListTab) {
        self.tab = tab;
    }

    pub fn show_chinese(&self) -> bool {
        self.show_chinese
    }

    pub fn title(&self) -> String {
        format!("{} 开头的单词", self.letter)
    }

    /// 读取当前标签页的单词，按英文升序
    pub fn load(&self, repo: &WordRepository) -> StorageResult<Vec<WordRecord>> {
        match self.tab.familiarity() {
            None => repo.list_by_letter(&self.letter),
            Some(is_familiar) => repo.list_by_letter_and_familiarity(&self.letter, is_familiar),
        }
    }

    /// 切换释义显示，返回切换后的状态
    pub fn toggle_chinese(&mut self) -> bool {
        self.show_chinese = !self.show_chinese;
        self.show_chinese
    }

    /// 该单词当前应显示的中文释义
    ///
    /// 隐藏释义时，已熟悉的单词仍然显示。
    pub fn chinese_for<'w>(&self, word: &'w WordRecord) -> Option<&'w str> {
        if self.show_chinese || word.is_familiar {
            Some(word.chinese.as_str())
        } else {
            None
        }
    }

    /// 翻转熟悉状态并保存
    ///
    /// 返回保存后的新状态；单词已不存在时返回 `None`，`word` 保持不变。
    pub fn toggle_familiar(
        &self,
        repo: &WordRepository,
        word: &mut WordRecord,
    ) -> StorageResult<Option<bool>> {
        let value = !word.is_familiar;
        if repo.set_familiar(word.id, value)? == 0 {
            return Ok(None);
        }
        word.is_familiar = value;
        Ok(Some(value))
    }

    /// 翻转收藏状态并保存，语义同 [`toggle_familiar`](Self::toggle_familiar)
    pub fn toggle_favorite(
        &self,
        repo: &WordRepository,
        word: &mut WordRecord,
    ) -> StorageResult<Option<bool>> {
        let value = !word.is_favorite;
        if repo.set_favorite(word.id, value)? == 0 {
            return Ok(None);
        }
        word.is_favorite = value;
        Ok(Some(value))
    }
}

/// 单词的在线翻译地址
pub fn lookup_url(english: &str) -> String {
    format!("{}{}", LOOKUP_BASE_URL, urlencoding::encode(english.trim()))
}
