//! 表格导入导出
//!
//! 表格文件的具体格式由 [`SheetCodec`] 的实现负责，仓库与调用方只依赖这个 trait。
//!
//! 固定列约定（导入时跳过表头行）：
//!
//! | 列 | 字段 | 说明 |
//! |---|---|---|
//! | 0 | english | 必填，空白则跳过该行 |
//! | 1 | phonetic | 可选 |
//! | 2 | chinese | 可选 |
//! | 3 | example | 可选 |
//! | 4 | 熟悉标记 | `"1"` 表示已熟悉，其余均为未熟悉 |

pub mod xlsx;

pub use xlsx::XlsxCodec;

use thiserror::Error;

use crate::storage::{NewWord, WordRecord};

/// 导出表头
pub const HEADER: [&str; 5] = ["英文", "音标", "中文释义", "例句", "熟悉程度"];

/// 导入导出错误，与存储错误相互独立
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("无法解析表格: {0}")]
    Decode(String),

    #[error("无法生成表格: {0}")]
    Encode(String),

    #[error("表格中没有工作表")]
    NoWorksheet,

    #[error("文件读写失败: {0}")]
    Io(#[from] std::io::Error),
}

pub type SheetResult<T> = Result<T, SheetError>;

/// 表格编解码能力
pub trait SheetCodec: Send + Sync {
    /// 解析表格字节，返回待导入的单词（收藏状态恒为 false）
    fn decode(&self, bytes: &[u8]) -> SheetResult<Vec<NewWord>>;

    /// 将单词写为表格字节（不导出收藏状态）
    fn encode(&self, words: &[WordRecord]) -> SheetResult<Vec<u8>>;
}

/// 按列约定把一行单元格文本转换为单词
///
/// 单元格会先去除首尾空白；英文为空时返回 `None`。
pub fn row_to_word<S: AsRef<str>>(cells: &[S]) -> Option<NewWord> {
    let cell = |index: usize| {
        cells
            .get(index)
            .map(|value| value.as_ref().trim().to_string())
            .unwrap_or_default()
    };

    let english = cell(0);
    if english.is_empty() {
        return None;
    }

    Some(NewWord::new(english, cell(1), cell(2), cell(3)).familiar(cell(4) == "1"))
}

/// 按列约定把单词转换为一行单元格文本
pub fn word_to_row(word: &WordRecord) -> [String; 5] {
    [
        word.english.clone(),
        word.phonetic.clone(),
        word.chinese.clone(),
        word.example.clone(),
        if word.is_familiar { "1" } else { "0" }.to_string(),
    ]
}

/// 跳过表头后逐行转换，空白英文的行被丢弃
pub fn rows_to_words<R, S>(rows: R) -> Vec<NewWord>
where
    R: IntoIterator,
    R::Item: AsRef<[S]>,
    S: AsRef<str>,
{
    rows.into_iter()
        .skip(1)
        .filter_map(|row| row_to_word(row.as_ref()))
        .collect()
}
