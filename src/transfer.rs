//! 单词批量导入导出
//!
//! 导入时逐行插入，不使用跨行事务：中途失败时，之前已插入的行保留。

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sheet::{SheetCodec, SheetError};
use crate::storage::{StorageError, WordRepository};

/// 导入导出错误
#[derive(Error, Debug)]
pub enum TransferError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Sheet(#[from] SheetError),
}

pub type TransferResult<T> = Result<T, TransferError>;

/// 导入结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// 表格中解析出的有效行数
    pub parsed: usize,
    /// 新插入的单词数
    pub inserted: usize,
    /// 因英文已存在而跳过的行数
    pub skipped_duplicates: usize,
}

impl ImportSummary {
    /// 表格中没有任何有效行
    pub fn is_empty_sheet(&self) -> bool {
        self.parsed == 0
    }
}

/// 解析表格并合并到单词库，已存在的英文跳过
pub fn import_words(
    repo: &WordRepository,
    codec: &dyn SheetCodec,
    bytes: &[u8],
) -> TransferResult<ImportSummary> {
    let words = codec.decode(bytes)?;

    let mut summary = ImportSummary {
        parsed: words.len(),
        ..ImportSummary::default()
    };

    for word in &words {
        if repo.exists(&word.english)? {
            summary.skipped_duplicates += 1;
            continue;
        }
        repo.add(word)?;
        summary.inserted += 1;
    }

    tracing::info!(
        parsed = summary.parsed,
        inserted = summary.inserted,
        skipped = summary.skipped_duplicates,
        "导入单词完成"
    );

    Ok(summary)
}

/// 按英文升序导出全部单词
pub fn export_words(repo: &WordRepository, codec: &dyn SheetCodec) -> TransferResult<Vec<u8>> {
    let words = repo.list_all()?;
    let bytes = codec.encode(&words)?;

    tracing::info!(words = words.len(), bytes = bytes.len(), "导出单词完成");

    Ok(bytes)
}

/// 从文件导入
pub fn import_file(
    repo: &WordRepository,
    codec: &dyn SheetCodec,
    path: impl AsRef<Path>,
) -> TransferResult<ImportSummary> {
    let bytes = std::fs::read(path.as_ref()).map_err(SheetError::Io)?;
    import_words(repo, codec, &bytes)
}

/// 导出到文件，返回写入的字节数
pub fn export_file(
    repo: &WordRepository,
    codec: &dyn SheetCodec,
    path: impl AsRef<Path>,
) -> TransferResult<usize> {
    let bytes = export_words(repo, codec)?;
    std::fs::write(path.as_ref(), &bytes).map_err(SheetError::Io)?;
    Ok(bytes.len())
}
