//! Excel 表格编解码
//!
//! 读取使用 calamine（自动识别 .xlsx / .xls），写出使用 rust_xlsxwriter（.xlsx）。

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use super::{rows_to_words, word_to_row, SheetCodec, SheetError, SheetResult, HEADER};
use crate::storage::{NewWord, WordRecord};

/// 导出工作表名称
pub const SHEET_NAME: &str = "单词表";

/// 导出列宽（字符数）
const COLUMN_WIDTHS: [f64; 5] = [20.0, 15.0, 30.0, 40.0, 10.0];

/// Excel 编解码器，只处理第一个工作表
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxCodec;

impl XlsxCodec {
    pub fn new() -> Self {
        Self
    }
}

impl SheetCodec for XlsxCodec {
    fn decode(&self, bytes: &[u8]) -> SheetResult<Vec<NewWord>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| SheetError::Decode(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or(SheetError::NoWorksheet)?
            .map_err(|e| SheetError::Decode(e.to_string()))?;

        let words = rows_to_words::<_, String>(range_rows(&range));
        tracing::debug!(rows = range.height(), words = words.len(), "解析表格");

        Ok(words)
    }

    fn encode(&self, words: &[WordRecord]) -> SheetResult<Vec<u8>> {
        build_workbook(words).map_err(|e| SheetError::Encode(e.to_string()))
    }
}

/// 把工作表区域展开为从第 0 列开始的文本行
///
/// calamine 的区域从第一个非空单元格开始，左侧空列需要补齐，列号才能与约定一致。
fn range_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    let start_col = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    range
        .rows()
        .map(|row| {
            std::iter::repeat(String::new())
                .take(start_col)
                .chain(row.iter().map(cell_text))
                .collect()
        })
        .collect()
}

/// 单元格转文本，错误与空单元格为空串
///
/// 数值单元格（含日期序列值）一律按双精度文本输出：`1` 读作 `"1.0"`，
/// 因此数值 1 不算熟悉标记，只有文本 `"1"` 才算。
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => number_text(*i as f64),
        Data::Float(f) => number_text(*f),
        Data::DateTime(dt) => number_text(dt.as_f64()),
        Data::Bool(b) => b.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        _ => String::new(),
    }
}

/// 双精度数的文本形式
///
/// 10^-3 <= |x| < 10^7 时为定点小数且至少一位小数（`123.0`），
/// 其余为科学计数法（`1.0E7`、`1.0E-4`）。
fn number_text(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let magnitude = value.abs();
    if (1e-3..1e7).contains(&magnitude) {
        let text = value.to_string();
        if text.contains('.') {
            text
        } else {
            format!("{text}.0")
        }
    } else {
        let text = format!("{value:e}");
        let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
        if mantissa.contains('.') {
            format!("{mantissa}E{exponent}")
        } else {
            format!("{mantissa}.0E{exponent}")
        }
    }
}

fn build_workbook(words: &[WordRecord]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col, title) in HEADER.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *title, &header_format)?;
        }

        for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
            worksheet.set_column_width(col as u16, *width)?;
        }

        for (index, word) in words.iter().enumerate() {
            let row = (index + 1) as u32;
            for (col, value) in word_to_row(word).iter().enumerate() {
                if !value.is_empty() {
                    worksheet.write_string(row, col as u16, value)?;
                }
            }
        }
    }

    workbook.save_to_buffer()
}
