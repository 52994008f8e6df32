pub mod config;
pub mod logging;
pub mod sheet;
pub mod storage;
pub mod transfer;
pub mod view;
pub mod worker;

pub use sheet::{SheetCodec, SheetError, XlsxCodec};
pub use storage::{
    LetterProgress, LetterStats, NewWord, Storage, StorageError, StorageResult, WordRecord,
    WordRepository,
};
pub use transfer::{ImportSummary, TransferError};
pub use view::{lookup_url, ListTab, WordListView};
pub use worker::StoreWorker;
