//! 存储线程
//!
//! 一个专用线程持有 [`Storage`]，按提交顺序逐个执行任务；
//! 调用方通过 async 方法提交任务，结果经 oneshot 通道返回。

use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::oneshot;

use crate::sheet::SheetCodec;
use crate::storage::{LetterProgress, LetterStats, NewWord, Storage, StorageError, WordRecord};
use crate::transfer::{self, ImportSummary, TransferError};

type Job = Box<dyn FnOnce(&Storage) + Send + 'static>;

/// 发送给存储线程的命令
enum WorkerCommand {
    Run(Job),
    Shutdown,
}

/// 存储线程句柄
///
/// 任务按提交顺序执行。句柄被丢弃时，线程先执行完已排队的任务再退出，并被 join。
pub struct StoreWorker {
    sender: Sender<WorkerCommand>,
    thread: Option<JoinHandle<()>>,
}

impl StoreWorker {
    /// 把 `storage` 移交给新线程
    pub fn spawn(storage: Storage) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<WorkerCommand>();

        let thread = thread::Builder::new()
            .name("vocab-store".to_string())
            .spawn(move || {
                tracing::debug!(path = %storage.db_path(), "存储线程启动");
                while let Ok(command) = receiver.recv() {
                    match command {
                        WorkerCommand::Run(job) => job(&storage),
                        WorkerCommand::Shutdown => break,
                    }
                }
                tracing::debug!("存储线程退出");
            })?;

        Ok(Self {
            sender,
            thread: Some(thread),
        })
    }

    /// 在存储线程上执行闭包并等待结果
    pub async fn run<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Storage) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StorageError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |storage| {
            // 调用方可能已不再等待
            let _ = tx.send(f(storage));
        });

        self.sender
            .send(WorkerCommand::Run(job))
            .map_err(|_| E::from(StorageError::WorkerDisconnected))?;

        rx.await
            .map_err(|_| E::from(StorageError::WorkerDisconnected))?
    }

    pub async fn add(&self, word: NewWord) -> Result<i64, StorageError> {
        self.run(move |s| s.words().add(&word)).await
    }

    pub async fn exists(&self, english: String) -> Result<bool, StorageError> {
        self.run(move |s| s.words().exists(&english)).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<WordRecord>, StorageError> {
        self.run(move |s| s.words().get_by_id(id)).await
    }

    pub async fn list_by_letter(&self, letter: String) -> Result<Vec<WordRecord>, StorageError> {
        self.run(move |s| s.words().list_by_letter(&letter)).await
    }

    pub async fn list_by_letter_and_familiarity(
        &self,
        letter: String,
        is_familiar: bool,
    ) -> Result<Vec<WordRecord>, StorageError> {
        self.run(move |s| s.words().list_by_letter_and_familiarity(&letter, is_familiar))
            .await
    }

    pub async fn list_all(&self) -> Result<Vec<WordRecord>, StorageError> {
        self.run(|s| s.words().list_all()).await
    }

    pub async fn set_familiar(&self, id: i64, value: bool) -> Result<usize, StorageError> {
        self.run(move |s| s.words().set_familiar(id, value)).await
    }

    pub async fn set_favorite(&self, id: i64, value: bool) -> Result<usize, StorageError> {
        self.run(move |s| s.words().set_favorite(id, value)).await
    }

    pub async fn stats_for_letter(&self, letter: String) -> Result<LetterStats, StorageError> {
        self.run(move |s| s.words().stats_for_letter(&letter)).await
    }

    pub async fn letter_overview(&self) -> Result<Vec<LetterProgress>, StorageError> {
        self.run(|s| s.words().letter_overview()).await
    }

    pub async fn clear_all(&self) -> Result<usize, StorageError> {
        self.run(|s| s.words().clear_all()).await
    }

    /// 在存储线程上解析表格并合并到单词库
    pub async fn import(
        &self,
        codec: Arc<dyn SheetCodec>,
        bytes: Vec<u8>,
    ) -> Result<ImportSummary, TransferError> {
        self.run(move |s| transfer::import_words(&s.words(), codec.as_ref(), &bytes))
            .await
    }

    pub async fn export(&self, codec: Arc<dyn SheetCodec>) -> Result<Vec<u8>, TransferError> {
        self.run(move |s| transfer::export_words(&s.words(), codec.as_ref()))
            .await
    }

    /// 读取文件并导入
    pub async fn import_file(
        &self,
        codec: Arc<dyn SheetCodec>,
        path: PathBuf,
    ) -> Result<ImportSummary, TransferError> {
        self.run(move |s| transfer::import_file(&s.words(), codec.as_ref(), &path))
            .await
    }

    /// 导出到文件，返回写入的字节数
    pub async fn export_file(
        &self,
        codec: Arc<dyn SheetCodec>,
        path: PathBuf,
    ) -> Result<usize, TransferError> {
        self.run(move |s| transfer::export_file(&s.words(), codec.as_ref(), &path))
            .await
    }
}

impl Drop for StoreWorker {
    fn drop(&mut self) {
        // 线程可能已经退出
        let _ = self.sender.send(WorkerCommand::Shutdown);

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
