use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use vocab_cards::config::AppConfig;
use vocab_cards::logging;
use vocab_cards::sheet::{SheetCodec, XlsxCodec};
use vocab_cards::storage::{Storage, WordRecord};
use vocab_cards::transfer::TransferError;
use vocab_cards::view::{lookup_url, ListTab, WordListView};
use vocab_cards::worker::StoreWorker;

const USAGE: &str = "用法: vocab-cards [overview | list <字母> [all|familiar|unfamiliar] | show <id> \
| familiar <id> <0|1> | favorite <id> <0|1> | import <文件> | export <文件> | clear]";

#[derive(Debug)]
enum Command {
    Overview,
    List { letter: String, tab: ListTab },
    Show { id: i64 },
    Familiar { id: i64, value: bool },
    Favorite { id: i64, value: bool },
    Import { path: PathBuf },
    Export { path: PathBuf },
    Clear,
}

impl Command {
    fn parse(args: &[String]) -> Option<Self> {
        let arg = |index: usize| args.get(index).map(String::as_str);

        let command = match arg(0).unwrap_or("overview") {
            "overview" => Self::Overview,
            "list" => Self::List {
                letter: arg(1)?.to_string(),
                tab: match arg(2) {
                    Some(tab) => ListTab::parse(tab)?,
                    None => ListTab::All,
                },
            },
            "show" => Self::Show {
                id: arg(1)?.parse().ok()?,
            },
            "familiar" => Self::Familiar {
                id: arg(1)?.parse().ok()?,
                value: parse_flag(arg(2)?)?,
            },
            "favorite" => Self::Favorite {
                id: arg(1)?.parse().ok()?,
                value: parse_flag(arg(2)?)?,
            },
            "import" => Self::Import {
                path: PathBuf::from(arg(1)?),
            },
            "export" => Self::Export {
                path: PathBuf::from(arg(1)?),
            },
            "clear" => Self::Clear,
            _ => return None,
        };

        Some(command)
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env();
    let _log_guard = logging::init_tracing(&config.log_level);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = Command::parse(&args) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    let storage = match Storage::open(&config.sqlite) {
        Ok(storage) => storage,
        Err(e) => {
            tracing::error!(error = %e, path = %config.sqlite.path.display(), "打开数据库失败");
            return ExitCode::FAILURE;
        }
    };

    let worker = match StoreWorker::spawn(storage) {
        Ok(worker) => worker,
        Err(e) => {
            tracing::error!(error = %e, "存储线程启动失败");
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!(?command, "执行命令");

    match run(&worker, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "命令执行失败");
            ExitCode::FAILURE
        }
    }
}

async fn run(worker: &StoreWorker, command: Command) -> Result<(), TransferError> {
    match command {
        Command::Overview => {
            for card in worker.letter_overview().await? {
                println!(
                    "{}  {:>3}%  {}/{}",
                    card.letter,
                    card.progress_percent(),
                    card.stats.familiar_count,
                    card.stats.total_count
                );
            }
        }
        Command::List { letter, tab } => {
            let view = WordListView::new(&letter, tab);
            let loader = view.clone();
            let words: Vec<WordRecord> = worker.run(move |s| loader.load(&s.words())).await?;

            println!("{}", view.title());
            for word in &words {
                print_word(&view, word);
            }
        }
        Command::Show { id } => match worker.get_by_id(id).await? {
            Some(word) => {
                print_word(&WordListView::new(&word.first_letter, ListTab::All), &word);
                if !word.example.is_empty() {
                    println!("    {}", word.example);
                }
                println!("    {}", lookup_url(&word.english));
            }
            None => println!("没有 id 为 {id} 的单词"),
        },
        Command::Familiar { id, value } => {
            report_update(id, worker.set_familiar(id, value).await?);
        }
        Command::Favorite { id, value } => {
            report_update(id, worker.set_favorite(id, value).await?);
        }
        Command::Import { path } => {
            let summary = worker.import_file(codec(), path).await?;
            if summary.is_empty_sheet() {
                println!("表格中没有可导入的单词");
            } else {
                println!(
                    "导入 {} 个，跳过重复 {} 个",
                    summary.inserted, summary.skipped_duplicates
                );
            }
        }
        Command::Export { path } => {
            let display = path.display().to_string();
            let written = worker.export_file(codec(), path).await?;
            println!("已导出到 {display}（{written} 字节）");
        }
        Command::Clear => {
            let removed = worker.clear_all().await?;
            println!("已清空 {removed} 个单词");
        }
    }

    Ok(())
}

fn codec() -> Arc<dyn SheetCodec> {
    Arc::new(XlsxCodec::new())
}

fn print_word(view: &WordListView, word: &WordRecord) {
    let marks = format!(
        "{}{}",
        if word.is_familiar { "✓" } else { " " },
        if word.is_favorite { "★" } else { " " }
    );
    println!(
        "{:>5} {} {} {} {}",
        word.id,
        marks,
        word.english,
        word.phonetic,
        view.chinese_for(word).unwrap_or("")
    );
}

fn report_update(id: i64, affected: usize) {
    if affected == 0 {
        println!("没有 id 为 {id} 的单词");
    } else {
        println!("已更新单词 {id}");
    }
}
