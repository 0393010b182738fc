use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use search_engine::config::SearchConfig;
use search_engine::{
    build_search_query_json, get_filters, get_search_type, get_sections, get_sorted_sections,
    normalize_query, RecordStore, SearchMetadata, SearchQuery, SortColumn, SortOrder,
};
use std::fs;
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "search_config.json";

/// REPL 会话状态
struct Session {
    config: SearchConfig,
    store: Option<RecordStore>,
    metadata: SearchMetadata,
    last_query: Option<SearchQuery>,
}

impl Session {
    fn new(config: SearchConfig) -> Result<Self> {
        let store = match &config.records_path {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("无法读取记录快照 {}", path.display()))?;
                let store = RecordStore::from_json(&json)
                    .with_context(|| format!("无法解析记录快照 {}", path.display()))?;
                info!(records = store.records().len(), path = %path.display(), "已加载记录快照");
                Some(store)
            }
            None => None,
        };

        let metadata = match &config.metadata_path {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("无法读取搜索元数据 {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("无法解析搜索元数据 {}", path.display()))?
            }
            None => SearchMetadata::default(),
        };

        Ok(Self {
            config,
            store,
            metadata,
            last_query: None,
        })
    }

    /// 解析一条查询，打印规范化文本、哈希和提取出的过滤条件
    fn run_query(&mut self, line: &str) -> Result<()> {
        let Some(query) = build_search_query_json(line, None) else {
            println!("✗ 无法解析查询");
            return Ok(());
        };

        println!("规范化查询: {}", normalize_query(line));
        println!("哈希: {}", query.hash);

        if let Some(filters) = get_filters(line, &self.config.filter_fields) {
            println!("过滤条件:\n{}", serde_json::to_string_pretty(&filters)?);
        }

        self.last_query = Some(query);
        Ok(())
    }

    /// 按最近一次查询的排序设置整形并排序快照
    fn print_sections(&self) -> Result<()> {
        let Some(store) = &self.store else {
            println!("⚠️ 未配置记录快照 (recordsPath)");
            return Ok(());
        };
        let Some(data_type) = get_search_type(&self.metadata) else {
            println!("⚠️ 不支持的搜索类型: '{}'", self.metadata.data_type);
            return Ok(());
        };

        let root = self.last_query.as_ref().map(|query| &query.root);
        let sort_by = root.and_then(|root| root.sort_by.as_deref()).and_then(SortColumn::from_name);
        let sort_order = root.and_then(|root| root.sort_order.as_deref()).and_then(SortOrder::from_name);

        let mut sections = get_sections(data_type, store, &self.metadata, self.config.reference_year());
        get_sorted_sections(data_type, &mut sections, sort_by, sort_order);

        println!("{} 行 ({})", sections.len(), data_type.as_str());
        println!("{}", serde_json::to_string_pretty(&sections)?);
        Ok(())
    }
}

fn print_help() {
    println!("输入搜索查询，例如: type:expense category:Travel,Meals date<2024-01-01");
    println!("  .sections  整形并排序已加载的记录快照");
    println!("  .help      显示帮助");
    println!("  .quit      退出");
}

/// 记录历史，失败时只记日志
fn add_history(rl: &mut DefaultEditor, line: &str) {
    if let Err(e) = rl.add_history_entry(line) {
        debug!(error = %e, "无法记录历史");
    }
}

fn run(config: SearchConfig) -> Result<()> {
    let mut session = Session::new(config)?;
    let mut rl = DefaultEditor::new()?;

    println!("--- Search Engine: 搜索查询 REPL ---");
    print_help();

    loop {
        match rl.readline("search> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                add_history(&mut rl, line);

                let result = match line {
                    ".quit" | ".exit" => break,
                    ".help" => {
                        print_help();
                        Ok(())
                    }
                    ".sections" => session.print_sections(),
                    _ => session.run_query(line),
                };
                if let Err(e) = result {
                    eprintln!("error: {e:#}");
                }
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("(interrupted)");
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    // 优先使用JSON配置，失败时使用默认配置
    let loaded = SearchConfig::from_json_file(CONFIG_FILE);
    let config = loaded.as_ref().cloned().unwrap_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match &loaded {
        Ok(_) => info!(path = CONFIG_FILE, "已加载配置文件"),
        Err(e) => warn!(error = %e, source = ?std::error::Error::source(e), "使用默认配置"),
    }

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
