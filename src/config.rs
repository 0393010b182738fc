//! 配置模块，负责加载JSON配置文件

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置错误: 配置文件不存在: {}", .0.display())]
    NotFound(PathBuf),
    #[error("配置错误: 无法读取配置文件 {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("配置错误: 无法解析JSON配置文件 {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 搜索引擎的运行配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchConfig {
    /// 需要整形的搜索结果快照（JSON）
    pub records_path: Option<PathBuf>,
    /// 与快照对应的搜索元数据（JSON）
    pub metadata_path: Option<PathBuf>,
    /// 判断是否显示年份时使用的参考年份，未设置时取系统时钟
    pub reference_year: Option<i32>,
    /// 每条查询要提取的过滤字段
    pub filter_fields: Vec<String>,
    /// 默认日志过滤指令，可被 RUST_LOG 覆盖
    pub log_filter: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            records_path: None,
            metadata_path: None,
            reference_year: None,
            filter_fields: ["type", "status", "category", "date", "amount", "merchant", "keyword"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            log_filter: "search_engine=info".to_string(),
        }
    }
}

impl SearchConfig {
    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 参考年份，未配置时取当前年份
    pub fn reference_year(&self) -> i32 {
        self.reference_year.unwrap_or_else(crate::sections::current_year)
    }
}
