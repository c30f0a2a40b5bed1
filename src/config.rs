use crate::error::{ClassifyError, Result};
use dwarf_classify_common::InteractionMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_RESULTS_FILE: &str = "classification_results.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 結果CSVのパス
    pub results_path: PathBuf,
    pub mode: InteractionMode,
    /// タイトルに天体IDを表示するか
    pub show_object_id: bool,
    /// 画像を開く外部ビューア（例: "eog"）
    pub viewer_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            results_path: PathBuf::from(DEFAULT_RESULTS_FILE),
            mode: InteractionMode::Manual,
            show_object_id: false,
            viewer_command: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ClassifyError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("dwarf-classify").join("config.json"))
    }
}
