use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("カタログデータが見つかりません: {0}")]
    DataNotFound(String),

    #[error("結果ファイルが破損しています ({path}): {reason}。手動で確認してください")]
    CorruptResultFile { path: String, reason: String },

    #[error("分類結果の保存に失敗しました ({item_id}): {source}")]
    Durability {
        item_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClassifyError>;
