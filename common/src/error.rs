//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unknown_value() {
        let error = Error::UnknownValue {
            kind: "morphology",
            value: "dX".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("morphology"));
        assert!(display.contains("dX"));
    }

    #[test]
    fn test_error_debug() {
        let error = Error::UnknownValue {
            kind: "label",
            value: "テスト".to_string(),
        };
        let debug = format!("{:?}", error);
        assert!(debug.contains("UnknownValue"));
        assert!(debug.contains("テスト"));
    }
}
