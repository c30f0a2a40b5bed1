//! 分類回答の型定義
//!
//! CLIとセッション制御で共有される型:
//! - Existence / Morphology / SpecialFeature: 各設問の選択肢
//! - AnswerSet: 1天体分の回答（確定まではメモリ上のみ）
//! - ClassificationRecord: 確定済みの1行（結果CSVに追記される）

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 設問1: 矮小銀河か？
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Existence {
    No,
    Maybe,
    Yes,
}

impl Existence {
    /// ショートカットキー順（1: Yes, 2: Maybe, 3: No）
    pub const SHORTCUT_ORDER: [Existence; 3] = [Existence::Yes, Existence::Maybe, Existence::No];

    pub fn as_str(&self) -> &'static str {
        match self {
            Existence::No => "No",
            Existence::Maybe => "Maybe",
            Existence::Yes => "Yes",
        }
    }

    /// 形態の回答が必要か
    pub fn requires_morphology(&self) -> bool {
        !matches!(self, Existence::No)
    }
}

impl FromStr for Existence {
    type Err = Error;

    /// 旧形式の数値ラベル（0 / 0.5 / 1）も受け付ける
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "No" | "no" | "0" | "0.0" => Ok(Existence::No),
            "Maybe" | "maybe" | "0.5" => Ok(Existence::Maybe),
            "Yes" | "yes" | "1" | "1.0" => Ok(Existence::Yes),
            other => Err(Error::UnknownValue {
                kind: "existence",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Existence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 設問2: 形態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Morphology {
    #[serde(rename = "dE")]
    DE,
    #[serde(rename = "dEN")]
    DEN,
    #[serde(rename = "dI")]
    DI,
    #[serde(rename = "dIN")]
    DIN,
}

impl Morphology {
    pub const ALL: [Morphology; 4] = [Morphology::DE, Morphology::DEN, Morphology::DI, Morphology::DIN];

    pub fn as_str(&self) -> &'static str {
        match self {
            Morphology::DE => "dE",
            Morphology::DEN => "dEN",
            Morphology::DI => "dI",
            Morphology::DIN => "dIN",
        }
    }
}

impl FromStr for Morphology {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Morphology::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| Error::UnknownValue {
                kind: "morphology",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Morphology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 設問3: 特記事項（未回答なら No）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpecialFeature {
    #[default]
    No,
    #[serde(rename = "GC")]
    Gc,
    Interacting,
    Disturbed,
}

impl SpecialFeature {
    pub const ALL: [SpecialFeature; 4] = [
        SpecialFeature::No,
        SpecialFeature::Gc,
        SpecialFeature::Interacting,
        SpecialFeature::Disturbed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialFeature::No => "No",
            SpecialFeature::Gc => "GC",
            SpecialFeature::Interacting => "Interacting",
            SpecialFeature::Disturbed => "Disturbed",
        }
    }
}

impl FromStr for SpecialFeature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "No" | "None" => Ok(SpecialFeature::No),
            "GC" => Ok(SpecialFeature::Gc),
            "Interacting" => Ok(SpecialFeature::Interacting),
            "Disturbed" => Ok(SpecialFeature::Disturbed),
            other => Err(Error::UnknownValue {
                kind: "special feature",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SpecialFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1天体分の回答（未確定）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet {
    pub existence: Option<Existence>,
    pub morphology: Option<Morphology>,
    pub special_features: Option<SpecialFeature>,
    pub comment: String,
}

impl AnswerSet {
    /// 確定可能か（存在の回答があり、No以外なら形態も回答済み）
    pub fn is_complete(&self) -> bool {
        match self.existence {
            None => false,
            Some(existence) => !existence.requires_morphology() || self.morphology.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == AnswerSet::default()
    }

    /// 確定レコードに変換（未完了ならNone）
    ///
    /// 特記事項は未回答なら No、形態は存在=No なら空欄になる。
    pub fn to_record(&self, item_id: &str) -> Option<ClassificationRecord> {
        if !self.is_complete() {
            return None;
        }
        let existence = self.existence?;
        Some(ClassificationRecord {
            item_id: item_id.to_string(),
            existence,
            morphology: if existence.requires_morphology() { self.morphology } else { None },
            special_features: self.special_features.unwrap_or_default(),
            comment: self.comment.clone(),
        })
    }
}

/// 確定済み分類レコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRecord {
    pub item_id: String,
    pub existence: Existence,
    pub morphology: Option<Morphology>,
    pub special_features: SpecialFeature,
    #[serde(default)]
    pub comment: String,
}

impl ClassificationRecord {
    /// CSV出力用の形態文字列（該当なしは空欄）
    pub fn morphology_str(&self) -> &'static str {
        self.morphology.map(|m| m.as_str()).unwrap_or("")
    }
}
