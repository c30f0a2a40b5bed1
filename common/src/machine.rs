//! 分類状態機械
//!
//! 1天体分の回答とパネル状態を保持し、入力イベントを状態遷移に変換する。
//! 状態機械自体はI/Oを持たない。確定時は `Outcome::Commit` でレコードを返し、
//! 書き込み成功後に呼び出し側が `mark_committed` を呼ぶ。
//!
//! 遷移:
//! AwaitingExistence → AwaitingMorphology → AwaitingFeatures → ReadyToConfirm → Committed
//! （存在=No の場合は AwaitingMorphology を飛ばす）

use crate::panel::{panel_status, Panel, PanelStatus};
use crate::types::{AnswerSet, ClassificationRecord, Existence, Morphology, SpecialFeature};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 現在のステップ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    AwaitingExistence,
    AwaitingMorphology,
    AwaitingFeatures,
    ReadyToConfirm,
    Committed,
}

/// 確定方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    /// 特記事項の後は ReadyToConfirm で止まり、明示的な確定を待つ
    #[default]
    Manual,
    /// 特記事項の回答で自動確定（コメント入力中は保留）
    #[serde(alias = "auto-advance")]
    Auto,
}

impl InteractionMode {
    /// 特記事項の回答で確定まで進めるか
    fn commits_on_feature(&self) -> bool {
        matches!(self, InteractionMode::Auto)
    }
}

impl FromStr for InteractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" | "m" => Ok(InteractionMode::Manual),
            "auto" | "auto-advance" | "a" => Ok(InteractionMode::Auto),
            _ => Err(format!("Unknown mode: {}. Use manual or auto", s)),
        }
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionMode::Manual => write!(f, "manual"),
            InteractionMode::Auto => write!(f, "auto"),
        }
    }
}

/// 入力イベント（キー/クリックの区別なし）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    ExistenceSelected(Existence),
    MorphologySelected(Morphology),
    FeatureSelected(SpecialFeature),
    CommentChanged(String),
    CommentFocusChanged(bool),
    ConfirmRequested,
    ResetRequested,
}

/// イベント処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 状態が更新された
    Updated,
    /// 現在のステップでは受け付けない（状態は変わらない）
    Ignored,
    /// 確定要求されたが回答が未完了
    Incomplete,
    /// 自動確定をコメント入力終了まで保留
    Deferred,
    /// 確定レコード（呼び出し側で永続化する）
    Commit(ClassificationRecord),
}

/// 1天体分の分類状態機械
#[derive(Debug, Clone)]
pub struct ClassificationMachine {
    item_id: String,
    mode: InteractionMode,
    step: Step,
    answers: AnswerSet,
    comment_focused: bool,
    commit_pending: bool,
}

impl ClassificationMachine {
    pub fn new(item_id: impl Into<String>, mode: InteractionMode) -> Self {
        Self {
            item_id: item_id.into(),
            mode,
            step: Step::AwaitingExistence,
            answers: AnswerSet::default(),
            comment_focused: false,
            commit_pending: false,
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn comment_focused(&self) -> bool {
        self.comment_focused
    }

    pub fn is_complete(&self) -> bool {
        self.answers.is_complete()
    }

    pub fn is_committed(&self) -> bool {
        self.step == Step::Committed
    }

    pub fn panel(&self, panel: Panel) -> PanelStatus {
        panel_status(self.step, panel, self.comment_focused)
    }

    /// 入力イベントを対応する遷移に振り分ける
    pub fn handle(&mut self, event: InputEvent) -> Outcome {
        match event {
            InputEvent::ExistenceSelected(v) => self.set_existence(v),
            InputEvent::MorphologySelected(v) => self.set_morphology(v),
            InputEvent::FeatureSelected(v) => self.set_special_features(v),
            InputEvent::CommentChanged(text) => self.set_comment(text),
            InputEvent::CommentFocusChanged(focused) => self.set_comment_focus(focused),
            InputEvent::ConfirmRequested => self.confirm(),
            InputEvent::ResetRequested => self.reset(),
        }
    }

    pub fn set_existence(&mut self, value: Existence) -> Outcome {
        if self.step != Step::AwaitingExistence {
            return Outcome::Ignored;
        }

        self.answers.existence = Some(value);
        if value.requires_morphology() {
            self.step = Step::AwaitingMorphology;
        } else {
            self.answers.morphology = None;
            self.step = Step::AwaitingFeatures;
        }
        Outcome::Updated
    }

    pub fn set_morphology(&mut self, value: Morphology) -> Outcome {
        if self.step != Step::AwaitingMorphology {
            return Outcome::Ignored;
        }

        self.answers.morphology = Some(value);
        self.step = Step::AwaitingFeatures;
        Outcome::Updated
    }

    /// 特記事項は確定前なら何度でも選び直せる
    pub fn set_special_features(&mut self, value: SpecialFeature) -> Outcome {
        if !matches!(self.step, Step::AwaitingFeatures | Step::ReadyToConfirm) {
            return Outcome::Ignored;
        }

        self.answers.special_features = Some(value);
        self.step = Step::ReadyToConfirm;

        if !self.mode.commits_on_feature() {
            return Outcome::Updated;
        }
        if self.comment_focused {
            self.commit_pending = true;
            return Outcome::Deferred;
        }
        self.commit_record()
    }

    pub fn set_comment(&mut self, text: impl Into<String>) -> Outcome {
        if self.is_committed() {
            return Outcome::Ignored;
        }
        self.answers.comment = text.into();
        Outcome::Updated
    }

    /// コメント欄のフォーカス変更。保留中の自動確定はフォーカスが外れた時点で発火する
    pub fn set_comment_focus(&mut self, focused: bool) -> Outcome {
        if self.is_committed() {
            return Outcome::Ignored;
        }
        self.comment_focused = focused;

        if !focused && self.commit_pending {
            self.commit_pending = false;
            return self.commit_record();
        }
        Outcome::Updated
    }

    pub fn confirm(&mut self) -> Outcome {
        if self.is_committed() {
            return Outcome::Ignored;
        }
        self.commit_record()
    }

    /// 回答をすべて破棄して AwaitingExistence に戻る
    pub fn reset(&mut self) -> Outcome {
        if self.is_committed() {
            return Outcome::Ignored;
        }

        self.answers = AnswerSet::default();
        self.step = Step::AwaitingExistence;
        self.comment_focused = false;
        self.commit_pending = false;
        Outcome::Updated
    }

    /// 永続化が成功した後に呼ぶ
    pub fn mark_committed(&mut self) {
        if self.is_complete() {
            self.step = Step::Committed;
            self.commit_pending = false;
        }
    }

    fn commit_record(&mut self) -> Outcome {
        match self.answers.to_record(&self.item_id) {
            Some(record) => Outcome::Commit(record),
            None => Outcome::Incomplete,
        }
    }
}
