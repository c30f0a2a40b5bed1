//! パネル（設問ブロック）の有効/無効・ハイライト状態

use crate::machine::Step;
use std::fmt;

/// 設問パネル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Existence,
    Morphology,
    Features,
    Comment,
}

impl Panel {
    pub const ALL: [Panel; 4] = [Panel::Existence, Panel::Morphology, Panel::Features, Panel::Comment];

    /// パネル見出し
    pub fn title(&self) -> &'static str {
        match self {
            Panel::Existence => "Is this a dwarf galaxy?",
            Panel::Morphology => "What is the morphology?",
            Panel::Features => "Any special features?",
            Panel::Comment => "Comments",
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// パネルの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelStatus {
    /// 入力可能かつハイライト中
    Active,
    /// 入力可能（ハイライトなし）
    Open,
    /// まだ到達していない
    Pending,
    /// 回答済みで再入力不可（リセットでのみ解除）
    Locked,
}

impl PanelStatus {
    pub fn is_enabled(&self) -> bool {
        matches!(self, PanelStatus::Active | PanelStatus::Open)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, PanelStatus::Active)
    }
}

/// 現在のステップとコメント欄フォーカスからパネル状態を導出
pub fn panel_status(step: Step, panel: Panel, comment_focused: bool) -> PanelStatus {
    if step == Step::Committed {
        return PanelStatus::Locked;
    }

    let current = match step {
        Step::AwaitingExistence => Panel::Existence,
        Step::AwaitingMorphology => Panel::Morphology,
        _ => Panel::Features,
    };

    match panel {
        Panel::Comment if comment_focused => PanelStatus::Active,
        Panel::Comment => PanelStatus::Open,
        p if p == current && comment_focused => PanelStatus::Open,
        p if p == current => PanelStatus::Active,
        p if order(p) < order(current) => PanelStatus::Locked,
        _ => PanelStatus::Pending,
    }
}

fn order(panel: Panel) -> u8 {
    match panel {
        Panel::Existence => 0,
        Panel::Morphology => 1,
        Panel::Features => 2,
        Panel::Comment => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_panels() {
        let step = Step::AwaitingExistence;
        assert_eq!(panel_status(step, Panel::Existence, false), PanelStatus::Active);
        assert_eq!(panel_status(step, Panel::Morphology, false), PanelStatus::Pending);
        assert_eq!(panel_status(step, Panel::Features, false), PanelStatus::Pending);
        assert_eq!(panel_status(step, Panel::Comment, false), PanelStatus::Open);
    }

    #[test]
    fn test_earlier_panels_locked() {
        let step = Step::AwaitingFeatures;
        assert_eq!(panel_status(step, Panel::Existence, false), PanelStatus::Locked);
        assert_eq!(panel_status(step, Panel::Morphology, false), PanelStatus::Locked);
        assert_eq!(panel_status(step, Panel::Features, false), PanelStatus::Active);
    }

    #[test]
    fn test_comment_focus_moves_highlight() {
        let step = Step::AwaitingMorphology;
        assert_eq!(panel_status(step, Panel::Morphology, true), PanelStatus::Open);
        assert_eq!(panel_status(step, Panel::Comment, true), PanelStatus::Active);
    }

    #[test]
    fn test_committed_locks_everything() {
        for panel in Panel::ALL {
            assert_eq!(panel_status(Step::Committed, panel, false), PanelStatus::Locked);
        }
    }
}
