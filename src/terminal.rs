//! 端末フロントエンド
//!
//! 1行入力をショートカットとして解釈し、状態機械への入力イベントに変換する。
//! - 数字: アクティブなパネルのn番目の選択肢
//! - Enter(空行): 確定
//! - r: リセット / c: コメント編集 / c <文>: コメント設定 / q: 保存済みのまま終了

use crate::catalog::{ImageHandle, Item};
use crate::error::{ClassifyError, Result};
use crate::session::{Feedback, Frontend, Progress, SessionInput};
use dialoguer::Input;
use dwarf_classify_common::{
    ClassificationMachine, Existence, InputEvent, Morphology, Panel, PanelStatus, SpecialFeature,
    Step,
};
use std::collections::VecDeque;
use std::process::Command;
use tracing::warn;

/// 1行入力の解釈結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCommand {
    Input(SessionInput),
    /// コメント欄にフォーカスを移して編集する
    EditComment,
    Help,
    Unknown(String),
}

/// 入力行をコマンドに変換
pub fn parse_command(line: &str, step: Step) -> TerminalCommand {
    let trimmed = line.trim();

    if let Some(text) = trimmed.strip_prefix("c ").or_else(|| trimmed.strip_prefix('#')) {
        return TerminalCommand::Input(SessionInput::Event(InputEvent::CommentChanged(
            text.trim().to_string(),
        )));
    }

    match trimmed {
        "" => TerminalCommand::Input(SessionInput::Event(InputEvent::ConfirmRequested)),
        "r" | "R" | "reset" | "esc" => {
            TerminalCommand::Input(SessionInput::Event(InputEvent::ResetRequested))
        }
        "q" | "Q" | "quit" => TerminalCommand::Input(SessionInput::Quit),
        "c" | "C" => TerminalCommand::EditComment,
        "?" | "h" | "help" => TerminalCommand::Help,
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 => shortcut_event(step, n - 1)
                .map(|e| TerminalCommand::Input(SessionInput::Event(e)))
                .unwrap_or_else(|| TerminalCommand::Unknown(other.to_string())),
            _ => TerminalCommand::Unknown(other.to_string()),
        },
    }
}

/// アクティブなパネルのn番目（0始まり）の選択肢
fn shortcut_event(step: Step, index: usize) -> Option<InputEvent> {
    match step {
        Step::AwaitingExistence => Existence::SHORTCUT_ORDER
            .get(index)
            .map(|v| InputEvent::ExistenceSelected(*v)),
        Step::AwaitingMorphology => Morphology::ALL
            .get(index)
            .map(|v| InputEvent::MorphologySelected(*v)),
        Step::AwaitingFeatures | Step::ReadyToConfirm => SpecialFeature::ALL
            .get(index)
            .map(|v| InputEvent::FeatureSelected(*v)),
        Step::Committed => None,
    }
}

/// アクティブなパネルの選択肢一覧（例: "1:Yes 2:Maybe 3:No"）
pub fn options_line(step: Step) -> String {
    let labels: Vec<&str> = match step {
        Step::AwaitingExistence => Existence::SHORTCUT_ORDER.iter().map(|v| v.as_str()).collect(),
        Step::AwaitingMorphology => Morphology::ALL.iter().map(|v| v.as_str()).collect(),
        Step::AwaitingFeatures | Step::ReadyToConfirm => {
            SpecialFeature::ALL.iter().map(|v| v.as_str()).collect()
        }
        Step::Committed => Vec::new(),
    };
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| format!("{}:{}", i + 1, label))
        .collect::<Vec<_>>()
        .join(" ")
}

/// パネル状態の1行表示
pub fn panel_line(machine: &ClassificationMachine) -> String {
    let answers = machine.answers();
    Panel::ALL
        .iter()
        .map(|&panel| {
            let marker = match machine.panel(panel) {
                PanelStatus::Active => "▶",
                PanelStatus::Open => "・",
                PanelStatus::Pending => " ",
                PanelStatus::Locked => "✔",
            };
            let value = match panel {
                Panel::Existence => answers.existence.map(|v| v.to_string()),
                Panel::Morphology => answers.morphology.map(|v| v.to_string()),
                Panel::Features => answers.special_features.map(|v| v.to_string()),
                Panel::Comment => (!answers.comment.is_empty()).then(|| answers.comment.clone()),
            };
            match value {
                Some(v) => format!("[{} {}: {}]", marker, short_name(panel), v),
                None => format!("[{} {}]", marker, short_name(panel)),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn short_name(panel: Panel) -> &'static str {
    match panel {
        Panel::Existence => "存在",
        Panel::Morphology => "形態",
        Panel::Features => "特記",
        Panel::Comment => "コメント",
    }
}

/// dialoguer による対話フロントエンド
pub struct TerminalFrontend {
    show_object_id: bool,
    viewer_command: Option<String>,
    queued: VecDeque<SessionInput>,
    editing_comment: bool,
}

impl TerminalFrontend {
    pub fn new(show_object_id: bool, viewer_command: Option<String>) -> Self {
        Self {
            show_object_id,
            viewer_command,
            queued: VecDeque::new(),
            editing_comment: false,
        }
    }

    fn prompt(&self, prompt: &str, initial: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .with_initial_text(initial)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| ClassifyError::Prompt(e.to_string()))
    }

    fn open_viewer(&self, image: &ImageHandle) {
        let Some(command) = self.viewer_command.as_deref() else {
            return;
        };
        let mut parts = command.split_whitespace();
        let Some(program) = parts.next() else {
            return;
        };

        if let Err(e) = Command::new(program).args(parts).args(&image.views).spawn() {
            warn!(viewer = command, error = %e, "failed to launch image viewer");
        }
    }

    fn print_help(&self) {
        println!("  数字: 選択 / Enter: 確定 / r: リセット / c: コメント編集 / c <文>: コメント / q: 終了");
    }
}

impl Frontend for TerminalFrontend {
    fn show_item(&mut self, item: &Item, image: &ImageHandle, progress: Progress) -> Result<()> {
        self.queued.clear();
        self.editing_comment = false;

        println!();
        if self.show_object_id {
            println!("🔭 Classifying {} ({}/{})", item.id, progress.position, progress.total);
        } else {
            println!("🔭 Classifying object {}/{}", progress.position, progress.total);
        }
        for view in &image.views {
            println!("  - {}", view.display());
        }

        self.open_viewer(image);
        Ok(())
    }

    fn next_input(&mut self, machine: &ClassificationMachine) -> Result<SessionInput> {
        if let Some(input) = self.queued.pop_front() {
            return Ok(input);
        }

        if self.editing_comment {
            self.editing_comment = false;
            let text = self.prompt("  コメント", &machine.answers().comment)?;
            self.queued
                .push_back(SessionInput::Event(InputEvent::CommentFocusChanged(false)));
            return Ok(SessionInput::Event(InputEvent::CommentChanged(text.trim().to_string())));
        }

        loop {
            println!("  {}", panel_line(machine));
            let prompt = format!("  {} (Enter:確定 r:リセット c:コメント q:終了)", options_line(machine.step()));
            let line = self.prompt(&prompt, "")?;

            match parse_command(&line, machine.step()) {
                TerminalCommand::Input(input) => return Ok(input),
                TerminalCommand::EditComment => {
                    self.editing_comment = true;
                    return Ok(SessionInput::Event(InputEvent::CommentFocusChanged(true)));
                }
                TerminalCommand::Help => self.print_help(),
                TerminalCommand::Unknown(s) => {
                    println!("  ⚠ 不明な入力: {}", s);
                    self.print_help();
                }
            }
        }
    }

    fn feedback(&mut self, feedback: Feedback<'_>) {
        match feedback {
            Feedback::Incomplete => println!("  ⚠ 回答が未完了です（存在と形態を選んでください）"),
            Feedback::Ignored => println!("  ⚠ この段階では変更できません（r でリセット）"),
            Feedback::Deferred => println!("  … コメント入力後に確定します"),
            Feedback::Saved(record) => println!(
                "  ✔ 保存: {} {} {} {}",
                record.existence,
                record.morphology_str(),
                record.special_features,
                record.comment
            ),
            Feedback::SaveFailed(err) => {
                println!("  ❌ {}", err);
                println!("  Enterで再保存、qで終了（この天体は次回再提示されます）");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dwarf_classify_common::InteractionMode;

    fn event(cmd: TerminalCommand) -> InputEvent {
        match cmd {
            TerminalCommand::Input(SessionInput::Event(e)) => e,
            other => panic!("イベントを期待したが {:?}", other),
        }
    }

    #[test]
    fn test_digits_follow_active_panel() {
        assert_eq!(
            event(parse_command("1", Step::AwaitingExistence)),
            InputEvent::ExistenceSelected(Existence::Yes)
        );
        assert_eq!(
            event(parse_command("3", Step::AwaitingExistence)),
            InputEvent::ExistenceSelected(Existence::No)
        );
        assert_eq!(
            event(parse_command("4", Step::AwaitingMorphology)),
            InputEvent::MorphologySelected(Morphology::DIN)
        );
        assert_eq!(
            event(parse_command("2", Step::ReadyToConfirm)),
            InputEvent::FeatureSelected(SpecialFeature::Gc)
        );
    }

    #[test]
    fn test_out_of_range_digit_is_unknown() {
        assert_eq!(
            parse_command("4", Step::AwaitingExistence),
            TerminalCommand::Unknown("4".to_string())
        );
        assert_eq!(
            parse_command("0", Step::AwaitingMorphology),
            TerminalCommand::Unknown("0".to_string())
        );
    }

    #[test]
    fn test_control_commands() {
        assert_eq!(event(parse_command("", Step::AwaitingFeatures)), InputEvent::ConfirmRequested);
        assert_eq!(event(parse_command("r", Step::AwaitingFeatures)), InputEvent::ResetRequested);
        assert_eq!(
            parse_command("q", Step::AwaitingExistence),
            TerminalCommand::Input(SessionInput::Quit)
        );
        assert_eq!(parse_command("c", Step::AwaitingExistence), TerminalCommand::EditComment);
        assert_eq!(parse_command("?", Step::AwaitingExistence), TerminalCommand::Help);
    }

    #[test]
    fn test_inline_comment() {
        assert_eq!(
            event(parse_command("c check edges", Step::AwaitingMorphology)),
            InputEvent::CommentChanged("check edges".to_string())
        );
        assert_eq!(
            event(parse_command("# 2 nuclei", Step::AwaitingExistence)),
            InputEvent::CommentChanged("2 nuclei".to_string())
        );
    }

    #[test]
    fn test_options_line() {
        assert_eq!(options_line(Step::AwaitingExistence), "1:Yes 2:Maybe 3:No");
        assert_eq!(options_line(Step::AwaitingMorphology), "1:dE 2:dEN 3:dI 4:dIN");
        assert_eq!(options_line(Step::Committed), "");
    }

    #[test]
    fn test_panel_line_marks_progress() {
        let mut m = ClassificationMachine::new("1", InteractionMode::Manual);
        m.set_existence(Existence::Yes);

        let line = panel_line(&m);
        assert!(line.contains("[✔ 存在: Yes]"));
        assert!(line.contains("[▶ 形態]"));
        assert!(line.contains("[  特記]"));
    }
}
