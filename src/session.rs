//! セッション制御
//!
//! 提示順に従って天体を1つずつ表示し、状態機械を入力イベントで駆動する。
//! 確定レコードは結果ストアへの追記が成功してから次の天体へ進む。
//! 追記に失敗した場合は同じ天体に留まり、再確定か終了を待つ。

use crate::catalog::{ImageHandle, ImageProvider, Item};
use crate::error::{ClassifyError, Result};
use crate::order::SessionOrder;
use crate::store::ResultStore;
use dwarf_classify_common::{
    ClassificationMachine, ClassificationRecord, InputEvent, InteractionMode, Outcome,
};
use tracing::{debug, error, info};

/// フロントエンドからの入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    Event(InputEvent),
    /// 中断（作業中の天体は破棄され、次回再提示される）
    Quit,
}

/// 進捗（position は1始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub position: usize,
    pub total: usize,
}

/// ユーザーへのフィードバック
#[derive(Debug)]
pub enum Feedback<'a> {
    /// 回答が揃っていないので確定できない
    Incomplete,
    /// 現在のステップでは受け付けない入力
    Ignored,
    /// コメント入力中のため自動確定を保留
    Deferred,
    Saved(&'a ClassificationRecord),
    SaveFailed(&'a ClassifyError),
}

/// 表示・入力を担うフロントエンド
pub trait Frontend {
    /// 天体を表示する。戻った時点で表示済みとみなす
    fn show_item(&mut self, item: &Item, image: &ImageHandle, progress: Progress) -> Result<()>;

    fn next_input(&mut self, machine: &ClassificationMachine) -> Result<SessionInput>;

    fn feedback(&mut self, feedback: Feedback<'_>);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub mode: InteractionMode,
    /// 指定時のみ提示順が再現可能になる
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// 全天体を確定した
    Exhausted,
    /// 途中で終了した
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub committed: usize,
    pub remaining: usize,
    pub end: SessionEnd,
}

enum ItemEnd {
    Committed,
    Quit,
}

pub struct SessionController<'a, P: ImageProvider, F: Frontend> {
    provider: &'a P,
    store: &'a ResultStore,
    frontend: F,
    order: SessionOrder,
    mode: InteractionMode,
    total: usize,
    completed_before: usize,
    committed: usize,
}

impl<'a, P: ImageProvider, F: Frontend> SessionController<'a, P, F> {
    /// 結果ストアから確定済みIDを読み、残りの提示順を作る
    ///
    /// 結果ファイルが破損していればここで失敗する（セッション状態は作らない）。
    pub fn new(
        items: &[Item],
        provider: &'a P,
        store: &'a ResultStore,
        frontend: F,
        options: SessionOptions,
    ) -> Result<Self> {
        let completed = store.load_completed()?;
        let completed_before = items.iter().filter(|i| completed.contains(&i.id)).count();
        let order = SessionOrder::new(items, &completed, options.seed);

        info!(
            total = items.len(),
            completed = completed_before,
            remaining = order.len(),
            mode = %options.mode,
            "session started"
        );

        Ok(Self {
            provider,
            store,
            frontend,
            order,
            mode: options.mode,
            total: items.len(),
            completed_before,
            committed: 0,
        })
    }

    pub fn order(&self) -> &SessionOrder {
        &self.order
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub fn into_frontend(self) -> F {
        self.frontend
    }

    pub fn run(&mut self) -> Result<SessionSummary> {
        while let Some(item) = self.order.current().cloned() {
            match self.classify_item(&item)? {
                ItemEnd::Committed => {
                    self.committed += 1;
                    self.order.advance();
                }
                ItemEnd::Quit => {
                    info!(item_id = %item.id, "session interrupted, in-progress answers discarded");
                    return Ok(self.summary(SessionEnd::Interrupted));
                }
            }
        }

        info!(committed = self.committed, "all items classified");
        Ok(self.summary(SessionEnd::Exhausted))
    }

    fn classify_item(&mut self, item: &Item) -> Result<ItemEnd> {
        let image = self.provider.image_for(item)?;
        let progress = Progress {
            position: self.completed_before + self.committed + 1,
            total: self.total,
        };
        self.frontend.show_item(item, &image, progress)?;

        let mut machine = ClassificationMachine::new(item.id.clone(), self.mode);

        loop {
            let event = match self.frontend.next_input(&machine)? {
                SessionInput::Quit => return Ok(ItemEnd::Quit),
                SessionInput::Event(event) => event,
            };
            debug!(item_id = %item.id, ?event, "input");

            match machine.handle(event) {
                Outcome::Commit(record) => match self.store.append(&record) {
                    Ok(()) => {
                        machine.mark_committed();
                        info!(
                            item_id = %record.item_id,
                            label = %record.existence,
                            morphology = record.morphology_str(),
                            "classification committed"
                        );
                        self.frontend.feedback(Feedback::Saved(&record));
                        return Ok(ItemEnd::Committed);
                    }
                    Err(e) => {
                        error!(item_id = %record.item_id, error = %e, "failed to persist classification");
                        self.frontend.feedback(Feedback::SaveFailed(&e));
                    }
                },
                Outcome::Incomplete => self.frontend.feedback(Feedback::Incomplete),
                Outcome::Ignored => self.frontend.feedback(Feedback::Ignored),
                Outcome::Deferred => self.frontend.feedback(Feedback::Deferred),
                Outcome::Updated => {}
            }
        }
    }

    fn summary(&self, end: SessionEnd) -> SessionSummary {
        SessionSummary {
            committed: self.committed,
            remaining: self.order.remaining(),
            end,
        }
    }
}
