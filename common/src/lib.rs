//! Dwarf Classify Common Library
//!
//! 分類セッションで共有される回答型と状態機械（I/Oなし）

pub mod types;
pub mod panel;
pub mod machine;
pub mod error;

pub use types::{AnswerSet, ClassificationRecord, Existence, Morphology, SpecialFeature};
pub use panel::{Panel, PanelStatus};
pub use machine::{ClassificationMachine, InputEvent, InteractionMode, Outcome, Step};
pub use error::{Error, Result};
