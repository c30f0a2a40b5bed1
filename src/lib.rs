//! dwarf-classify
//!
//! 矮小銀河候補の分類セッション（カタログ・提示順・結果ストア・セッション制御）

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod order;
pub mod session;
pub mod status;
pub mod store;
pub mod terminal;
