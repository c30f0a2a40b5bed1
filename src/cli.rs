use clap::{Parser, Subcommand};
use dwarf_classify_common::InteractionMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dwarf-classify")]
#[command(about = "矮小銀河候補カットアウトの対話式分類ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 分類セッションを開始（前回の続きから再開）
    Classify {
        /// カットアウト画像フォルダ
        #[arg(required = true)]
        catalog: PathBuf,

        /// 結果CSV（省略時は設定ファイルの値）
        #[arg(short, long)]
        results: Option<PathBuf>,

        /// 確定方式 (manual/auto)
        #[arg(short, long)]
        mode: Option<InteractionMode>,

        /// 提示順の乱数シード（再現が必要な場合のみ）
        #[arg(long)]
        seed: Option<u64>,

        /// タイトルに天体IDを表示
        #[arg(long)]
        show_id: bool,

        /// 天体IDリストCSV（known_id列）
        #[arg(long)]
        ids: Option<PathBuf>,
    },

    /// 分類の進捗を表示
    Status {
        /// カットアウト画像フォルダ
        #[arg(required = true)]
        catalog: PathBuf,

        /// 結果CSV（省略時は設定ファイルの値）
        #[arg(short, long)]
        results: Option<PathBuf>,

        /// 天体IDリストCSV（known_id列）
        #[arg(long)]
        ids: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// 結果CSVのパスを設定
        #[arg(long)]
        set_results: Option<PathBuf>,

        /// 既定の確定方式を設定 (manual/auto)
        #[arg(long)]
        set_mode: Option<InteractionMode>,

        /// 画像ビューアコマンドを設定（空文字で解除）
        #[arg(long)]
        set_viewer: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
