use anyhow::Context;
use clap::Parser;
use dwarf_classify::catalog::Catalog;
use dwarf_classify::cli::{Cli, Commands};
use dwarf_classify::config::Config;
use dwarf_classify::session::{SessionController, SessionEnd, SessionOptions};
use dwarf_classify::status;
use dwarf_classify::store::ResultStore;
use dwarf_classify::terminal::TerminalFrontend;
use std::path::Path;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load().context("設定ファイルの読み込みに失敗")?;

    match cli.command {
        Commands::Classify { catalog, results, mode, seed, show_id, ids } => {
            println!("🌌 dwarf-classify - 分類セッション\n");

            // 1. カタログ読み込み（失敗したらセッションを作らずに終了）
            println!("[1/3] カタログを読み込み中...");
            let catalog = load_catalog(&catalog, ids.as_deref())?;
            println!("✔ {}天体を検出\n", catalog.len());

            // 2. 既存結果から再開位置を決定
            let results_path = results.unwrap_or_else(|| config.results_path.clone());
            let store = ResultStore::new(&results_path);
            println!("[2/3] 結果ファイルを確認中: {}", results_path.display());

            let options = SessionOptions {
                mode: mode.unwrap_or(config.mode),
                seed,
            };
            let frontend = TerminalFrontend::new(
                show_id || config.show_object_id,
                config.viewer_command.clone(),
            );
            let mut session = SessionController::new(
                catalog.list_items(),
                &catalog,
                &store,
                frontend,
                options,
            )?;
            println!(
                "✔ 未分類: {}天体 (確定方式: {})\n",
                session.order().len(),
                options.mode
            );

            // 3. 分類
            println!("[3/3] 分類中... (? でヘルプ)");
            let summary = session.run()?;

            match summary.end {
                SessionEnd::Exhausted => println!("\n✅ All images classified! ({}件保存)", summary.committed),
                SessionEnd::Interrupted => println!(
                    "\n⏸ 中断しました: {}件保存、残り{}天体（次回はここから再開）",
                    summary.committed, summary.remaining
                ),
            }
        }

        Commands::Status { catalog, results, ids } => {
            let catalog = load_catalog(&catalog, ids.as_deref())?;
            let results_path = results.unwrap_or_else(|| config.results_path.clone());
            let summary = status::load_summary(&catalog, &ResultStore::new(&results_path))?;

            println!("進捗: {}", results_path.display());
            println!("  全天体: {}", summary.total);
            println!("  分類済み: {} (Yes: {}, Maybe: {}, No: {})", summary.completed, summary.yes, summary.maybe, summary.no);
            println!("  残り: {}", summary.remaining);
            if summary.unknown_ids > 0 {
                println!("  ⚠ カタログにない天体の行: {}（別セッションの結果が混在していないか確認してください）", summary.unknown_ids);
            }
        }

        Commands::Config { set_results, set_mode, set_viewer, show } => {
            let mut config = config;
            let changed = set_results.is_some() || set_mode.is_some() || set_viewer.is_some();

            if let Some(path) = set_results {
                config.results_path = path;
            }
            if let Some(mode) = set_mode {
                config.mode = mode;
            }
            if let Some(viewer) = set_viewer {
                config.viewer_command = Some(viewer).filter(|v| !v.trim().is_empty());
            }
            if changed {
                config.save()?;
                println!("✔ 設定を保存しました");
            }

            if show || !changed {
                println!("設定:");
                println!("  結果ファイル: {}", config.results_path.display());
                println!("  確定方式: {}", config.mode);
                println!("  天体ID表示: {}", if config.show_object_id { "あり" } else { "なし" });
                println!("  ビューア: {}", config.viewer_command.as_deref().unwrap_or("未設定"));
            }
        }
    }

    Ok(())
}

fn load_catalog(folder: &Path, ids: Option<&Path>) -> anyhow::Result<Catalog> {
    let catalog = match ids {
        Some(list) => Catalog::from_id_list(list, folder),
        None => Catalog::from_folder(folder),
    };
    catalog.with_context(|| format!("カタログを作成できません: {}", folder.display()))
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
