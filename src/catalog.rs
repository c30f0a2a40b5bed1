//! 分類対象カタログ
//!
//! カットアウト画像フォルダを走査し、`<天体ID>_<ビュー名>.<拡張子>` 形式の
//! ファイルを天体IDごとにまとめる。画像の中身は読まない。

use crate::error::{ClassifyError, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "fits"];

const ID_COLUMN: &str = "known_id";

lazy_static::lazy_static! {
    static ref FILE_STEM_RE: Regex = Regex::new(r"^(?P<id>[^_]+)(?:_(?P<view>.+))?$").unwrap();
}

/// 分類対象の天体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    /// 同一天体の各ビュー画像（ファイル名順）
    pub views: Vec<PathBuf>,
}

/// 画像ハンドル（表示側に渡すだけで中身は解釈しない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    pub item_id: String,
    pub views: Vec<PathBuf>,
}

/// 画像提供インターフェース
pub trait ImageProvider {
    fn image_for(&self, item: &Item) -> Result<ImageHandle>;
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
}

impl Catalog {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// フォルダ内の全画像からカタログを作る（ID順）
    pub fn from_folder(folder: &Path) -> Result<Self> {
        let grouped = scan_folder(folder)?;
        if grouped.is_empty() {
            return Err(ClassifyError::DataNotFound(format!(
                "{} に画像がありません",
                folder.display()
            )));
        }

        let items = grouped
            .into_iter()
            .map(|(id, views)| Item { id, views })
            .collect();
        Ok(Self { items })
    }

    /// IDリストCSV（known_id列）の順でカタログを作る
    ///
    /// リストにあるIDの画像が1枚もなければ DataNotFound。
    pub fn from_id_list(id_list: &Path, folder: &Path) -> Result<Self> {
        if !id_list.exists() {
            return Err(ClassifyError::DataNotFound(id_list.display().to_string()));
        }

        let mut grouped = scan_folder(folder)?;
        let mut reader = csv::Reader::from_path(id_list)?;
        let column = reader
            .headers()?
            .iter()
            .position(|h| h.trim() == ID_COLUMN)
            .ok_or_else(|| {
                ClassifyError::DataNotFound(format!(
                    "{} に {} 列がありません",
                    id_list.display(),
                    ID_COLUMN
                ))
            })?;

        let mut items = Vec::new();
        for row in reader.records() {
            let row = row?;
            let id = match row.get(column).map(str::trim) {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => continue,
            };
            // 重複IDは最初の1件のみ
            let views = match grouped.remove(&id) {
                Some(views) => views,
                None if items.iter().any(|i: &Item| i.id == id) => continue,
                None => {
                    return Err(ClassifyError::DataNotFound(format!(
                        "{} の画像が {} にありません",
                        id,
                        folder.display()
                    )))
                }
            };
            items.push(Item { id, views });
        }

        if items.is_empty() {
            return Err(ClassifyError::DataNotFound(format!(
                "{} にIDがありません",
                id_list.display()
            )));
        }
        Ok(Self { items })
    }

    pub fn list_items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }
}

impl ImageProvider for Catalog {
    fn image_for(&self, item: &Item) -> Result<ImageHandle> {
        if let Some(missing) = item.views.iter().find(|p| !p.exists()) {
            return Err(ClassifyError::DataNotFound(missing.display().to_string()));
        }
        Ok(ImageHandle {
            item_id: item.id.clone(),
            views: item.views.clone(),
        })
    }
}

/// ファイル名から天体IDを取り出す
pub fn item_id_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    FILE_STEM_RE
        .captures(&stem)
        .and_then(|c| c.name("id"))
        .map(|m| m.as_str().to_string())
}

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

fn scan_folder(folder: &Path) -> Result<BTreeMap<String, Vec<PathBuf>>> {
    if !folder.is_dir() {
        return Err(ClassifyError::DataNotFound(folder.display().to_string()));
    }

    let mut grouped: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)  // 直下のみ
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_image = path
            .extension()
            .map(|ext| is_image_extension(&ext.to_string_lossy()))
            .unwrap_or(false);
        if !is_image {
            continue;
        }

        if let Some(id) = item_id_from_path(path) {
            grouped.entry(id).or_default().push(path.to_path_buf());
        }
    }

    for views in grouped.values_mut() {
        views.sort();
    }

    Ok(grouped)
}
