//! 分類結果ストア（追記専用CSV）
//!
//! 1天体1行。追記ごとに fsync してから戻るため、直後に異常終了しても
//! 確定済みの行は失われない。更新・削除は行わない。

use crate::error::{ClassifyError, Result};
use dwarf_classify_common::{ClassificationRecord, Existence, Morphology, SpecialFeature};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

const HEADER: [&str; 6] = ["known_id", "label", "morphology", "special_feature", "comment", "classified_at"];

/// CSVの1行
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResultRow {
    known_id: String,
    label: String,
    #[serde(default)]
    morphology: String,
    #[serde(default)]
    special_feature: String,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    classified_at: String,
}

impl ResultRow {
    fn from_record(record: &ClassificationRecord) -> Self {
        Self {
            known_id: record.item_id.clone(),
            label: record.existence.to_string(),
            morphology: record.morphology_str().to_string(),
            special_feature: record.special_features.to_string(),
            comment: record.comment.clone(),
            classified_at: chrono::Local::now().to_rfc3339(),
        }
    }

    /// 確定済みの行ならレコードに変換
    ///
    /// ラベル空欄、または形態との組み合わせが不整合な行は未分類扱い。
    fn to_record(&self) -> dwarf_classify_common::Result<Option<ClassificationRecord>> {
        let label = self.label.trim();
        if label.is_empty() {
            return Ok(None);
        }

        let existence: Existence = label.parse()?;
        let morphology = match self.morphology.trim() {
            "" => None,
            m => Some(m.parse::<Morphology>()?),
        };
        if existence.requires_morphology() != morphology.is_some() {
            return Ok(None);
        }

        Ok(Some(ClassificationRecord {
            item_id: self.known_id.trim().to_string(),
            existence,
            morphology,
            special_features: self.special_feature.parse::<SpecialFeature>()?,
            comment: self.comment.clone(),
        }))
    }
}

#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 確定済みの天体ID
    pub fn load_completed(&self) -> Result<HashSet<String>> {
        Ok(self.load_records()?.into_iter().map(|r| r.item_id).collect())
    }

    /// 確定済みレコードをファイル順で読み込む（ファイルがなければ空）
    pub fn load_records(&self) -> Result<Vec<ClassificationRecord>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "result file absent, starting fresh");
            return Ok(Vec::new());
        }
        // 最初の追記が失敗するとヘッダなしの空ファイルが残る
        if std::fs::metadata(&self.path)?.len() == 0 {
            debug!(path = %self.path.display(), "result file is empty, starting fresh");
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| self.corrupt(e.to_string()))?;

        let headers = reader.headers().map_err(|e| self.corrupt(e.to_string()))?.clone();
        for required in &HEADER[..2] {
            if !headers.iter().any(|h| h.trim() == *required) {
                return Err(self.corrupt(format!("{} 列がありません", required)));
            }
        }

        let mut records = Vec::new();
        let mut seen = HashSet::new();
        for (line, row) in reader.deserialize::<ResultRow>().enumerate() {
            let row = row.map_err(|e| self.corrupt(e.to_string()))?;
            let record = row
                .to_record()
                .map_err(|e| self.corrupt(format!("{}行目: {}", line + 2, e)))?;

            match record {
                Some(record) if seen.insert(record.item_id.clone()) => records.push(record),
                Some(record) => warn!(item_id = %record.item_id, "duplicate row in result file"),
                None => debug!(item_id = %row.known_id, "row is not a complete classification"),
            }
        }

        Ok(records)
    }

    /// 1行追記して fsync する
    pub fn append(&self, record: &ClassificationRecord) -> Result<()> {
        self.write_row(&ResultRow::from_record(record))
            .map_err(|source| ClassifyError::Durability {
                item_id: record.item_id.clone(),
                source,
            })?;
        debug!(item_id = %record.item_id, path = %self.path.display(), "record appended");
        Ok(())
    }

    fn write_row(&self, row: &ResultRow) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        let len = repair_torn_tail(&mut file)?;

        if let Err(e) = write_and_sync(&mut file, len == 0, row) {
            // 書きかけの行を残すと再試行の行と連結してしまう
            if let Err(rollback) = file.set_len(len) {
                error!(path = %self.path.display(), error = %rollback, "failed to roll back partial row");
            }
            return Err(e);
        }
        Ok(())
    }

    fn corrupt(&self, reason: String) -> ClassifyError {
        ClassifyError::CorruptResultFile {
            path: self.path.display().to_string(),
            reason,
        }
    }
}

fn write_and_sync(file: &mut File, with_header: bool, row: &ResultRow) -> std::io::Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(&mut *file);
    if with_header {
        writer.write_record(HEADER)?;
    }
    writer.serialize(row)?;
    writer.flush()?;
    drop(writer);

    file.sync_all()
}

/// 改行で終わっていない末尾（異常終了で途切れた行）を修復し、修復後の長さを返す
///
/// 末尾の行が完全なレコードとして読めれば改行だけ補い、読めなければ行頭まで切り詰める。
fn repair_torn_tail(file: &mut File) -> std::io::Result<u64> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(0);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    if last[0] == b'\n' {
        return Ok(len);
    }

    file.seek(SeekFrom::Start(0))?;
    let (start, complete) = {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(&mut *file);
        let mut headers: Option<csv::StringRecord> = None;
        let mut record = csv::StringRecord::new();
        let mut tail = csv::StringRecord::new();
        let mut start = 0;
        loop {
            let pos = reader.position().byte();
            if !reader.read_record(&mut record)? {
                break;
            }
            start = pos;
            if headers.is_none() {
                headers = Some(record.clone());
            }
            tail.clone_from(&record);
        }

        let complete = match headers {
            Some(ref headers) if start > 0 => tail
                .deserialize::<ResultRow>(Some(headers))
                .ok()
                .is_some_and(|row| row.to_record().is_ok()),
            _ => false,
        };
        (start, complete)
    };

    if complete {
        file.write_all(b"\n")?;
        Ok(len + 1)
    } else {
        warn!(offset = start, "truncating torn row at end of result file");
        file.set_len(start)?;
        Ok(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(id: &str, existence: Existence, morphology: Option<Morphology>) -> ClassificationRecord {
        ClassificationRecord {
            item_id: id.to_string(),
            existence,
            morphology,
            special_features: SpecialFeature::No,
            comment: String::new(),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results.csv"));
        assert!(store.load_completed().unwrap().is_empty());
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let store = ResultStore::new(&path);

        store.append(&record("a", Existence::No, None)).unwrap();
        store.append(&record("b", Existence::Yes, Some(Morphology::DE))).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("known_id,label,morphology,special_feature,comment"));
        assert!(lines[1].starts_with("a,No,,No,,"));
        assert!(lines[2].starts_with("b,Yes,dE,No,,"));
    }

    #[test]
    fn test_comment_with_delimiters_survives() {
        let dir = tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results.csv"));

        let mut rec = record("c", Existence::Maybe, Some(Morphology::DIN));
        rec.comment = "two cores, \"bright\"\nsecond line".to_string();
        store.append(&rec).unwrap();

        let records = store.load_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].comment, rec.comment);
    }

    #[test]
    fn test_legacy_rows_and_blank_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(
            &path,
            "known_id,label,morphology,special_feature,comment\n\
             1,1,dE,No,\n\
             2,,,No,\n\
             3,0,,GC,faint\n\
             4,0.5,,No,\n",
        )
        .unwrap();

        let completed = ResultStore::new(&path).load_completed().unwrap();
        // 2 は未回答、4 は形態が欠けているので未分類扱い
        assert_eq!(completed, HashSet::from(["1".to_string(), "3".to_string()]));
    }

    #[test]
    fn test_unknown_label_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, "known_id,label\n1,definitely\n").unwrap();

        let result = ResultStore::new(&path).load_completed();
        assert!(matches!(result, Err(ClassifyError::CorruptResultFile { .. })));
    }

    #[test]
    fn test_missing_header_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, "id,value\n1,2\n").unwrap();

        let result = ResultStore::new(&path).load_completed();
        assert!(matches!(result, Err(ClassifyError::CorruptResultFile { .. })));
    }

    #[test]
    fn test_append_failure_is_durability_error() {
        let dir = tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("missing-dir").join("results.csv"));

        let result = store.append(&record("x", Existence::No, None));
        match result {
            Err(ClassifyError::Durability { item_id, .. }) => assert_eq!(item_id, "x"),
            other => panic!("Durabilityを期待したが {:?}", other),
        }
    }

    #[test]
    fn test_empty_file_is_fresh_start() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        File::create(&path).unwrap();

        let store = ResultStore::new(&path);
        assert!(store.load_completed().unwrap().is_empty());

        // ヘッダ付きで書き始められる
        store.append(&record("a", Existence::No, None)).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("known_id,label,"));
        assert_eq!(store.load_completed().unwrap(), HashSet::from(["a".to_string()]));
    }

    #[test]
    fn test_append_after_torn_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let store = ResultStore::new(&path);

        store.append(&record("a", Existence::No, None)).unwrap();
        // 書き込み途中で中断された行
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"b,No,,N").unwrap();
        drop(file);

        store.append(&record("b", Existence::No, None)).unwrap();

        let records = store.load_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].item_id, "b");
        assert_eq!(records[1].special_features, SpecialFeature::No);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("b,No,,Nb"));
    }

    #[test]
    fn test_append_after_row_missing_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, "known_id,label,morphology
1,Yes,dE").unwrap();

        let store = ResultStore::new(&path);
        store.append(&record("2", Existence::Maybe, Some(Morphology::DI))).unwrap();

        let completed = store.load_completed().unwrap();
        assert_eq!(completed, HashSet::from(["1".to_string(), "2".to_string()]));
    }

    #[test]
    fn test_torn_header_is_rewritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, "known_id,lab").unwrap();

        let store = ResultStore::new(&path);
        store.append(&record("a", Existence::No, None)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("known_id,label,morphology,special_feature,comment,classified_at\n"));
        assert_eq!(store.load_completed().unwrap(), HashSet::from(["a".to_string()]));
    }
}
