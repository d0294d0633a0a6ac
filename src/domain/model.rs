use crate::utils::error::EtlError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// 單筆輸出記錄，對應一個 EB segment
///
/// 輸出檔沿用既有欄位名稱：`id`、`member_id`、`inserted_at`、`data`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    #[serde(rename = "id")]
    pub sequence_id: u64,
    pub member_id: Option<String>,
    #[serde(rename = "inserted_at", with = "timestamp_format")]
    pub processed_at: DateTime<Utc>,
    #[serde(rename = "data")]
    pub fields: Map<String, Value>,
}

impl NormalizedRecord {
    /// `inserted_at` 的字串形式 (ISO-8601，微秒，`Z` 結尾)
    pub fn processed_at_text(&self) -> String {
        timestamp_format::to_text(&self.processed_at)
    }
}

/// 一份文件產生的所有記錄；空批次代表「找不到 EB 資料」
pub type OutputBatch = Vec<NormalizedRecord>;

mod timestamp_format {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn to_text(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_text(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// 文件中找不到預期結構時的警告種類 (不視為錯誤)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureNotFound {
    MemberId,
    SegmentList,
}

impl fmt::Display for StructureNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureNotFound::MemberId => write!(f, "member id not found"),
            StructureNotFound::SegmentList => write!(f, "no EB segment list found"),
        }
    }
}

/// Record Assembler 對單一文件的處理結果
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub member_id: Option<String>,
    pub records: OutputBatch,
    /// 不是物件形態而被略過的 segment 數量
    pub skipped_entries: usize,
    pub warnings: Vec<StructureNotFound>,
}

impl Assembly {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 查無對照時的處理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedPolicy {
    /// 查無對照的欄位或代碼輸出 null，組合值中的未知代碼直接丟棄
    #[default]
    Strict,
    /// 查無對照時保留原始代碼
    Lenient,
}

impl UnmappedPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnmappedPolicy::Strict => "strict",
            UnmappedPolicy::Lenient => "lenient",
        }
    }
}

impl fmt::Display for UnmappedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnmappedPolicy {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(UnmappedPolicy::Strict),
            "lenient" => Ok(UnmappedPolicy::Lenient),
            other => Err(EtlError::InvalidConfigValueError {
                field: "resolution.unmapped_policy".to_string(),
                value: other.to_string(),
                reason: "Valid policies: strict, lenient".to_string(),
            }),
        }
    }
}

/// 來源格式的保留字元與欄位命名慣例
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentFormat {
    pub marker: char,
    pub coded_tag: String,
    pub message_field: String,
    pub composite_delimiter: char,
    pub join_separator: String,
}

impl Default for SegmentFormat {
    fn default() -> Self {
        Self {
            marker: '@',
            coded_tag: "EB".to_string(),
            message_field: "MSG".to_string(),
            composite_delimiter: '^',
            join_separator: ", ".to_string(),
        }
    }
}

/// 文件導覽路徑，以 `.` 分隔各層 key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationPaths {
    pub member_id: String,
    /// 依序嘗試，第一個成功者勝出
    pub segment_lists: Vec<String>,
}

impl Default for NavigationPaths {
    fn default() -> Self {
        Self {
            member_id: "ISA.GS.ST.HL.HL.HL.NM1.@NM109".to_string(),
            segment_lists: vec![
                "ISA.GS.ST.HL.HL.HL.HL.EB".to_string(),
                "ISA.GS.ST.HL.HL.HL.EB".to_string(),
            ],
        }
    }
}

/// 單一文件在 pipeline 中的最終結果
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Written {
        document: String,
        output: String,
        records: usize,
        rows_persisted: Option<u64>,
        persistence_error: Option<String>,
    },
    Empty {
        document: String,
    },
    Failed {
        document: String,
        reason: String,
    },
}

impl DocumentOutcome {
    pub fn document(&self) -> &str {
        match self {
            DocumentOutcome::Written { document, .. }
            | DocumentOutcome::Empty { document }
            | DocumentOutcome::Failed { document, .. } => document,
        }
    }
}

/// 整批執行的彙總
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub outcomes: Vec<DocumentOutcome>,
}

impl RunSummary {
    pub fn documents(&self) -> usize {
        self.outcomes.len()
    }

    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DocumentOutcome::Written { .. }))
            .count()
    }

    pub fn empty(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DocumentOutcome::Empty { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DocumentOutcome::Failed { .. }))
            .count()
    }

    pub fn records(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                DocumentOutcome::Written { records, .. } => *records,
                _ => 0,
            })
            .sum()
    }

    pub fn rows_persisted(&self) -> u64 {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                DocumentOutcome::Written { rows_persisted, .. } => *rows_persisted,
                _ => None,
            })
            .sum()
    }

    pub fn persistence_failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o,
                    DocumentOutcome::Written {
                        persistence_error: Some(_),
                        ..
                    }
                )
            })
            .count()
    }
}
