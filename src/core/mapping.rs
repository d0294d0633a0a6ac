//! Mapping Table Loader：EB 欄位 → 代碼 → 說明

use crate::utils::error::{EtlError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

pub type CodeMap = HashMap<String, String>;

/// 建立後即不可變，多個 worker 透過 `Arc` 共用
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingTable {
    fields: HashMap<String, CodeMap>,
}

impl MappingTable {
    /// 從檔案載入，`.toml` 以 TOML 解析，其他一律視為 JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EtlError::config(format!("cannot read mapping file {}: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| EtlError::config(format!("mapping is not valid JSON: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let value: Value = toml::from_str(content)
            .map_err(|e| EtlError::config(format!("mapping is not valid TOML: {}", e)))?;
        Self::from_value(value)
    }

    /// 每個欄位的代碼可以是物件 `{"1": "Active"}`，
    /// 或是 `[{"code": 1, "description": "Active"}]` 陣列。代碼一律轉為字串。
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(entries) = value else {
            return Err(EtlError::config(
                "mapping must be an object keyed by field name",
            ));
        };

        let mut fields = HashMap::with_capacity(entries.len());
        for (field, codes) in entries {
            let codes = match codes {
                Value::Object(codes) => codes
                    .into_iter()
                    .map(|(code, description)| Ok((code, scalar_text(&field, &description)?)))
                    .collect::<Result<CodeMap>>()?,
                Value::Array(items) => items
                    .into_iter()
                    .map(|item| code_entry(&field, item))
                    .collect::<Result<CodeMap>>()?,
                other => {
                    return Err(EtlError::config(format!(
                        "codes for {} must be an object or an array, got {}",
                        field,
                        type_name(&other)
                    )))
                }
            };
            fields.insert(field, codes);
        }

        Ok(Self { fields })
    }

    pub fn codes(&self, field: &str) -> Option<&CodeMap> {
        self.fields.get(field)
    }

    pub fn lookup(&self, field: &str, code: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|codes| codes.get(code))
            .map(String::as_str)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn code_count(&self) -> usize {
        self.fields.values().map(HashMap::len).sum()
    }
}

fn code_entry(field: &str, item: Value) -> Result<(String, String)> {
    let Value::Object(entry) = item else {
        return Err(EtlError::config(format!(
            "code entries for {} must be objects with code and description",
            field
        )));
    };

    let code = entry
        .get("code")
        .ok_or_else(|| EtlError::config(format!("code entry for {} has no code", field)))?;
    let description = entry.get("description").ok_or_else(|| {
        EtlError::config(format!("code entry for {} has no description", field))
    })?;

    Ok((scalar_text(field, code)?, scalar_text(field, description)?))
}

fn scalar_text(field: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(EtlError::config(format!(
            "mapping for {} contains a {} where a code or description was expected",
            field,
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
