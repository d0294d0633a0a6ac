//! Segment Resolver：把一個 EB segment 的代碼換成說明文字

use crate::core::keys::{normalize_keys, normalize_map, FieldKey};
use crate::core::mapping::{CodeMap, MappingTable};
use crate::domain::model::{SegmentFormat, UnmappedPolicy};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SegmentResolver {
    table: Arc<MappingTable>,
    policy: UnmappedPolicy,
    format: SegmentFormat,
}

impl SegmentResolver {
    pub fn new(table: Arc<MappingTable>, policy: UnmappedPolicy, format: SegmentFormat) -> Self {
        Self {
            table,
            policy,
            format,
        }
    }

    pub fn with_policy(table: Arc<MappingTable>, policy: UnmappedPolicy) -> Self {
        Self::new(table, policy, SegmentFormat::default())
    }

    pub fn policy(&self) -> UnmappedPolicy {
        self.policy
    }

    pub fn format(&self) -> &SegmentFormat {
        &self.format
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// 依欄位原本順序處理，最後再整體去除一次保留字元
    pub fn resolve(&self, segment: &Map<String, Value>) -> Map<String, Value> {
        let marker = self.format.marker;
        let mut resolved = Map::with_capacity(segment.len());

        for (key, value) in segment {
            match FieldKey::classify(key, &self.format) {
                FieldKey::Message => {
                    resolved.insert(key.clone(), message_value(value));
                }
                FieldKey::Coded { field, output } => {
                    resolved.insert(output.to_string(), self.resolve_coded(field, value));
                }
                FieldKey::Plain { .. } | FieldKey::Unprefixed => {
                    resolved.insert(key.clone(), normalize_keys(value.clone(), marker));
                }
            }
        }

        normalize_map(resolved, marker)
    }

    fn resolve_coded(&self, field: &str, value: &Value) -> Value {
        let Some(codes) = self.table.codes(field) else {
            return match self.policy {
                UnmappedPolicy::Strict => Value::Null,
                UnmappedPolicy::Lenient => unmapped_value(value, self.format.marker),
            };
        };

        let text = code_text(value);
        let text = text.trim();

        if text.contains(self.format.composite_delimiter) {
            let resolved: Vec<String> = text
                .split(self.format.composite_delimiter)
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .filter_map(|code| self.resolve_code(codes, code))
                .collect();

            if resolved.is_empty() {
                Value::Null
            } else {
                Value::String(resolved.join(&self.format.join_separator))
            }
        } else {
            self.resolve_code(codes, text)
                .map(Value::String)
                .unwrap_or(Value::Null)
        }
    }

    fn resolve_code(&self, codes: &CodeMap, code: &str) -> Option<String> {
        match codes.get(code) {
            Some(description) => Some(description.clone()),
            None => match self.policy {
                UnmappedPolicy::Strict => None,
                UnmappedPolicy::Lenient => Some(code.to_string()),
            },
        }
    }
}

/// `MSG` 統一成陣列：單一物件包成一個元素，其他形態不動
fn message_value(value: &Value) -> Value {
    match value {
        Value::Object(_) => Value::Array(vec![value.clone()]),
        other => other.clone(),
    }
}

/// 查無對照的欄位：純量一律轉成字串，結構值只做 key 正規化
fn unmapped_value(value: &Value, marker: char) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) => normalize_keys(value.clone(), marker),
        scalar => Value::String(code_text(scalar)),
    }
}

fn code_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> Arc<MappingTable> {
        Arc::new(
            MappingTable::from_value(json!({
                "EB01": {"1": "Active Coverage", "6": "Inactive", "Y": "Y"},
                "EB03": {"1": "Active", "86": "Co-Payment", "30": "Health Benefit Plan Coverage"},
                "EB06": {"26": "Episode", "27": "Visit"}
            }))
            .unwrap(),
        )
    }

    fn segment(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_single_code_lookup() {
        let resolver = SegmentResolver::with_policy(table(), UnmappedPolicy::Strict);
        let resolved = resolver.resolve(&segment(json!({"@EB01": "1", "@EB03": " 30 "})));

        assert_eq!(
            Value::Object(resolved),
            json!({"EB01": "Active Coverage", "EB03": "Health Benefit Plan Coverage"})
        );
    }

    #[test]
    fn test_numeric_value_is_stringified() {
        let resolver = SegmentResolver::with_policy(table(), UnmappedPolicy::Strict);
        let resolved = resolver.resolve(&segment(json!({"@EB06": 27})));
        assert_eq!(resolved["EB06"], json!("Visit"));
    }

    #[test]
    fn test_composite_lenient_keeps_raw_codes() {
        let resolver = SegmentResolver::with_policy(table(), UnmappedPolicy::Lenient);

        let resolved = resolver.resolve(&segment(json!({"@EB03": "1^86"})));
        assert_eq!(resolved["EB03"], json!("Active, Co-Payment"));

        let resolved = resolver.resolve(&segment(json!({"@EB03": "1 ^ UC"})));
        assert_eq!(resolved["EB03"], json!("Active, UC"));

        let resolved = resolver.resolve(&segment(json!({"@EB03": "A7^UC"})));
        assert_eq!(resolved["EB03"], json!("A7, UC"));
    }

    #[test]
    fn test_composite_strict_drops_unmapped() {
        let resolver = SegmentResolver::with_policy(table(), UnmappedPolicy::Strict);

        let resolved = resolver.resolve(&segment(json!({"@EB03": "UC^86^1"})));
        assert_eq!(resolved["EB03"], json!("Co-Payment, Active"));

        let resolved = resolver.resolve(&segment(json!({"@EB03": "UC^A7"})));
        assert_eq!(resolved["EB03"], Value::Null);
    }

    #[test]
    fn test_unmapped_single_code() {
        let strict = SegmentResolver::with_policy(table(), UnmappedPolicy::Strict);
        let lenient = SegmentResolver::with_policy(table(), UnmappedPolicy::Lenient);
        let input = segment(json!({"@EB01": "Z"}));

        assert_eq!(strict.resolve(&input)["EB01"], Value::Null);
        assert_eq!(lenient.resolve(&input)["EB01"], json!("Z"));
    }

    #[test]
    fn test_unmapped_field() {
        let strict = SegmentResolver::with_policy(table(), UnmappedPolicy::Strict);
        let lenient = SegmentResolver::with_policy(table(), UnmappedPolicy::Lenient);
        let input = segment(json!({"@EB12": "N", "@EB09": 3}));

        assert_eq!(
            Value::Object(strict.resolve(&input)),
            json!({"EB12": null, "EB09": null})
        );
        assert_eq!(
            Value::Object(lenient.resolve(&input)),
            json!({"EB12": "N", "EB09": "3"})
        );

        let input = segment(json!({"@EB04": 7, "@EB10": {"@EB10-1": "A"}}));
        assert_eq!(
            Value::Object(lenient.resolve(&input)),
            json!({"EB04": "7", "EB10": {"EB10-1": "A"}})
        );
    }

    #[test]
    fn test_empty_composite_parts_are_ignored() {
        let strict = SegmentResolver::with_policy(table(), UnmappedPolicy::Strict);
        let lenient = SegmentResolver::with_policy(table(), UnmappedPolicy::Lenient);

        assert_eq!(lenient.resolve(&segment(json!({"@EB03": "1^"})))["EB03"], json!("Active"));
        assert_eq!(
            lenient.resolve(&segment(json!({"@EB03": "^UC^ ^86"})))["EB03"],
            json!("UC, Co-Payment")
        );
        assert_eq!(strict.resolve(&segment(json!({"@EB03": "^"})))["EB03"], Value::Null);
        assert_eq!(lenient.resolve(&segment(json!({"@EB03": "^"})))["EB03"], Value::Null);
    }

    #[test]
    fn test_message_field_normalized_to_list() {
        let resolver = SegmentResolver::with_policy(table(), UnmappedPolicy::Strict);

        let resolved = resolver.resolve(&segment(json!({"MSG": {"@MSG01": "Call for details"}})));
        assert_eq!(resolved["MSG"], json!([{"MSG01": "Call for details"}]));

        let resolved = resolver.resolve(&segment(json!({
            "MSG": [{"@MSG01": "first"}, {"@MSG01": "second"}]
        })));
        assert_eq!(
            resolved["MSG"],
            json!([{"MSG01": "first"}, {"MSG01": "second"}])
        );

        let resolved = resolver.resolve(&segment(json!({"MSG": "plain text"})));
        assert_eq!(resolved["MSG"], json!("plain text"));
    }

    #[test]
    fn test_pass_through_fields_are_normalized() {
        let resolver = SegmentResolver::with_policy(table(), UnmappedPolicy::Strict);
        let resolved = resolver.resolve(&segment(json!({
            "@EB01": "1",
            "DTP": {"@DTP01": "291", "@DTP03": "20240101"},
            "@HSD01": "VS",
            "REF": [{"@REF01": "18"}]
        })));

        assert_eq!(
            Value::Object(resolved),
            json!({
                "EB01": "Active Coverage",
                "DTP": {"DTP01": "291", "DTP03": "20240101"},
                "HSD01": "VS",
                "REF": [{"REF01": "18"}]
            })
        );
    }

    #[test]
    fn test_field_order_preserved() {
        let resolver = SegmentResolver::with_policy(table(), UnmappedPolicy::Strict);
        let resolved = resolver.resolve(&segment(json!({
            "@EB03": "30", "MSG": [], "@EB01": "1", "extra": 1
        })));
        let keys: Vec<&str> = resolved.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["EB03", "MSG", "EB01", "extra"]);
    }

    #[test]
    fn test_custom_format() {
        let format = SegmentFormat {
            marker: '#',
            coded_tag: "EB".to_string(),
            message_field: "NOTE".to_string(),
            composite_delimiter: '|',
            join_separator: " / ".to_string(),
        };
        let resolver = SegmentResolver::new(table(), UnmappedPolicy::Strict, format);
        let resolved = resolver.resolve(&segment(json!({
            "#EB03": "1|86",
            "NOTE": {"#text": "x"}
        })));

        assert_eq!(resolved["EB03"], json!("Active / Co-Payment"));
        assert_eq!(resolved["NOTE"], json!([{"text": "x"}]));
        assert_eq!(resolver.format().marker, '#');
        assert_eq!(resolver.policy(), UnmappedPolicy::Strict);
    }
}
