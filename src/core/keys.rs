//! Key Normalizer：移除來源格式在欄位名稱前加上的保留字元 (預設 `@`)

use crate::domain::model::SegmentFormat;
use serde_json::{Map, Value};

/// 去掉 key 開頭的保留字元
pub fn strip_marker(key: &str, marker: char) -> &str {
    key.trim_start_matches(marker)
}

/// 遞迴處理整棵樹的 key，值的形狀維持不變
pub fn normalize_keys(value: Value, marker: char) -> Value {
    match value {
        Value::Object(map) => Value::Object(normalize_map(map, marker)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| normalize_keys(item, marker))
                .collect(),
        ),
        scalar => scalar,
    }
}

pub fn normalize_map(map: Map<String, Value>, marker: char) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| {
            let key = if key.starts_with(marker) {
                strip_marker(&key, marker).to_string()
            } else {
                key
            };
            (key, normalize_keys(value, marker))
        })
        .collect()
}

/// Segment 欄位名稱的分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey<'a> {
    /// 保留的訊息欄位 (`MSG`)
    Message,
    /// `@EB03` 這類需要查表的欄位；`field` 是查表用的名稱，`output` 是輸出 key
    Coded { field: &'a str, output: &'a str },
    /// 有保留字元但不是代碼欄位
    Plain { output: &'a str },
    Unprefixed,
}

impl<'a> FieldKey<'a> {
    pub fn classify(key: &'a str, format: &SegmentFormat) -> Self {
        if key == format.message_field {
            return FieldKey::Message;
        }

        match key.strip_prefix(format.marker) {
            Some(rest) if rest.starts_with(format.coded_tag.as_str()) => FieldKey::Coded {
                field: rest,
                output: strip_marker(key, format.marker),
            },
            Some(_) => FieldKey::Plain {
                output: strip_marker(key, format.marker),
            },
            None => FieldKey::Unprefixed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_marker() {
        assert_eq!(strip_marker("@EB01", '@'), "EB01");
        assert_eq!(strip_marker("EB01", '@'), "EB01");
        assert_eq!(strip_marker("@@NM109", '@'), "NM109");
        assert_eq!(strip_marker("a@b", '@'), "a@b");
    }

    #[test]
    fn test_normalize_nested_tree() {
        let input = json!({
            "@REF01": "SY",
            "DTP": [
                {"@DTP01": "291", "@DTP03": "20240101"},
                {"@DTP01": "348"}
            ],
            "LS": {"@LS01": "2120", "NM1": {"@NM101": "P3"}},
            "count": 3
        });

        let output = normalize_keys(input, '@');

        assert_eq!(
            output,
            json!({
                "REF01": "SY",
                "DTP": [
                    {"DTP01": "291", "DTP03": "20240101"},
                    {"DTP01": "348"}
                ],
                "LS": {"LS01": "2120", "NM1": {"NM101": "P3"}},
                "count": 3
            })
        );
    }

    #[test]
    fn test_scalars_unchanged() {
        assert_eq!(normalize_keys(json!("@EB01"), '@'), json!("@EB01"));
        assert_eq!(normalize_keys(json!(null), '@'), json!(null));
        assert_eq!(normalize_keys(json!([1, "@x"]), '@'), json!([1, "@x"]));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let input = json!({
            "@@double": {"@inner": [{"@deep": 1}]},
            "plain": {"@x": null}
        });

        let once = normalize_keys(input, '@');
        let twice = normalize_keys(once.clone(), '@');
        assert_eq!(once, twice);
    }

    #[test]
    fn test_key_order_preserved() {
        let input = json!({"@b": 1, "a": 2, "@c": 3});
        let output = normalize_keys(input, '@');
        let keys: Vec<&String> = output.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_classify_fields() {
        let format = SegmentFormat::default();

        assert_eq!(FieldKey::classify("MSG", &format), FieldKey::Message);
        assert_eq!(
            FieldKey::classify("@EB03", &format),
            FieldKey::Coded {
                field: "EB03",
                output: "EB03"
            }
        );
        assert_eq!(
            FieldKey::classify("@HSD01", &format),
            FieldKey::Plain { output: "HSD01" }
        );
        assert_eq!(FieldKey::classify("EB03", &format), FieldKey::Unprefixed);
        assert_eq!(FieldKey::classify("@MSG", &format), FieldKey::Plain { output: "MSG" });
    }
}
