//! Document Navigator：在 271 文件樹中找 member id 與 EB segment 清單

use crate::domain::model::NavigationPaths;
use serde_json::Value;

/// 一條固定的巢狀 key 路徑，只經過物件節點
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStrategy {
    name: String,
    path: Vec<String>,
}

impl PathStrategy {
    pub fn new<I, K>(name: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            name: name.into(),
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    /// 以 `.` 分隔的路徑，例如 `ISA.GS.ST.HL.HL.HL.EB`
    pub fn parse(name: impl Into<String>, dotted: &str) -> Self {
        Self::new(
            name,
            dotted
                .split('.')
                .map(str::trim)
                .filter(|segment| !segment.is_empty()),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// 任何一層不存在或不是物件就回傳 `None`
    pub fn resolve<'d>(&self, document: &'d Value) -> Option<&'d Value> {
        self.path
            .iter()
            .try_fold(document, |node, key| node.as_object()?.get(key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNavigator {
    member_id: PathStrategy,
    segment_lists: Vec<PathStrategy>,
}

impl DocumentNavigator {
    pub fn new(member_id: PathStrategy, segment_lists: Vec<PathStrategy>) -> Self {
        Self {
            member_id,
            segment_lists,
        }
    }

    pub fn from_paths(paths: &NavigationPaths) -> Self {
        let segment_lists = paths
            .segment_lists
            .iter()
            .enumerate()
            .map(|(index, dotted)| PathStrategy::parse(format!("variant-{}", index + 1), dotted))
            .collect();

        Self::new(PathStrategy::parse("member-id", &paths.member_id), segment_lists)
    }

    pub fn strategies(&self) -> &[PathStrategy] {
        &self.segment_lists
    }

    /// 字串原樣回傳，數字與布林轉成字串；null 或結構值視為不存在
    pub fn extract_member_id(&self, document: &Value) -> Option<String> {
        match self.member_id.resolve(document)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// 依序嘗試每個 strategy，回傳第一個成功者與其 segment 清單
    pub fn locate_segment_list<'d>(
        &self,
        document: &'d Value,
    ) -> Option<(&PathStrategy, Vec<&'d Value>)> {
        self.segment_lists.iter().find_map(|strategy| {
            let node = strategy.resolve(document)?;
            let entries = match node {
                Value::Array(items) => items.iter().collect(),
                // 空物件等同沒有資料
                Value::Object(map) if map.is_empty() => Vec::new(),
                Value::Object(_) => vec![node],
                _ => return None,
            };
            Some((strategy, entries))
        })
    }

    pub fn extract_segment_list<'d>(&self, document: &'d Value) -> Option<Vec<&'d Value>> {
        self.locate_segment_list(document)
            .map(|(_, entries)| entries)
    }
}

impl Default for DocumentNavigator {
    fn default() -> Self {
        Self::from_paths(&NavigationPaths::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hl3_document(eb: Value) -> Value {
        json!({
            "ISA": {"GS": {"ST": {"HL": {"HL": {"HL": {
                "NM1": {"@NM101": "IL", "@NM109": "W123456789"},
                "EB": eb
            }}}}}}
        })
    }

    fn hl4_document(eb: Value) -> Value {
        json!({
            "ISA": {"GS": {"ST": {"HL": {"HL": {"HL": {
                "NM1": {"@NM109": "W987654321"},
                "HL": {"EB": eb}
            }}}}}}
        })
    }

    #[test]
    fn test_path_strategy_resolve() {
        let strategy = PathStrategy::parse("test", "a.b.c");
        assert_eq!(strategy.path(), &["a", "b", "c"]);
        assert_eq!(strategy.resolve(&json!({"a": {"b": {"c": 7}}})), Some(&json!(7)));
        assert_eq!(strategy.resolve(&json!({"a": {"b": {}}})), None);
        assert_eq!(strategy.resolve(&json!({"a": [{"b": {"c": 7}}]})), None);
        assert_eq!(strategy.resolve(&json!("scalar")), None);
    }

    #[test]
    fn test_extract_member_id() {
        let navigator = DocumentNavigator::default();
        assert_eq!(
            navigator.extract_member_id(&hl3_document(json!([]))),
            Some("W123456789".to_string())
        );
        assert_eq!(navigator.extract_member_id(&json!({"ISA": {}})), None);

        let numeric = json!({"ISA": {"GS": {"ST": {"HL": {"HL": {"HL": {
            "NM1": {"@NM109": 12345}
        }}}}}}});
        assert_eq!(navigator.extract_member_id(&numeric), Some("12345".to_string()));
    }

    #[test]
    fn test_deeper_variant_wins() {
        let navigator = DocumentNavigator::default();
        let document = hl4_document(json!([{"@EB01": "1"}, {"@EB01": "6"}]));

        let (strategy, entries) = navigator.locate_segment_list(&document).unwrap();
        assert_eq!(strategy.name(), "variant-1");
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_falls_back_to_shallower_variant() {
        let navigator = DocumentNavigator::default();
        let document = hl3_document(json!([{"@EB01": "1"}]));

        let (strategy, entries) = navigator.locate_segment_list(&document).unwrap();
        assert_eq!(strategy.name(), "variant-2");
        assert_eq!(entries, vec![&json!({"@EB01": "1"})]);
    }

    #[test]
    fn test_single_mapping_becomes_one_element_list() {
        let navigator = DocumentNavigator::default();
        let document = hl3_document(json!({"@EB01": "1"}));

        let entries = navigator.extract_segment_list(&document).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_object());
    }

    #[test]
    fn test_neither_variant_resolves() {
        let navigator = DocumentNavigator::default();
        assert!(navigator.extract_segment_list(&json!({"ISA": {"GS": {}}})).is_none());
        assert!(navigator.extract_segment_list(&json!([])).is_none());
    }

    #[test]
    fn test_wrong_shape_falls_through() {
        let navigator = DocumentNavigator::default();
        // 第四層 HL 是字串，HL4 路徑不成立，改用 HL3
        let document = json!({"ISA": {"GS": {"ST": {"HL": {"HL": {"HL": {
            "HL": "unexpected",
            "EB": [{"@EB01": "1"}]
        }}}}}}});
        assert_eq!(navigator.extract_segment_list(&document).unwrap().len(), 1);

        // EB 本身是純量，兩個路徑都不成立
        let document = hl3_document(json!("1"));
        assert!(navigator.extract_segment_list(&document).is_none());
    }

    #[test]
    fn test_empty_list_does_not_fall_back() {
        let navigator = DocumentNavigator::default();
        let document = json!({"ISA": {"GS": {"ST": {"HL": {"HL": {"HL": {
            "HL": {"EB": []},
            "EB": [{"@EB01": "1"}]
        }}}}}}});
        assert_eq!(navigator.extract_segment_list(&document), Some(Vec::new()));
    }

    #[test]
    fn test_custom_paths() {
        let navigator = DocumentNavigator::from_paths(&NavigationPaths {
            member_id: "subscriber.@id".to_string(),
            segment_lists: vec!["benefits.EB".to_string()],
        });
        let document = json!({
            "subscriber": {"@id": "M1"},
            "benefits": {"EB": [{"@EB01": "1"}]}
        });

        assert_eq!(navigator.extract_member_id(&document), Some("M1".to_string()));
        assert_eq!(navigator.strategies().len(), 1);
        assert_eq!(navigator.extract_segment_list(&document).unwrap().len(), 1);
    }
}
