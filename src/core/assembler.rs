//! Record Assembler：單一文件 → 一批 `NormalizedRecord`

use crate::core::mapping::MappingTable;
use crate::core::navigator::DocumentNavigator;
use crate::core::resolver::SegmentResolver;
use crate::core::ConfigProvider;
use crate::domain::model::{Assembly, NormalizedRecord, StructureNotFound};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RecordAssembler {
    navigator: DocumentNavigator,
    resolver: SegmentResolver,
}

impl RecordAssembler {
    pub fn new(navigator: DocumentNavigator, resolver: SegmentResolver) -> Self {
        Self {
            navigator,
            resolver,
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C, table: Arc<MappingTable>) -> Self {
        Self::new(
            DocumentNavigator::from_paths(config.navigation()),
            SegmentResolver::new(
                table,
                config.unmapped_policy(),
                config.segment_format().clone(),
            ),
        )
    }

    pub fn navigator(&self) -> &DocumentNavigator {
        &self.navigator
    }

    pub fn resolver(&self) -> &SegmentResolver {
        &self.resolver
    }

    pub fn assemble(&self, document: &Value) -> Assembly {
        self.assemble_at(document, Utc::now())
    }

    /// 同一文件的所有記錄共用 `processed_at`；序號只計算實際保留的 segment
    pub fn assemble_at(&self, document: &Value, processed_at: DateTime<Utc>) -> Assembly {
        let member_id = self.navigator.extract_member_id(document);
        let mut warnings = Vec::new();
        if member_id.is_none() {
            warnings.push(StructureNotFound::MemberId);
        }

        let entries = match self.navigator.extract_segment_list(document) {
            Some(entries) if !entries.is_empty() => entries,
            _ => {
                warnings.push(StructureNotFound::SegmentList);
                return Assembly {
                    member_id,
                    records: Vec::new(),
                    skipped_entries: 0,
                    warnings,
                };
            }
        };

        let mut records = Vec::with_capacity(entries.len());
        let mut skipped_entries = 0;

        for entry in entries {
            let Some(segment) = entry.as_object() else {
                skipped_entries += 1;
                continue;
            };

            records.push(NormalizedRecord {
                sequence_id: records.len() as u64 + 1,
                member_id: member_id.clone(),
                processed_at,
                fields: self.resolver.resolve(segment),
            });
        }

        Assembly {
            member_id,
            records,
            skipped_entries,
            warnings,
        }
    }
}
