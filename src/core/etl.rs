use crate::core::assembler::RecordAssembler;
use crate::core::{DocumentOutcome, NormalizedRecord, PersistenceSink, RunSummary, Storage};
use crate::utils::error::{EtlError, Result};
use crate::utils::monitor::SystemMonitor;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_OUTPUT_SUFFIX: &str = "_processed";
const DOCUMENT_EXTENSION: &str = "json";

/// Pipeline driver：找檔、逐份組裝、寫出結果、選擇性寫入資料庫
pub struct EtlEngine<S: Storage> {
    input: S,
    output: S,
    assembler: Arc<RecordAssembler>,
    sink: Option<Arc<dyn PersistenceSink>>,
    output_suffix: String,
    concurrency: usize,
    monitor: Arc<SystemMonitor>,
}

impl<S: Storage + Clone> Clone for EtlEngine<S> {
    fn clone(&self) -> Self {
        Self {
            input: self.input.clone(),
            output: self.output.clone(),
            assembler: Arc::clone(&self.assembler),
            sink: self.sink.clone(),
            output_suffix: self.output_suffix.clone(),
            concurrency: self.concurrency,
            monitor: Arc::clone(&self.monitor),
        }
    }
}

impl<S: Storage + Clone + 'static> EtlEngine<S> {
    pub fn new(input: S, output: S, assembler: RecordAssembler) -> Self {
        Self {
            input,
            output,
            assembler: Arc::new(assembler),
            sink: None,
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            concurrency: 1,
            monitor: Arc::new(SystemMonitor::new(false)),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn PersistenceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_suffix = suffix.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = Arc::new(SystemMonitor::new(enabled));
        self
    }

    /// 批次模式：處理輸入目錄下所有 `.json`，輸出 `<stem><suffix>.json`
    pub async fn run(&self) -> Result<RunSummary> {
        let files = self.input.list_files(DOCUMENT_EXTENSION).await?;
        tracing::info!("📂 Found {} JSON files to process", files.len());
        self.monitor.log_stats("Discovery");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut workers = JoinSet::new();
        // task id → (輸入順序, 檔名)，worker panic 時仍能回報是哪份文件
        let mut pending = HashMap::new();

        for (index, file) in files.into_iter().enumerate() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| EtlError::ProcessingError {
                    message: format!("worker pool closed: {}", e),
                })?;
            let engine = self.clone();
            let document = file.clone();

            let handle = workers.spawn(async move {
                let _permit = permit;
                let output_name = output_file_name(&file, &engine.output_suffix);
                engine.process_document(&file, &output_name).await
            });
            pending.insert(handle.id(), (index, document));
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = workers.join_next_with_id().await {
            match joined {
                Ok((id, outcome)) => {
                    if let Some((index, _)) = pending.remove(&id) {
                        outcomes.push((index, outcome));
                    }
                }
                Err(e) => {
                    tracing::error!("❌ Document worker aborted: {}", e);
                    if let Some((index, document)) = pending.remove(&e.id()) {
                        outcomes.push((
                            index,
                            DocumentOutcome::Failed {
                                document,
                                reason: format!("worker aborted: {}", e),
                            },
                        ));
                    }
                }
            }
        }
        outcomes.sort_by_key(|(index, _)| *index);

        let summary = RunSummary {
            outcomes: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
        };

        self.monitor.log_stats("Processing");
        self.monitor.log_final_stats();
        tracing::info!(
            documents = summary.documents(),
            written = summary.written(),
            empty = summary.empty(),
            failed = summary.failed(),
            records = summary.records(),
            "🏁 Batch complete"
        );

        Ok(summary)
    }

    /// 單檔模式：檔案不存在時回傳 `DocumentNotFound`，輸出 `<stem>.json`
    pub async fn run_single(&self, file: &str) -> Result<DocumentOutcome> {
        if !self.input.exists(file).await {
            return Err(EtlError::DocumentNotFound {
                path: file.to_string(),
            });
        }

        let output_name = output_file_name(file, "");
        let outcome = self.process_document(file, &output_name).await;
        self.monitor.log_final_stats();
        Ok(outcome)
    }

    /// 單一文件的所有錯誤都在這裡轉成 `DocumentOutcome`，不會中斷整批
    pub async fn process_document(&self, file: &str, output_name: &str) -> DocumentOutcome {
        tracing::info!("📄 Processing: {}", file);

        let document = match self.read_document(file).await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("⚠️ Skipping {}: {}", file, e);
                return DocumentOutcome::Failed {
                    document: file.to_string(),
                    reason: e.to_string(),
                };
            }
        };

        let assembly = self.assembler.assemble(&document);
        for warning in &assembly.warnings {
            tracing::warn!("⚠️ {}: {}", file, warning);
        }
        if assembly.skipped_entries > 0 {
            tracing::debug!(
                "{}: skipped {} non-object EB entries",
                file,
                assembly.skipped_entries
            );
        }

        if assembly.is_empty() {
            tracing::warn!("⚠️ No data extracted from {}", file);
            return DocumentOutcome::Empty {
                document: file.to_string(),
            };
        }

        let records = assembly.records.len();
        if let Err(e) = self.write_batch(output_name, &assembly.records).await {
            tracing::error!("❌ Failed to write {}: {}", output_name, e);
            return DocumentOutcome::Failed {
                document: file.to_string(),
                reason: e.to_string(),
            };
        }
        tracing::info!("✅ Saved: {} ({} EB records)", output_name, records);

        let (rows_persisted, persistence_error) = match &self.sink {
            None => (None, None),
            Some(sink) => match sink
                .persist(assembly.member_id.as_deref(), &assembly.records)
                .await
            {
                Ok(rows) => {
                    tracing::info!("🗄️ Inserted {} rows for {}", rows, file);
                    (Some(rows), None)
                }
                Err(e) => {
                    let err = EtlError::PersistenceError {
                        document: file.to_string(),
                        message: e.to_string(),
                    };
                    tracing::error!("❌ {}", err);
                    tracing::error!("💡 Suggestion: {}", err.recovery_suggestion());
                    (None, Some(e.to_string()))
                }
            },
        };

        DocumentOutcome::Written {
            document: file.to_string(),
            output: output_name.to_string(),
            records,
            rows_persisted,
            persistence_error,
        }
    }

    async fn read_document(&self, file: &str) -> Result<serde_json::Value> {
        let bytes = self.input.read_file(file).await?;
        serde_json::from_slice(&bytes).map_err(|e| EtlError::ParseError {
            document: file.to_string(),
            message: e.to_string(),
        })
    }

    async fn write_batch(&self, output_name: &str, records: &[NormalizedRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        self.output.write_file(output_name, json.as_bytes()).await
    }
}

/// `AETNA-271.json` → `AETNA-271<suffix>.json`
pub fn output_file_name(file: &str, suffix: &str) -> String {
    let stem = Path::new(file)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file);
    format!("{}{}.{}", stem, suffix, DOCUMENT_EXTENSION)
}
