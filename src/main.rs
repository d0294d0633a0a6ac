use clap::Parser;
use eligibility_etl::core::{ConfigProvider, DocumentOutcome, PersistenceSink};
use eligibility_etl::utils::{logger, validation::Validate};
use eligibility_etl::{
    CliConfig, EtlEngine, EtlError, LocalStorage, MappingTable, RecordAssembler, SqliteSink,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs() {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting eligibility-etl");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.load_config().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => exit_with(&e, 1),
    };

    let input = LocalStorage::new(config.input_dir());
    let output = LocalStorage::new(config.output_dir());

    // 單檔模式先確認檔案存在，再載入 mapping
    if let Some(file) = &cli.file {
        if !input.full_path(file).is_file() {
            eprintln!("❌ File not found: {}", file);
            eprintln!("   Expected path: {}", input.full_path(file).display());
            std::process::exit(1);
        }
    }

    tracing::info!("📖 Loading mapping table from {}", config.mapping_path());
    let table = match MappingTable::from_file(config.mapping_path()) {
        Ok(table) => Arc::new(table),
        Err(e) => exit_with(&e, 3),
    };
    tracing::info!(
        "✅ Mapping loaded: {} fields, {} codes (unmapped policy: {})",
        table.field_count(),
        table.code_count(),
        config.unmapped_policy()
    );

    let assembler = RecordAssembler::from_config(&config, table);
    let mut engine = EtlEngine::new(input, output, assembler)
        .with_output_suffix(config.output_suffix())
        .with_concurrency(config.concurrency())
        .with_monitoring(config.monitoring_enabled());

    if let Some(database_url) = config.database_url() {
        match SqliteSink::connect(database_url, config.max_connections()).await {
            Ok(sink) => {
                let sink: Arc<dyn PersistenceSink> = Arc::new(sink);
                engine = engine.with_sink(sink);
            }
            Err(e) => {
                // 資料庫無法連線時仍然輸出檔案
                tracing::error!("❌ Database unavailable, continuing without persistence: {}", e);
                tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            }
        }
    }

    match &cli.file {
        Some(file) => {
            tracing::info!("📄 Processing single file: {}", file);
            match engine.run_single(file).await {
                Ok(outcome) => report_single(&outcome),
                Err(e) => exit_with(&e, 1),
            }
        }
        None => {
            let summary = match engine.run().await {
                Ok(summary) => summary,
                Err(e) => exit_with(&e, 1),
            };
            println!(
                "✅ Processed {} files: {} written ({} EB records), {} without EB data, {} failed",
                summary.documents(),
                summary.written(),
                summary.records(),
                summary.empty(),
                summary.failed()
            );
            if config.database_url().is_some() {
                println!(
                    "🗄️ {} rows persisted, {} documents failed to persist",
                    summary.rows_persisted(),
                    summary.persistence_failures()
                );
            }
        }
    }

    Ok(())
}

fn report_single(outcome: &DocumentOutcome) {
    match outcome {
        DocumentOutcome::Written {
            document,
            output,
            records,
            ..
        } => {
            println!("✅ Successfully processed: {}", document);
            println!("✅ Output saved to: {}", output);
            println!("   Records: {} EB entries", records);
        }
        DocumentOutcome::Empty { document } => {
            println!("⚠️ No data extracted from {}", document);
        }
        DocumentOutcome::Failed { document, reason } => {
            println!("❌ Error processing {}: {}", document, reason);
        }
    }
}

fn exit_with(e: &EtlError, exit_code: i32) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(exit_code);
}
