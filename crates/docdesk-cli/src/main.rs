//! Docdesk CLI: batch uploads into object store collections and access to the
//! document registries.
//!
//! Storage is configured from the environment (STORAGE_BACKEND, LOCAL_STORAGE_PATH,
//! S3_BUCKET, ...); `docs` commands need DOCUMENT_API_URL.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use docdesk_api_client::HttpDocumentStore;
use docdesk_cli::{init_tracing, store_error, user_error, ProgressReport};
use docdesk_core::models::{
    AnswerMode, FieldFilter, FileRef, Permission, ResultsDocument, UploadTags,
};
use docdesk_core::validation::normalize_collection_name;
use docdesk_core::Config;
use docdesk_services::{
    create_storage, paginate, Document, DocumentStore, FileSelection, Registry, UploadTracker,
    DEFAULT_PAGE_SIZE,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "docdesk", about = "Document upload and registry CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload files into a collection, creating it if needed
    Upload {
        /// Target collection (trimmed and lower-cased)
        collection: String,
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Private, Org-Wide or Public
        #[arg(long)]
        permission: Option<String>,
        /// Document type tag
        #[arg(long)]
        doc_type: Option<String>,
        /// Persona tag
        #[arg(long)]
        persona: Option<String>,
    },
    /// List objects already in a collection
    List {
        /// Collection to list; DEFAULT_COLLECTION when omitted
        collection: Option<String>,
        /// Only objects tagged with this persona (requires --doc-type)
        #[arg(long, requires = "doc_type")]
        persona: Option<String>,
        /// Only objects tagged with this document type (requires --persona)
        #[arg(long, requires = "persona")]
        doc_type: Option<String>,
    },
    /// Document store operations
    Docs {
        #[command(subcommand)]
        sub: DocsCommands,
    },
}

#[derive(Subcommand)]
enum DocsCommands {
    /// List every document in a container
    List { container: String },
    /// Get one document by id
    Get { container: String, id: String },
    /// Insert or replace a document from a JSON file
    Put { container: String, file: PathBuf },
    /// Show the extracted fields of a results document, one page at a time
    Fields {
        /// Results document id
        id: String,
        #[arg(long, value_enum, default_value = "all")]
        answers: Answers,
        /// Case-insensitive filter on the field name
        #[arg(long, default_value = "")]
        field: String,
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        per_page: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Answers {
    All,
    Answered,
    NotAnswered,
}

impl From<Answers> for AnswerMode {
    fn from(answers: Answers) -> Self {
        match answers {
            Answers::All => AnswerMode::All,
            Answers::Answered => AnswerMode::Answered,
            Answers::NotAnswered => AnswerMode::NotAnswered,
        }
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn load_config() -> anyhow::Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn tracker(config: &Config) -> anyhow::Result<UploadTracker> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage")?;
    Ok(UploadTracker::from_config(storage, config))
}

fn document_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store = HttpDocumentStore::from_config(config)
        .context("Failed to create document API client. Set DOCUMENT_API_URL")?;
    Ok(Arc::new(store))
}

async fn upload(
    config: &Config,
    collection: String,
    files: Vec<PathBuf>,
    tags: UploadTags,
) -> anyhow::Result<()> {
    if normalize_collection_name(&collection).is_none() {
        anyhow::bail!("Collection name must not be blank");
    }
    let tracker = tracker(config).await?;

    let mut selection = FileSelection::new();
    for path in files {
        let metadata = tokio::fs::metadata(&path)
            .await
            .with_context(|| format!("Cannot read {}", path.display()))?;
        if !selection.add(FileRef::from_path(&path, metadata.len())) {
            tracing::warn!(path = %path.display(), "Skipping duplicate file");
        }
    }
    eprintln!(
        "Uploading {} file(s), {:.2} MiB, about {:.1} min",
        selection.len(),
        selection.total_mib(),
        selection.estimated_minutes()
    );

    let mut rx = tracker.subscribe();
    let report = async {
        let mut report = ProgressReport::new();
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            for line in report.changes(&snapshot) {
                eprintln!("{}", line);
            }
            if !snapshot.uploading {
                break;
            }
        }
    };

    let (batch, ()) = tokio::join!(
        tracker.submit(&collection, selection.take(), tags.to_metadata()),
        report
    );

    print_json(&*batch)?;
    if batch.failed() > 0 {
        anyhow::bail!("{} of {} uploads failed", batch.failed(), batch.tasks.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config()?;

    match cli.command {
        Commands::Upload {
            collection,
            files,
            permission,
            doc_type,
            persona,
        } => {
            let mut tags = UploadTags::new();
            if let Some(permission) = permission {
                tags = tags.permission(permission.parse::<Permission>()?);
            }
            if let Some(doc_type) = doc_type {
                tags = tags.doc_type(doc_type);
            }
            if let Some(persona) = persona {
                tags = tags.persona(persona);
            }
            upload(&config, collection, files, tags).await?;
        }
        Commands::List {
            collection,
            persona,
            doc_type,
        } => {
            let tracker = tracker(&config).await?;
            let collection =
                collection.unwrap_or_else(|| config.default_collection().to_string());
            let tasks = match (persona, doc_type) {
                (Some(persona), Some(doc_type)) => {
                    tracker
                        .list_existing_filtered(&collection, &persona, &doc_type)
                        .await
                }
                _ => tracker.list_existing(&collection).await,
            }
            .map_err(user_error)?;
            print_json(&tasks)?;
        }
        Commands::Docs { sub } => {
            let store = document_store(&config)?;
            match sub {
                DocsCommands::List { container } => {
                    let documents = store
                        .list_documents(&container)
                        .await
                        .map_err(store_error)?;
                    print_json(&documents)?;
                }
                DocsCommands::Get { container, id } => {
                    let document = store
                        .get_document(&container, &id)
                        .await
                        .map_err(store_error)?
                        .with_context(|| format!("Document {} not found in {}", id, container))?;
                    print_json(&document)?;
                }
                DocsCommands::Put { container, file } => {
                    let raw = tokio::fs::read_to_string(&file)
                        .await
                        .with_context(|| format!("Cannot read {}", file.display()))?;
                    let value: serde_json::Value =
                        serde_json::from_str(&raw).context("Invalid JSON document")?;
                    let document = Document::from_value(value).map_err(store_error)?;
                    let stored = store
                        .upsert_document(&container, document)
                        .await
                        .map_err(store_error)?;
                    print_json(&stored)?;
                }
                DocsCommands::Fields {
                    id,
                    answers,
                    field,
                    page,
                    per_page,
                } => {
                    let results: ResultsDocument = Registry::results(store)
                        .get(&id)
                        .await
                        .map_err(store_error)?
                        .with_context(|| format!("Results document {} not found", id))?;
                    let filter = FieldFilter {
                        field_name: field,
                        answer_mode: answers.into(),
                        ..FieldFilter::default()
                    };
                    let fields = results.filter_fields(&filter);
                    print_json(&paginate(fields, page, per_page))?;
                }
            }
        }
    }

    Ok(())
}
