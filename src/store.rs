//! Prompt persistence and catalog lookup
//!
//! [`PromptStore`] and [`CatalogProvider`] are the narrow interfaces the search
//! service consumes. [`JsonFileStore`] keeps everything as flat JSON files in one
//! data directory:
//!
//! ```text
//! {data_dir}/prompts.json      array of prompts
//! {data_dir}/categories.json   array of {id, name}
//! {data_dir}/tags.json         array of {id, name}
//! ```
//!
//! Writes hold an exclusive lock on `{data_dir}/.lock`, go to a `.tmp` sibling
//! first and are renamed into place.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{validate_prompt_id, AppError};
use crate::models::{Category, Prompt, PromptDraft, PromptPatch, Tag};

const PROMPTS_FILE: &str = "prompts.json";
const CATEGORIES_FILE: &str = "categories.json";
const TAGS_FILE: &str = "tags.json";
const LOCK_FILE: &str = ".lock";

/// Low-level store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Prompt {0} does not exist")]
    MissingPrompt(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingPrompt(id) => AppError::NotFound(format!("prompt {}", id)),
            StoreError::Malformed { .. } => AppError::ParseError(err.to_string()),
            StoreError::Io { .. } | StoreError::Task(_) => AppError::StoreError(err.to_string()),
        }
    }
}

/// Source of prompt documents
pub trait PromptStore: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<Prompt>, AppError>> + Send;

    fn get_by_id(&self, id: &str) -> impl Future<Output = Result<Option<Prompt>, AppError>> + Send;

    /// Persist a new prompt; the store assigns id and timestamps
    fn create(&self, draft: PromptDraft) -> impl Future<Output = Result<Prompt, AppError>> + Send;

    fn update(&self, id: &str, patch: PromptPatch) -> impl Future<Output = Result<Prompt, AppError>> + Send;
}

/// Category and tag lookup
pub trait CatalogProvider: Send + Sync {
    fn categories(&self) -> impl Future<Output = Result<Vec<Category>, AppError>> + Send;

    fn tags(&self) -> impl Future<Output = Result<Vec<Tag>, AppError>> + Send;
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Pick `p-{millis}`, suffixed when that id is already taken
fn next_prompt_id(existing: &[Prompt]) -> String {
    let base = format!("p-{}", Utc::now().timestamp_millis());
    let taken = |candidate: &str| existing.iter().any(|p| p.id == candidate);

    let mut candidate = base.clone();
    let mut suffix = 2;
    while taken(candidate.as_str()) {
        candidate = format!("{}-{}", base, suffix);
        suffix += 1;
    }
    candidate
}

fn draft_into_prompt(draft: PromptDraft, id: String) -> Prompt {
    let now = now_timestamp();
    Prompt {
        id,
        title: draft.title,
        description: draft.description,
        content: draft.content,
        tags: draft.tags,
        category: draft.category,
        created_at: Some(now.clone()),
        updated_at: Some(now),
    }
}

/// Flat JSON file store rooted at one directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// Read a JSON array; a missing file is an empty collection
    fn read_collection<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, StoreError> {
        let path = self.path(file);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet", path.display());
                return Ok(Vec::new());
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        if data.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&data).map_err(|source| StoreError::Malformed { path, source })
    }

    /// Replace `file` atomically with the serialized collection
    fn write_collection<T: Serialize>(&self, file: &str, items: &[T]) -> Result<(), StoreError> {
        let path = self.path(file);
        let tmp_path = path.with_extension("json.tmp");
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| StoreError::Io { path, source }
        };

        let json = serde_json::to_string_pretty(items).map_err(|source| StoreError::Malformed {
            path: path.clone(),
            source,
        })?;
        fs::write(&tmp_path, json).map_err(io_err(&tmp_path))?;
        fs::rename(&tmp_path, &path).map_err(io_err(&path))?;
        Ok(())
    }

    /// Run `f` while holding the exclusive store lock
    fn with_lock<R>(&self, f: impl FnOnce() -> Result<R, StoreError>) -> Result<R, StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.data_dir.clone(),
            source,
        };
        fs::create_dir_all(&self.data_dir).map_err(io_err)?;

        let lock_path = self.path(LOCK_FILE);
        let lock_file = fs::File::create(&lock_path).map_err(io_err)?;
        lock_file.lock_exclusive().map_err(io_err)?;

        let result = f();

        lock_file.unlock().map_err(io_err)?;
        result
    }

    fn create_blocking(&self, draft: PromptDraft) -> Result<Prompt, StoreError> {
        self.with_lock(|| {
            let mut prompts: Vec<Prompt> = self.read_collection(PROMPTS_FILE)?;
            let prompt = draft_into_prompt(draft, next_prompt_id(&prompts));
            prompts.push(prompt.clone());
            self.write_collection(PROMPTS_FILE, &prompts)?;
            info!("Created prompt {}", prompt.id);
            Ok(prompt)
        })
    }

    fn update_blocking(&self, id: &str, patch: PromptPatch) -> Result<Prompt, StoreError> {
        self.with_lock(|| {
            let mut prompts: Vec<Prompt> = self.read_collection(PROMPTS_FILE)?;
            let prompt = prompts
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| StoreError::MissingPrompt(id.to_string()))?;

            if patch.apply_to(prompt) {
                prompt.updated_at = Some(now_timestamp());
            }
            let updated = prompt.clone();
            self.write_collection(PROMPTS_FILE, &prompts)?;
            info!("Updated prompt {}", id);
            Ok(updated)
        })
    }

    /// Run a blocking store operation off the async executor
    async fn blocking<R, F>(&self, f: F) -> Result<R, AppError>
    where
        R: Send + 'static,
        F: FnOnce(JsonFileStore) -> Result<R, StoreError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(store))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
            .map_err(AppError::from)
    }
}

impl PromptStore for JsonFileStore {
    async fn list(&self) -> Result<Vec<Prompt>, AppError> {
        let prompts: Vec<Prompt> = self.blocking(|store| store.read_collection(PROMPTS_FILE)).await?;
        debug!("Loaded {} prompts from {}", prompts.len(), self.data_dir.display());
        Ok(prompts)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Prompt>, AppError> {
        validate_prompt_id(id)?;
        let prompts = self.list().await?;
        Ok(prompts.into_iter().find(|p| p.id == id))
    }

    async fn create(&self, draft: PromptDraft) -> Result<Prompt, AppError> {
        if draft.title.trim().is_empty() {
            return Err(AppError::InvalidInput("Prompt title cannot be empty".to_string()));
        }
        self.blocking(move |store| store.create_blocking(draft)).await
    }

    async fn update(&self, id: &str, patch: PromptPatch) -> Result<Prompt, AppError> {
        validate_prompt_id(id)?;
        let id = id.to_string();
        self.blocking(move |store| store.update_blocking(&id, patch)).await
    }
}

impl CatalogProvider for JsonFileStore {
    async fn categories(&self) -> Result<Vec<Category>, AppError> {
        self.blocking(|store| store.read_collection(CATEGORIES_FILE)).await
    }

    async fn tags(&self) -> Result<Vec<Tag>, AppError> {
        self.blocking(|store| store.read_collection(TAGS_FILE)).await
    }
}

/// Volatile store backed by vectors, for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    prompts: Mutex<Vec<Prompt>>,
    categories: Vec<Category>,
    tags: Vec<Tag>,
}

impl MemoryStore {
    pub fn new(prompts: Vec<Prompt>) -> Self {
        Self {
            prompts: Mutex::new(prompts),
            ..Default::default()
        }
    }

    pub fn with_catalog(mut self, categories: Vec<Category>, tags: Vec<Tag>) -> Self {
        self.categories = categories;
        self.tags = tags;
        self
    }
}

impl PromptStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Prompt>, AppError> {
        Ok(self.prompts.lock().await.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Prompt>, AppError> {
        Ok(self.prompts.lock().await.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, draft: PromptDraft) -> Result<Prompt, AppError> {
        let mut prompts = self.prompts.lock().await;
        let prompt = draft_into_prompt(draft, next_prompt_id(&prompts));
        prompts.push(prompt.clone());
        Ok(prompt)
    }

    async fn update(&self, id: &str, patch: PromptPatch) -> Result<Prompt, AppError> {
        let mut prompts = self.prompts.lock().await;
        let prompt = prompts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("prompt {}", id)))?;
        if patch.apply_to(prompt) {
            prompt.updated_at = Some(now_timestamp());
        }
        Ok(prompt.clone())
    }
}

impl CatalogProvider for MemoryStore {
    async fn categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.categories.clone())
    }

    async fn tags(&self) -> Result<Vec<Tag>, AppError> {
        Ok(self.tags.clone())
    }
}
