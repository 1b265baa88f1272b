//! Search service
//!
//! Owns everything a search session needs: the prompt store, the engine with its
//! result cache, the registry of in-flight loads and the stale-response guard.
//! Each service is constructed explicitly; nothing is shared between instances.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::error::AppError;
use crate::models::{Category, Prompt, PromptDraft, PromptPatch, Tag};
use crate::requests::{RequestDeduplicator, RequestSequencer};
use crate::search::{SearchEngine, SearchOptions, SearchOutcome};
use crate::store::{CatalogProvider, PromptStore};

const PROMPT_LIST_KEY: &str = "prompts";

type PromptList = Arc<Vec<Prompt>>;

pub struct SearchService<S> {
    store: Arc<S>,
    engine: Mutex<SearchEngine>,
    prompts: RwLock<PromptList>,
    loads: RequestDeduplicator<&'static str, Result<PromptList, AppError>>,
    sequencer: RequestSequencer,
}

impl<S: PromptStore + 'static> SearchService<S> {
    pub fn init(store: S, config: SearchConfig) -> Self {
        Self::with_engine(store, SearchEngine::init(config))
    }

    /// Build around a preconfigured engine (custom analytics sink, for instance)
    pub fn with_engine(store: S, engine: SearchEngine) -> Self {
        Self {
            store: Arc::new(store),
            engine: Mutex::new(engine),
            prompts: RwLock::new(Arc::new(Vec::new())),
            loads: RequestDeduplicator::new(),
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Refresh the prompt snapshot from the store
    ///
    /// Concurrent calls share one store read. A failed read is logged and yields
    /// an empty list; the previous snapshot stays in place.
    pub async fn load_prompts(&self) -> PromptList {
        let store = Arc::clone(&self.store);
        let loaded = self
            .loads
            .run(PROMPT_LIST_KEY, move || async move {
                store.list().await.map(Arc::new)
            })
            .await;

        match loaded {
            Ok(prompts) => {
                let mut current = self.prompts.write().await;
                if **current != *prompts {
                    // Cache keys do not cover the collection itself
                    self.engine.lock().await.clear_cache();
                    debug!("Prompt collection changed, result cache cleared");
                }
                *current = Arc::clone(&prompts);
                prompts
            }
            Err(e) => {
                warn!("Failed to load prompts: {}", e);
                Arc::new(Vec::new())
            }
        }
    }

    /// Current snapshot without touching the store
    pub async fn prompts(&self) -> PromptList {
        Arc::clone(&*self.prompts.read().await)
    }

    /// Search the current snapshot
    pub async fn search(&self, query: &str, options: &SearchOptions) -> SearchOutcome {
        let prompts = self.prompts().await;
        self.engine.lock().await.search(&prompts, query, options)
    }

    /// Reload and search, yielding `None` when a newer call started meanwhile
    pub async fn search_latest(&self, query: &str, options: &SearchOptions) -> Option<SearchOutcome> {
        let token = self.sequencer.issue();
        self.load_prompts().await;
        let outcome = self.search(query, options).await;
        self.sequencer.apply_if_current(token, || outcome)
    }

    /// Look up one prompt; store failures read as absent
    pub async fn prompt(&self, id: &str) -> Option<Prompt> {
        match self.store.get_by_id(id).await {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("Failed to fetch prompt {}: {}", id, e);
                None
            }
        }
    }

    pub async fn create_prompt(&self, draft: PromptDraft) -> Result<Prompt, AppError> {
        let prompt = self.store.create(draft).await?;
        self.load_prompts().await;
        Ok(prompt)
    }

    pub async fn update_prompt(&self, id: &str, patch: PromptPatch) -> Result<Prompt, AppError> {
        let prompt = self.store.update(id, patch).await?;
        self.load_prompts().await;
        Ok(prompt)
    }

    pub async fn config(&self) -> SearchConfig {
        self.engine.lock().await.config().clone()
    }

    /// Drop cached results and the prompt snapshot
    pub async fn dispose(&self) {
        self.engine.lock().await.dispose();
        *self.prompts.write().await = Arc::new(Vec::new());
        info!("Search service disposed");
    }
}

impl<S: PromptStore + CatalogProvider + 'static> SearchService<S> {
    /// Known categories; store failures read as none
    pub async fn categories(&self) -> Vec<Category> {
        self.store.categories().await.unwrap_or_else(|e| {
            warn!("Failed to load categories: {}", e);
            Vec::new()
        })
    }

    /// Known tags; store failures read as none
    pub async fn tags(&self) -> Vec<Tag> {
        self.store.tags().await.unwrap_or_else(|e| {
            warn!("Failed to load tags: {}", e);
            Vec::new()
        })
    }
}
