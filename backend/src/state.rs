use crate::config::Config;
use crate::error::StoreError;
use crate::models::{Paper, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::{fs, path::Path};
use tokio::sync::RwLock;
use tracing::{info, warn};

pub struct InMemoryDb {
    pub papers: RwLock<HashMap<i64, Paper>>,
    pub responses: RwLock<HashMap<i64, Response>>,
    next_paper_id: AtomicI64,
    next_response_id: AtomicI64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistentSnapshot {
    papers: HashMap<i64, Paper>,
    responses: HashMap<i64, Response>,
    next_paper_id: i64,
    next_response_id: i64,
}

impl InMemoryDb {
    pub fn new(snapshot_path: Option<&str>) -> Self {
        let snapshot = snapshot_path.and_then(|path| {
            let raw = fs::read_to_string(path).ok()?;
            match serde_json::from_str::<PersistentSnapshot>(&raw) {
                Ok(s) => Some(s),
                Err(err) => {
                    warn!("failed to read local snapshot {}: {}", path, err);
                    None
                }
            }
        });

        let (papers, responses, next_paper_id, next_response_id) = match snapshot {
            Some(s) => {
                info!(papers = s.papers.len(), responses = s.responses.len(), "local snapshot loaded");
                (s.papers, s.responses, s.next_paper_id, s.next_response_id)
            }
            None => (HashMap::new(), HashMap::new(), 1, 1),
        };
        let next_paper_id = next_paper_id.max(papers.keys().max().copied().unwrap_or(0) + 1);
        let next_response_id = next_response_id.max(responses.keys().max().copied().unwrap_or(0) + 1);

        Self {
            papers: RwLock::new(papers),
            responses: RwLock::new(responses),
            next_paper_id: AtomicI64::new(next_paper_id),
            next_response_id: AtomicI64::new(next_response_id),
        }
    }

    fn next_paper_id(&self) -> i64 {
        self.next_paper_id.fetch_add(1, Ordering::SeqCst)
    }

    fn next_response_id(&self) -> i64 {
        self.next_response_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn snapshot(&self) -> PersistentSnapshot {
        PersistentSnapshot {
            papers: self.papers.read().await.clone(),
            responses: self.responses.read().await.clone(),
            next_paper_id: self.next_paper_id.load(Ordering::SeqCst),
            next_response_id: self.next_response_id.load(Ordering::SeqCst),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<InMemoryDb>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            db: Arc::new(InMemoryDb::new(config.local_state_path.as_deref())),
            config: Arc::new(config),
        }
    }

    pub async fn create_paper(&self, mut paper: Paper) -> i64 {
        let id = self.db.next_paper_id();
        paper.id = id;
        self.db.papers.write().await.insert(id, paper);
        if let Err(err) = self.persist_core_data().await {
            warn!("failed to persist local state after create_paper: {}", err);
        }
        id
    }

    pub async fn paper(&self, id: i64) -> Result<Paper, StoreError> {
        self.db
            .papers
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::PaperNotFound(id))
    }

    pub async fn submit_response(&self, paper_id: i64, mut response: Response) -> Result<i64, StoreError> {
        if !self.db.papers.read().await.contains_key(&paper_id) {
            return Err(StoreError::PaperNotFound(paper_id));
        }
        let id = self.db.next_response_id();
        response.id = id;
        response.paper_id = paper_id;
        response.submitted_at.get_or_insert_with(Utc::now);
        self.db.responses.write().await.insert(id, response);
        if let Err(err) = self.persist_core_data().await {
            warn!("failed to persist local state after submit_response: {}", err);
        }
        Ok(id)
    }

    pub async fn response(&self, id: i64) -> Result<Response, StoreError> {
        self.db
            .responses
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::ResponseNotFound(id))
    }

    /// Responses of one paper, oldest id first.
    pub async fn responses_for_paper(&self, paper_id: i64) -> Vec<Response> {
        let mut items: Vec<Response> = self
            .db
            .responses
            .read()
            .await
            .values()
            .filter(|r| r.paper_id == paper_id)
            .cloned()
            .collect();
        items.sort_by_key(|r| r.id);
        items
    }

    pub async fn persist_core_data(&self) -> anyhow::Result<()> {
        let Some(path) = self.config.local_state_path.as_ref() else {
            return Ok(());
        };
        let snapshot = self.db.snapshot().await;
        let serialized = serde_json::to_vec_pretty(&snapshot)?;
        if let Some(parent) = Path::new(path).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, serialized).await?;
        Ok(())
    }
}
