//! Test doubles shared by unit tests

use crate::render::{PageRenderer, RenderRequest};
use crate::storage::{StorageResult, StrategyCache};
use crate::CrawlError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Renderer that serves scripted anchor lists and records every call
///
/// URLs without a script render as an empty page.
#[derive(Default)]
pub struct ScriptedRenderer {
    pages: Mutex<HashMap<String, Vec<String>>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, url: &str, anchors: &[&str]) {
        self.pages.lock().unwrap().insert(
            url.to_string(),
            anchors.iter().map(|a| a.to_string()).collect(),
        );
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PageRenderer for ScriptedRenderer {
    async fn render_anchors(&self, request: &RenderRequest) -> crate::Result<Vec<String>> {
        self.calls.lock().unwrap().push(request.url.clone());
        tokio::task::yield_now().await;

        if self.failing.lock().unwrap().contains(&request.url) {
            return Err(CrawlError::render(&request.url, "automation blocked"));
        }
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory strategy decisions
#[derive(Default)]
pub struct MemoryStrategyCache {
    decisions: Mutex<HashMap<String, bool>>,
}

impl StrategyCache for MemoryStrategyCache {
    fn get(&self, domain: &str) -> StorageResult<Option<bool>> {
        Ok(self.decisions.lock().unwrap().get(domain).copied())
    }

    fn get_or_insert(&self, domain: &str, primary_effective: bool) -> StorageResult<bool> {
        Ok(*self
            .decisions
            .lock()
            .unwrap()
            .entry(domain.to_string())
            .or_insert(primary_effective))
    }
}
