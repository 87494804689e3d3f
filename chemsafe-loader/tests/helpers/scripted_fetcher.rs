//! Fetcher returning canned responses
//!
//! Every requested URI is recorded, so tests can assert exactly which
//! network calls a resolution made (or that it made none). Responses can be
//! delayed to interleave concurrent resolutions.

use async_trait::async_trait;
use chemsafe_loader::fetch::Fetcher;
use chemsafe_loader::{LoaderError, LoaderResult};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, String>>,
    fragment_responses: Mutex<Vec<(String, String)>>,
    delays: Mutex<Vec<(String, Duration)>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to exactly this URI
    pub fn respond(self, uri: &str, body: &str) -> Self {
        self.responses.lock().unwrap().insert(uri.to_string(), body.to_string());
        self
    }

    /// Respond to any URI containing this fragment (first registered wins)
    pub fn respond_containing(self, fragment: &str, body: &str) -> Self {
        self.fragment_responses
            .lock()
            .unwrap()
            .push((fragment.to_string(), body.to_string()));
        self
    }

    /// Answer any URI containing this fragment only after a pause
    pub fn delay_containing(self, fragment: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().push((fragment.to_string(), delay));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, uri: &str) -> LoaderResult<String> {
        self.calls.lock().unwrap().push(uri.to_string());

        let delay = self
            .delays
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| uri.contains(fragment.as_str()))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(body) = self.responses.lock().unwrap().get(uri) {
            return Ok(body.clone());
        }
        let matched = self
            .fragment_responses
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| uri.contains(fragment.as_str()))
            .map(|(_, body)| body.clone());

        matched.ok_or_else(|| LoaderError::Fetch {
            uri: uri.to_string(),
            reason: "no scripted response".to_string(),
        })
    }
}
