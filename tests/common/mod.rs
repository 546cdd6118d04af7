#![allow(dead_code)]
//! Shared fakes for the integration suites.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use feedwatch::{Article, FetchAdapter, FetchError, RawEntry, Source, Subscriber};

/// Fixed UTC timestamp on day `day` of March 2025.
pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, 0, 0, 0).unwrap()
}

pub fn entry(uri: &str, title: &str, day: u32) -> RawEntry {
    RawEntry::new(uri, title, at(day))
}

/// A fetch adapter whose per-source responses can be swapped between cycles.
///
/// Sources with no script fail with a 503.
#[derive(Default)]
pub struct ScriptedFetcher {
    script: Mutex<HashMap<String, Option<Vec<RawEntry>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve(&self, source: &str, entries: Vec<RawEntry>) {
        self.script.lock().unwrap().insert(source.to_string(), Some(entries));
    }

    pub fn fail(&self, source: &str) {
        self.script.lock().unwrap().insert(source.to_string(), None);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FetchAdapter for ScriptedFetcher {
    async fn fetch(&self, source: &Source) -> Result<Vec<RawEntry>, FetchError> {
        self.calls.lock().unwrap().push(source.name.clone());
        match self.script.lock().unwrap().get(&source.name) {
            Some(Some(entries)) => Ok(entries.clone()),
            _ => Err(FetchError::Status(503)),
        }
    }
}

/// Records every delivery it receives.
#[derive(Default)]
pub struct Recorder {
    deliveries: Mutex<Vec<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Article identities per delivery, in delivery order.
    pub fn deliveries(&self) -> Vec<Vec<String>> {
        self.deliveries.lock().unwrap().clone()
    }
}

impl Subscriber for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn on_new_items(&self, articles: &[Article]) -> anyhow::Result<()> {
        self.deliveries
            .lock()
            .unwrap()
            .push(articles.iter().map(|a| a.uri.clone()).collect());
        Ok(())
    }
}
