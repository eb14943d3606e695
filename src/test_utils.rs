//! Test utilities for route enrichment
//!
//! Provides a scripted in-memory page fetcher and HTML fixture builders so
//! resolver and pipeline tests run without a network and can count every
//! fetch they trigger.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::infrastructure::errors::FetchError;
use crate::infrastructure::page_fetcher::{Document, FetchOutcome, PageFetcher};

pub const ROOT: &str = "https://www.mountainproject.com";

/// Absolute URL under the test root
pub fn url(path: &str) -> String {
    format!("{ROOT}{path}")
}

/// Route detail page with an optional first ascent and parent area link
pub fn route_page(first_ascent: Option<&str>, parent_path: Option<&str>) -> String {
    page(first_ascent.map(|fa| ("FA:&nbsp;", fa)), parent_path)
}

/// Area page with an optional location value and parent area link
pub fn area_page(location: Option<&str>, parent_path: Option<&str>) -> String {
    page(location.map(|text| ("Location:&nbsp;", text)), parent_path)
}

fn page(row: Option<(&str, &str)>, parent_path: Option<&str>) -> String {
    let up = parent_path
        .map(|path| {
            format!(r#"<a href="{path}"><img src="https://cdn.apstatic.com/mp-img/up.gif"></a>"#)
        })
        .unwrap_or_default();
    let row = row
        .map(|(label, value)| format!("<tr><td>{label}</td><td>{value}</td></tr>"))
        .unwrap_or_default();

    format!("<html><body>{up}<table><tr><td>Page</td><td>fixture</td></tr>{row}</table></body></html>")
}

/// Fetcher that replays scripted responses per URL.
///
/// Each URL holds a queue of responses; the last one repeats forever.
/// Unknown URLs answer 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, VecDeque<Result<String, u16>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(self, url: &str, responses: impl IntoIterator<Item = Result<String, u16>>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), responses.into_iter().collect());
        self
    }

    /// Always serve `body`
    pub fn page(self, url: &str, body: impl Into<String>) -> Self {
        self.script(url, [Ok(body.into())])
    }

    /// Always answer with `status`
    pub fn failing(self, url: &str, status: u16) -> Self {
        self.script(url, [Err(status)])
    }

    /// Fail `failures` times, then serve `body`
    pub fn flaky(self, url: &str, failures: usize, body: impl Into<String>) -> Self {
        let responses = std::iter::repeat_n(Err(503), failures).chain([Ok(body.into())]);
        self.script(url, responses)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|call| *call == url).count()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.calls.lock().unwrap().push(url.to_string());

        let response = {
            let mut responses = self.responses.lock().unwrap();
            match responses.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match response {
            Some(Ok(body)) => FetchOutcome::Ok(Document::new(url, body)),
            Some(Err(status)) => FetchOutcome::Failed(FetchError::Status {
                status,
                url: url.to_string(),
            }),
            None => FetchOutcome::Failed(FetchError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}
