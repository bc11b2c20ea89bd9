//! Scripted in-memory engine for unit tests

use crate::engine::{Engine, GotoOptions, Session, WaitUntil};
use crate::{NavigationError, ScottyError};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct Script {
    pages: HashMap<String, String>,
    failures: HashMap<String, VecDeque<NavigationError>>,
    gotos: Vec<(String, WaitUntil)>,
    launches: usize,
    closes: usize,
}

/// Engine serving canned pages, with scripted navigation failures
#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    script: Arc<Mutex<Script>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `html` for `url`
    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), html.to_string());
        self
    }

    /// Makes the next `goto(url)` fail with `error`; calls queue up
    pub fn fail_next(self, url: &str, error: NavigationError) -> Self {
        self.script
            .lock()
            .unwrap()
            .failures
            .entry(url.to_string())
            .or_default()
            .push_back(error);
        self
    }

    /// Every `goto` issued so far, with its wait condition
    pub fn gotos(&self) -> Vec<(String, WaitUntil)> {
        self.script.lock().unwrap().gotos.clone()
    }

    pub fn launches(&self) -> usize {
        self.script.lock().unwrap().launches
    }

    pub fn closes(&self) -> usize {
        self.script.lock().unwrap().closes
    }
}

#[async_trait]
impl Engine for ScriptedEngine {
    async fn launch(&self) -> Result<Box<dyn Session>, ScottyError> {
        self.script.lock().unwrap().launches += 1;
        Ok(Box::new(ScriptedSession {
            script: Arc::clone(&self.script),
            current: None,
        }))
    }
}

pub struct ScriptedSession {
    script: Arc<Mutex<Script>>,
    current: Option<String>,
}

#[async_trait]
impl Session for ScriptedSession {
    async fn goto(&mut self, url: &str, options: GotoOptions) -> Result<(), NavigationError> {
        self.current = None;
        let mut script = self.script.lock().unwrap();
        script.gotos.push((url.to_string(), options.wait_until));

        if let Some(error) = script.failures.get_mut(url).and_then(VecDeque::pop_front) {
            return Err(error);
        }

        match script.pages.get(url) {
            Some(html) => {
                self.current = Some(html.clone());
                Ok(())
            }
            None => Err(NavigationError::Other("HTTP 404".to_string())),
        }
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<(), NavigationError> {
        let parsed = Selector::parse(selector)
            .map_err(|e| NavigationError::Other(format!("{:?}", e)))?;
        let found = self
            .current
            .as_deref()
            .map(|html| Html::parse_document(html).select(&parsed).next().is_some())
            .unwrap_or(false);
        if found {
            Ok(())
        } else {
            Err(NavigationError::SelectorTimeout(selector.to_string()))
        }
    }

    fn content(&self) -> Option<&str> {
        self.current.as_deref()
    }

    async fn close(&mut self) {
        self.script.lock().unwrap().closes += 1;
    }
}
