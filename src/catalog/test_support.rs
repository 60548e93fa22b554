//! Scripted descriptor source shared by catalog and service tests.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use super::{error::SourceError, source::DescriptorSource, types::ModelDescriptor};

/// `m1` needs an openai key, `m2` is open to everyone.
pub(crate) fn two_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new("m1", "openai", "Model One", false),
        ModelDescriptor::new("m2", "local", "Model Two", true),
    ]
}

pub(crate) fn three_models() -> Vec<ModelDescriptor> {
    let mut models = two_models();
    models.push(ModelDescriptor::new("m3", "anthropic", "Model Three", false));
    models
}

/// Counts fetches and answers with whatever was scripted at call time.
///
/// A gated source parks every fetch until a permit is added to the gate (each fetch
/// consumes one), which lets tests pile up concurrent callers behind one build.
pub(crate) struct ScriptedSource {
    response: Mutex<Result<Vec<ModelDescriptor>, SourceError>>,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedSource {
    pub(crate) fn new(models: Vec<ModelDescriptor>) -> Self {
        Self {
            response: Mutex::new(Ok(models)),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub(crate) fn gated(models: Vec<ModelDescriptor>) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let source = Self {
            gate: Some(gate.clone()),
            ..Self::new(models)
        };
        (source, gate)
    }

    pub(crate) fn set_models(&self, models: Vec<ModelDescriptor>) {
        *self.response.lock() = Ok(models);
    }

    pub(crate) fn fail_with(&self, error: SourceError) {
        *self.response.lock() = Err(error);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DescriptorSource for ScriptedSource {
    async fn fetch_all(&self) -> Result<Vec<ModelDescriptor>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.response.lock().clone();

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        response
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Yield until the source has been hit `n` times.
pub(crate) async fn wait_for_calls(source: &ScriptedSource, n: usize) {
    while source.calls() < n {
        tokio::task::yield_now().await;
    }
}
