#![allow(dead_code)]

use kiln_cache::{CacheStore, MemoryBackend};
use kiln_core::BuildInvocationId;
use kiln_execution::{
    ExecutionEngine, ExecutionHistoryStore, InMemoryHistory, InputSet, InputValue,
    OutputLocation, UnitOfWork, WorkContext,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type Action = dyn Fn(&Path, &WorkContext<'_>, usize) -> anyhow::Result<bool> + Send + Sync;

/// A compile-like unit writing one output file
pub struct TestUnit {
    pub name: String,
    pub inputs: InputSet,
    pub output: PathBuf,
    action: Box<Action>,
    runs: AtomicUsize,
}

impl TestUnit {
    /// `compile(src=...)` writing `compiled: <src>` to `<dir>/out/main.o`
    pub fn compile(dir: &Path, src: &str) -> Self {
        let content = format!("compiled: {src}");
        Self::with_action(dir, src, move |output, _, _| {
            write_output(output, content.as_bytes())?;
            Ok(true)
        })
    }

    pub fn with_action<F>(dir: &Path, src: &str, action: F) -> Self
    where
        F: Fn(&Path, &WorkContext<'_>, usize) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        let mut inputs = InputSet::new();
        inputs.insert("src".to_string(), InputValue::from(src));
        Self {
            name: "compile :app".to_string(),
            inputs,
            output: dir.join("out").join("main.o"),
            action: Box::new(action),
            runs: AtomicUsize::new(0),
        }
    }

    pub fn with_input(mut self, name: &str, value: InputValue) -> Self {
        self.inputs.insert(name.to_string(), value);
        self
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn output_content(&self) -> Option<String> {
        fs::read_to_string(&self.output).ok()
    }
}

impl UnitOfWork for TestUnit {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn work_type(&self) -> &str {
        "compile"
    }

    fn declare_inputs(&self) -> InputSet {
        self.inputs.clone()
    }

    fn declare_outputs(&self) -> Vec<OutputLocation> {
        vec![OutputLocation::new("object", &self.output)]
    }

    fn execute(&self, ctx: &WorkContext<'_>) -> anyhow::Result<bool> {
        let run = self.runs.fetch_add(1, Ordering::SeqCst);
        (self.action)(&self.output, ctx, run)
    }
}

pub fn write_output(path: &Path, content: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

pub fn memory_cache() -> Arc<CacheStore> {
    Arc::new(CacheStore::new(Arc::new(MemoryBackend::new())))
}

pub fn engine(cache: &Arc<CacheStore>, history: &Arc<InMemoryHistory>) -> ExecutionEngine {
    ExecutionEngine::builder(BuildInvocationId::generate())
        .cache(cache.clone())
        .history(history.clone() as Arc<dyn ExecutionHistoryStore>)
        .build()
}
