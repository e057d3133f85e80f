//! Named output surfaces.
//!
//! A host registers the surfaces it can display under stable identifiers.
//! The controller looks its target up once, at start; absence is not an
//! error and only means renders are skipped.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::error::{CoreError, Result};

/// Identifier the countdown renders into unless configured otherwise.
pub const DEFAULT_TARGET_ID: &str = "timer";

/// A display surface whose visible text can be overwritten.
pub trait OutputTarget: Send + Sync {
    /// Replace the visible text.
    fn set_text(&self, text: &str) -> Result<()>;
}

/// Surfaces available to the controller, keyed by identifier.
#[derive(Default, Clone)]
pub struct SurfaceRegistry {
    surfaces: HashMap<String, Arc<dyn OutputTarget>>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `target` under `id`, replacing any previous surface.
    pub fn register(&mut self, id: impl Into<String>, target: Arc<dyn OutputTarget>) {
        self.surfaces.insert(id.into(), target);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn OutputTarget>> {
        self.surfaces.get(id).cloned()
    }

    pub fn remove(&mut self, id: &str) -> Option<Arc<dyn OutputTarget>> {
        self.surfaces.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.surfaces.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

impl std::fmt::Debug for SurfaceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&String> = self.surfaces.keys().collect();
        ids.sort();
        f.debug_struct("SurfaceRegistry").field("ids", &ids).finish()
    }
}

/// Writes to stdout.
///
/// In overwrite mode each render returns the cursor to the start of the
/// line, so the terminal shows a single updating `MM:SS`.
#[derive(Debug)]
pub struct TerminalTarget {
    overwrite_line: bool,
    // Serializes writes from overlapping tickers.
    lock: Mutex<()>,
}

impl TerminalTarget {
    pub fn new(overwrite_line: bool) -> Self {
        Self {
            overwrite_line,
            lock: Mutex::new(()),
        }
    }
}

impl OutputTarget for TerminalTarget {
    fn set_text(&self, text: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| CoreError::Custom("terminal lock poisoned".into()))?;
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        if self.overwrite_line {
            write!(out, "\r{text}")?;
        } else {
            writeln!(out, "{text}")?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Keeps every render in memory.
#[derive(Debug, Default)]
pub struct MemoryTarget {
    renders: Mutex<Vec<String>>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// All renders so far, oldest first.
    pub fn renders(&self) -> Vec<String> {
        self.renders
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// The currently visible text.
    pub fn text(&self) -> Option<String> {
        self.renders.lock().ok().and_then(|r| r.last().cloned())
    }
}

impl OutputTarget for MemoryTarget {
    fn set_text(&self, text: &str) -> Result<()> {
        self.renders
            .lock()
            .map_err(|_| CoreError::Custom("memory target lock poisoned".into()))?
            .push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_by_id() {
        let mut registry = SurfaceRegistry::new();
        assert!(registry.get(DEFAULT_TARGET_ID).is_none());

        let target = Arc::new(MemoryTarget::new());
        registry.register(DEFAULT_TARGET_ID, target.clone());
        assert!(registry.contains("timer"));
        assert_eq!(registry.len(), 1);

        registry.get("timer").unwrap().set_text("12:34").unwrap();
        assert_eq!(target.text().as_deref(), Some("12:34"));

        assert!(registry.remove("timer").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn memory_target_keeps_history() {
        let target = MemoryTarget::new();
        assert!(target.text().is_none());
        target.set_text("00:02").unwrap();
        target.set_text("00:01").unwrap();
        assert_eq!(target.renders(), vec!["00:02", "00:01"]);
        assert_eq!(target.text().as_deref(), Some("00:01"));
    }

    #[test]
    fn debug_lists_ids() {
        let mut registry = SurfaceRegistry::new();
        registry.register("b", Arc::new(MemoryTarget::new()));
        registry.register("a", Arc::new(MemoryTarget::new()));
        assert_eq!(format!("{registry:?}"), r#"SurfaceRegistry { ids: ["a", "b"] }"#);
    }
}
