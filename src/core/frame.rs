//! Hierarchical variable scopes for task execution.
//!
//! Every task invocation gets its own [`Frame`], enclosed in the frame of its
//! caller. Variable lookups see, from lowest to highest precedence:
//!
//! 1. the process environment snapshot, when the frame inherits it,
//! 2. the merged view of the enclosing frame,
//! 3. the frame's own variables.
//!
//! The merged view is computed lazily and cached until the frame is mutated.

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::expand;

/// Variables keyed by name, ordered for stable `NAME=VALUE` listings.
pub type Vars = BTreeMap<String, String>;

/// Prefix of the variables published by the runner itself.
pub const IDENTIFIER_PREFIX: &str = "RUNBOOK_";

/// Name of a runner-published variable.
pub fn prefixed(name: &str) -> String {
    format!("{}{}", IDENTIFIER_PREFIX, name)
}

static OS_ENVIRON: OnceCell<Arc<Vars>> = OnceCell::new();

/// The process environment, captured once on first use.
///
/// Later changes to the process environment are not observed.
pub fn os_environ() -> Arc<Vars> {
    OS_ENVIRON
        .get_or_init(|| {
            Arc::new(
                std::env::vars_os()
                    .map(|(k, v)| {
                        (
                            k.to_string_lossy().into_owned(),
                            v.to_string_lossy().into_owned(),
                        )
                    })
                    .collect(),
            )
        })
        .clone()
}

#[derive(Debug, Default)]
struct FrameState {
    vars: Vars,
    environ: Option<Arc<Vars>>,
    merged: Option<Arc<Vars>>,
}

/// A task invocation's variable scope.
#[derive(Debug, Default)]
pub struct Frame {
    enclosing: Option<Arc<Frame>>,
    state: Mutex<FrameState>,
}

impl Frame {
    /// Create an empty top-level frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty frame enclosed in `enclosing`.
    pub fn enclosed(enclosing: Arc<Frame>) -> Self {
        Self {
            enclosing: Some(enclosing),
            state: Mutex::default(),
        }
    }

    /// The enclosing frame, if any.
    pub fn enclosing(&self) -> Option<&Arc<Frame>> {
        self.enclosing.as_ref()
    }

    /// Set a variable.
    pub fn set_var(&self, name: impl Into<String>, value: impl Into<String>) {
        let mut state = self.state.lock();
        state.vars.insert(name.into(), value.into());
        state.merged = None;
    }

    /// Set a runner-published variable (`RUNBOOK_<name>`).
    pub fn set_prefixed_var(&self, name: &str, value: impl Into<String>) {
        self.set_var(prefixed(name), value);
    }

    /// Set many variables at once.
    pub fn set_vars<I, K, V>(&self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut state = self.state.lock();
        state
            .vars
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        state.merged = None;
    }

    /// Make the process environment visible from this frame.
    pub fn inherit_environ(&self) {
        let environ = os_environ();
        let mut state = self.state.lock();
        state.environ = Some(environ);
        state.merged = None;
    }

    /// All variables visible from this frame.
    pub fn merge(&self) -> Arc<Vars> {
        let mut state = self.state.lock();

        if let Some(merged) = &state.merged {
            return Arc::clone(merged);
        }

        let mut merged = Vars::new();
        if let Some(environ) = &state.environ {
            merged.extend(environ.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(enclosing) = &self.enclosing {
            let parent = enclosing.merge();
            merged.extend(parent.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged.extend(state.vars.iter().map(|(k, v)| (k.clone(), v.clone())));

        let merged = Arc::new(merged);
        state.merged = Some(Arc::clone(&merged));
        merged
    }

    /// Look a visible variable up.
    pub fn get(&self, name: &str) -> Option<String> {
        self.merge().get(name).cloned()
    }

    /// Visible variables as `NAME=VALUE` strings, ordered by name.
    pub fn env_list(&self) -> Vec<String> {
        self.merge()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect()
    }

    /// Lookup function for `$(name)` expansion.
    ///
    /// Unknown names expand to themselves, `$(name)`.
    pub fn expand_mapping(&self) -> impl Fn(&str) -> String + use<> {
        let merged = self.merge();
        move |name| match merged.get(name) {
            Some(value) => value.clone(),
            None => format!("$({})", name),
        }
    }

    /// Expand every `$(name)` reference in `input` against this frame.
    pub fn expand(&self, input: &str) -> String {
        expand::expand(input, self.expand_mapping())
    }
}
