//! Scheme registry: version lookup plus registration order.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::scheme::{SchemeRef, SignatureScheme, SignatureSchemeV1};

/// Maps scheme versions to schemes and remembers registration order.
///
/// Built once at startup and shared read-only afterwards. Later registrations
/// are preferred: [`SchemeRegistry::current`] returns the last one.
#[derive(Clone)]
pub struct SchemeRegistry {
    by_version: HashMap<i64, SchemeRef>,
    all: Vec<SchemeRef>,
}

impl SchemeRegistry {
    /// A registry with no schemes at all.
    pub fn empty() -> Self {
        Self {
            by_version: HashMap::new(),
            all: Vec::new(),
        }
    }

    /// The process-wide registry of built-in schemes.
    pub fn builtin() -> &'static SchemeRegistry {
        static BUILTIN: OnceLock<SchemeRegistry> = OnceLock::new();
        BUILTIN.get_or_init(SchemeRegistry::default)
    }

    /// Register a scheme.
    ///
    /// Registering a version twice replaces the lookup entry but keeps both in
    /// [`SchemeRegistry::all`]; callers must not do that.
    pub fn register(&mut self, scheme: impl SignatureScheme + 'static) -> &mut Self {
        self.register_shared(Arc::new(scheme))
    }

    /// Register an already shared scheme handle.
    pub fn register_shared(&mut self, scheme: SchemeRef) -> &mut Self {
        let version = scheme.version();
        if self.by_version.contains_key(&version) {
            tracing::warn!(version, "signature scheme version registered twice");
        }
        self.by_version.insert(version, Arc::clone(&scheme));
        self.all.push(scheme);
        self
    }

    /// Builder-style [`SchemeRegistry::register`].
    pub fn with(mut self, scheme: impl SignatureScheme + 'static) -> Self {
        self.register(scheme);
        self
    }

    pub fn lookup(&self, version: i64) -> Option<SchemeRef> {
        self.by_version.get(&version).cloned()
    }

    /// All schemes in registration order.
    pub fn all(&self) -> &[SchemeRef] {
        &self.all
    }

    /// The preferred scheme for new signatures (latest registered).
    pub fn current(&self) -> Option<SchemeRef> {
        self.all.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

impl Default for SchemeRegistry {
    /// The built-in schemes, oldest first.
    fn default() -> Self {
        SchemeRegistry::empty().with(SignatureSchemeV1)
    }
}

impl fmt::Debug for SchemeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.all.iter().map(|s| s.version()))
            .finish()
    }
}
