use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::scheme::SignatureScheme;

/// Default maximum signature age (3 minutes).
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(3 * 60);

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Options for verifying signature packages.
#[derive(Clone, Default)]
pub struct VerificationOptions {
    /// Maximum allowed signature age. Unset or zero means [`DEFAULT_TOLERANCE`].
    pub tolerance: Option<Duration>,
    /// Skip the signature age check entirely.
    pub ignore_tolerance: bool,
    now: Option<Clock>,
    untrusted_schemes: BTreeSet<i64>,
}

impl VerificationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn ignore_tolerance(mut self) -> Self {
        self.ignore_tolerance = true;
        self
    }

    /// Override the clock used for the age check.
    pub fn with_now<F>(mut self, now: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.now = Some(Arc::new(now));
        self
    }

    /// Pin the clock to a fixed instant.
    pub fn at(self, now: DateTime<Utc>) -> Self {
        self.with_now(move || now)
    }

    /// Ignore signatures produced by `scheme` (matched by version).
    pub fn untrust(mut self, scheme: &dyn SignatureScheme) -> Self {
        self.untrusted_schemes.insert(scheme.version());
        self
    }

    pub fn untrust_version(mut self, version: i64) -> Self {
        self.untrusted_schemes.insert(version);
        self
    }

    pub fn untrust_all<'a, I>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = &'a Arc<dyn SignatureScheme>>,
    {
        self.untrusted_schemes
            .extend(schemes.into_iter().map(|s| s.version()));
        self
    }

    pub fn is_untrusted(&self, version: i64) -> bool {
        self.untrusted_schemes.contains(&version)
    }

    pub fn untrusted_versions(&self) -> impl Iterator<Item = i64> + '_ {
        self.untrusted_schemes.iter().copied()
    }

    /// The tolerance actually applied.
    pub fn effective_tolerance(&self) -> Duration {
        match self.tolerance {
            Some(t) if !t.is_zero() => t,
            _ => DEFAULT_TOLERANCE,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        match &self.now {
            Some(clock) => clock(),
            None => Utc::now(),
        }
    }
}

impl fmt::Debug for VerificationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationOptions")
            .field("tolerance", &self.tolerance)
            .field("ignore_tolerance", &self.ignore_tolerance)
            .field("clock_overridden", &self.now.is_some())
            .field("untrusted_schemes", &self.untrusted_schemes)
            .finish()
    }
}
