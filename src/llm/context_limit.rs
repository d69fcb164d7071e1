//! Context-window resolution for model identifiers.
//!
//! Limits come from an embedded YAML table: an exact-name map first, then an
//! ordered list of family patterns, then a conservative default. Optionally
//! an unknown model can be reverse-probed against the live API. Every
//! resolution is written to a [`ContextLimitCache`] owned by the caller.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::llm::ai::AiClient;

/// Candidate context sizes tried when probing, largest first.
pub const PROBE_CANDIDATES: [usize; 8] = [
    1_048_576, 262_144, 131_072, 65_536, 32_768, 16_384, 8_192, 4_096,
];

/// Embedded model limit table.
pub const MODELS_YAML: &str = include_str!("../templates/models.yaml");

/// Raw YAML layout of `templates/models.yaml`.
#[derive(Debug, Deserialize)]
struct LimitTableFile {
    default_limit: usize,
    probe_fallback_limit: usize,
    models: Vec<ExactEntry>,
    patterns: Vec<PatternEntry>,
}

#[derive(Debug, Deserialize)]
struct ExactEntry {
    name: String,
    context: usize,
}

#[derive(Debug, Deserialize)]
struct PatternEntry {
    family: String,
    pattern: String,
    context: usize,
}

/// A compiled family pattern.
#[derive(Debug)]
struct FamilyPattern {
    family: String,
    regex: Regex,
    limit: usize,
}

/// Static model-name to context-limit tables.
#[derive(Debug)]
pub struct ModelLimitTable {
    default_limit: usize,
    probe_fallback_limit: usize,
    exact: HashMap<String, usize>,
    patterns: Vec<FamilyPattern>,
}

impl ModelLimitTable {
    /// Loads the table embedded in the binary.
    pub fn load() -> Result<Self> {
        Self::from_yaml(MODELS_YAML)
    }

    /// Parses a table from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: LimitTableFile =
            serde_yaml::from_str(yaml).context("Failed to parse model limit table")?;

        let exact = file
            .models
            .into_iter()
            .map(|entry| (entry.name.to_lowercase(), entry.context))
            .collect();

        let patterns = file
            .patterns
            .into_iter()
            .map(|entry| {
                let regex = Regex::new(&entry.pattern).with_context(|| {
                    format!("Invalid pattern for model family {}", entry.family)
                })?;
                Ok(FamilyPattern {
                    family: entry.family,
                    regex,
                    limit: entry.context,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            default_limit: file.default_limit,
            probe_fallback_limit: file.probe_fallback_limit,
            exact,
            patterns,
        })
    }

    /// Looks a model up in the exact table, then the pattern list.
    ///
    /// Returns `None` when neither matches.
    pub fn lookup(&self, model: &str) -> Option<(usize, LimitSource)> {
        let key = model.trim().to_lowercase();
        if let Some(&limit) = self.exact.get(&key) {
            return Some((limit, LimitSource::Exact));
        }
        self.patterns
            .iter()
            .find(|p| p.regex.is_match(&key))
            .map(|p| (p.limit, LimitSource::Pattern(p.family.clone())))
    }

    /// Limit used when nothing matches and probing is disabled.
    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Limit used when every probe candidate fails.
    pub fn probe_fallback_limit(&self) -> usize {
        self.probe_fallback_limit
    }
}

/// Where a resolved limit came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitSource {
    /// Previously resolved in this process.
    Cache,
    /// Exact model-name entry.
    Exact,
    /// Family pattern, carrying the family name.
    Pattern(String),
    /// Conservative default for unknown models.
    Default,
    /// Discovered by probing the API.
    Probed,
    /// Probing failed for every candidate.
    ProbeFallback,
}

impl fmt::Display for LimitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Exact => write!(f, "exact match"),
            Self::Pattern(family) => write!(f, "pattern ({family})"),
            Self::Default => write!(f, "default"),
            Self::Probed => write!(f, "probed"),
            Self::ProbeFallback => write!(f, "probe fallback"),
        }
    }
}

/// A context limit together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLimit {
    /// Context window in tokens.
    pub limit: usize,
    /// How the limit was obtained.
    pub source: LimitSource,
}

/// Whether unknown models may be probed against the live API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbePolicy {
    /// Unknown models get the table default.
    #[default]
    Disabled,
    /// Unknown models are probed with real (billed) requests.
    Enabled,
}

/// Process-lifetime store of resolved limits, keyed by model name.
///
/// Cheap to clone; clones share the same map. Entries are never
/// invalidated.
#[derive(Debug, Clone, Default)]
pub struct ContextLimitCache {
    entries: Arc<Mutex<HashMap<String, usize>>>,
}

impl ContextLimitCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache pre-seeded with known limits.
    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            entries: Arc::new(Mutex::new(map)),
        }
    }

    /// Returns the cached limit for a model, if any.
    pub async fn get(&self, model: &str) -> Option<usize> {
        self.entries.lock().await.get(model).copied()
    }
}

/// Maps model names to context-window sizes.
pub struct ContextLimitResolver {
    table: ModelLimitTable,
    cache: ContextLimitCache,
    probe_policy: ProbePolicy,
}

impl ContextLimitResolver {
    /// Creates a resolver over the embedded table.
    pub fn new(cache: ContextLimitCache, probe_policy: ProbePolicy) -> Result<Self> {
        Ok(Self::with_table(ModelLimitTable::load()?, cache, probe_policy))
    }

    /// Creates a resolver over a custom table.
    pub fn with_table(
        table: ModelLimitTable,
        cache: ContextLimitCache,
        probe_policy: ProbePolicy,
    ) -> Self {
        Self {
            table,
            cache,
            probe_policy,
        }
    }

    /// Returns the cache this resolver writes to.
    pub fn cache(&self) -> &ContextLimitCache {
        &self.cache
    }

    /// Resolves the context limit for `model`.
    ///
    /// Order: cache, exact table, pattern table, then either probing (when
    /// enabled and a client is supplied) or the default. The cache lock is
    /// held for the whole resolution so one model is never probed twice.
    pub async fn resolve(&self, model: &str, prober: Option<&dyn AiClient>) -> ResolvedLimit {
        let mut entries = self.cache.entries.lock().await;
        if let Some(&limit) = entries.get(model) {
            return ResolvedLimit {
                limit,
                source: LimitSource::Cache,
            };
        }

        let resolved = match self.table.lookup(model) {
            Some((limit, source)) => ResolvedLimit { limit, source },
            None => match (self.probe_policy, prober) {
                (ProbePolicy::Enabled, Some(client)) => self.probe(model, client).await,
                _ => ResolvedLimit {
                    limit: self.table.default_limit(),
                    source: LimitSource::Default,
                },
            },
        };

        debug!(model, limit = resolved.limit, source = %resolved.source, "Resolved context limit");
        entries.insert(model.to_string(), resolved.limit);
        resolved
    }

    /// Resolves and returns only the limit.
    pub async fn resolve_limit(&self, model: &str, prober: Option<&dyn AiClient>) -> usize {
        self.resolve(model, prober).await.limit
    }

    /// Tries decreasing candidate sizes until one request succeeds.
    async fn probe(&self, model: &str, client: &dyn AiClient) -> ResolvedLimit {
        info!(model, "Probing context limit for unknown model");
        for candidate in PROBE_CANDIDATES {
            match client.probe_context(candidate).await {
                Ok(()) => {
                    info!(model, limit = candidate, "Context limit probe accepted");
                    return ResolvedLimit {
                        limit: candidate,
                        source: LimitSource::Probed,
                    };
                }
                Err(e) => {
                    debug!(model, candidate, error = %e, "Context limit probe rejected");
                }
            }
        }

        let fallback = self.table.probe_fallback_limit();
        warn!(
            model,
            fallback, "Every context limit probe failed, using fallback limit"
        );
        ResolvedLimit {
            limit: fallback,
            source: LimitSource::ProbeFallback,
        }
    }
}
