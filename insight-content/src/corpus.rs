//! Corpus loading and validation.
//!
//! Loading is an explicit startup step: raw records are schema-validated,
//! measured, and checked against the surface table before the corpus is
//! published. After construction a [`Corpus`] is read-only and meant to be
//! shared as `Arc<Corpus>`.

use std::collections::HashSet;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::fallback::{BuiltinFallbacks, FallbackProvider, FALLBACK_ID_PREFIX};
use crate::selector::SelectionError;
use crate::source::{CorpusFormat, CorpusSource};
use crate::surface::{SurfaceId, SurfaceTable};
use crate::types::{ContentEntry, SourceTier};

const BUILTIN_CORPUS: &str = include_str!("../corpus/insights.json");

/// Error types for corpus loading.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// Source could not be read
    #[error("Failed to read corpus source {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Source is not a JSON array at all
    #[error("Corpus source {name} is not a JSON array: {message}")]
    Parse { name: String, message: String },

    /// Strict load found invalid records
    #[error("{} corpus record(s) rejected", .rejected.len())]
    Rejected { rejected: Vec<RejectedRecord> },

    /// Nothing valid was loaded
    #[error("Corpus contains no valid entries")]
    EmptyCorpus,

    /// The fallback provider supplied an unusable entry
    #[error("Fallback provider {provider} supplied invalid entry {id:?}: {reason}")]
    InvalidFallback {
        provider: String,
        id: String,
        reason: RejectionReason,
    },

    /// An enabled surface has no fallback that fits it
    #[error("No fallback fits surface {surface} ({min}-{max} characters)")]
    MissingFallback {
        surface: SurfaceId,
        min: usize,
        max: usize,
    },
}

/// Why a record was quarantined.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectionReason {
    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("empty id")]
    EmptyId,

    #[error("duplicate id {0:?}")]
    DuplicateId(String),

    #[error("id {0:?} uses the reserved fallback prefix")]
    ReservedId(String),

    #[error("fallback id {0:?} lacks the fallback prefix")]
    NotFallbackId(String),

    #[error("fallback carries associated number {0}")]
    NumberedFallback(u32),

    #[error("empty text")]
    EmptyText,

    #[error("associated number {0} is not 1-9 or a master number")]
    InvalidNumber(u32),

    #[error("empty tag")]
    EmptyTag,

    #[error("length {length} exceeds the largest surface maximum {max}")]
    TooLong { length: usize, max: usize },

    #[error("length {length} is below the smallest surface minimum {min}")]
    TooShort { length: usize, min: usize },
}

/// A record that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// Source the record came from
    pub source: String,
    /// Array index (JSON) or 1-based line number (NDJSON)
    pub position: usize,
    /// Record id, when one could be read
    pub id: Option<String>,
    /// Why it was rejected
    pub reason: RejectionReason,
}

/// Summary of a corpus load.
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Sources read, in order
    pub sources: Vec<String>,
    /// Number of admitted entries (fallbacks excluded)
    pub accepted: usize,
    /// Quarantined records
    pub rejected: Vec<RejectedRecord>,
    /// Fingerprint of the published corpus
    pub fingerprint: String,
}

/// Wire shape of a corpus record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ContentRecord {
    id: String,
    #[serde(default)]
    associated_number: Option<u32>,
    #[serde(default)]
    tags: Vec<String>,
    text: String,
    source_tier: SourceTier,
}

impl ContentRecord {
    fn into_entry(self) -> Result<ContentEntry, RejectionReason> {
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(RejectionReason::EmptyTag);
        }
        Ok(
            ContentEntry::new(self.id, self.source_tier, self.associated_number, self.text)
                .with_tags(self.tags),
        )
    }
}

/// The immutable, validated insight corpus.
#[derive(Debug, Clone)]
pub struct Corpus {
    /// Entries sorted by id
    entries: Vec<ContentEntry>,
    /// Minimal fallbacks, sorted by id
    fallbacks: Vec<ContentEntry>,
    fingerprint: String,
}

impl Corpus {
    fn new(mut entries: Vec<ContentEntry>, mut fallbacks: Vec<ContentEntry>) -> Self {
        entries.sort_by(|a, b| a.id().cmp(b.id()));
        fallbacks.sort_by(|a, b| a.id().cmp(b.id()));
        let fingerprint = Self::compute_fingerprint(&entries, &fallbacks);
        Self {
            entries,
            fallbacks,
            fingerprint,
        }
    }

    /// The bundled starter corpus with built-in fallbacks.
    pub fn builtin() -> Result<Self, CorpusError> {
        CorpusLoader::new(SurfaceTable::default())
            .strict()
            .load_str("builtin", BUILTIN_CORPUS, CorpusFormat::JsonArray)
            .map(|(corpus, _)| corpus)
    }

    /// All entries, sorted by id.
    pub fn entries(&self) -> &[ContentEntry] {
        &self.entries
    }

    /// Fallback entries, sorted by id.
    pub fn fallbacks(&self) -> &[ContentEntry] {
        &self.fallbacks
    }

    /// Look up an entry or fallback by id.
    pub fn get(&self, id: &str) -> Option<&ContentEntry> {
        self.entries
            .binary_search_by(|e| e.id().cmp(id))
            .ok()
            .map(|i| &self.entries[i])
            .or_else(|| self.fallbacks.iter().find(|f| f.id() == id))
    }

    /// Number of entries (fallbacks excluded).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// SHA-256 over every entry and fallback, stable across load order.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Enabled surfaces no fallback fits.
    pub fn uncovered_surfaces(&self, surfaces: &SurfaceTable) -> Vec<SurfaceId> {
        surfaces
            .enabled()
            .filter(|(_, budget)| !self.fallbacks.iter().any(|f| budget.fits(f.length())))
            .map(|(surface, _)| surface)
            .collect()
    }

    /// Startup health check: every enabled surface must have a fallback.
    pub fn check_coverage(&self, surfaces: &SurfaceTable) -> Result<(), SelectionError> {
        match self.uncovered_surfaces(surfaces).first() {
            None => Ok(()),
            Some(surface) => {
                let budget = surfaces
                    .budget(*surface)
                    .unwrap_or(surface.default_budget());
                Err(SelectionError::NoFallbackAvailable {
                    min: budget.min,
                    max: budget.max,
                })
            }
        }
    }

    fn compute_fingerprint(entries: &[ContentEntry], fallbacks: &[ContentEntry]) -> String {
        let mut hasher = Sha256::new();

        for entry in entries.iter().chain(fallbacks) {
            hasher.update(entry.id().as_bytes());
            hasher.update([0u8]);
            hasher.update(entry.source_tier().as_str().as_bytes());
            hasher.update([0u8]);
            match entry.associated_number() {
                Some(n) => hasher.update(n.to_string().as_bytes()),
                None => hasher.update(b"-"),
            }
            hasher.update([0u8]);
            for tag in entry.tags() {
                hasher.update(tag.as_bytes());
                hasher.update(b",");
            }
            hasher.update([0u8]);
            hasher.update(entry.text().as_bytes());
            hasher.update([0xffu8]);
        }

        hex::encode(hasher.finalize())
    }
}

/// Validation state while records are being admitted.
struct Admission {
    max_len: Option<usize>,
    min_len: Option<usize>,
    seen: HashSet<String>,
    fallbacks: Vec<ContentEntry>,
    accepted: Vec<ContentEntry>,
    rejected: Vec<RejectedRecord>,
}

impl Admission {
    /// Start admitting records after checking the fallbacks they sit beside.
    fn new(surfaces: &SurfaceTable, provider: &dyn FallbackProvider) -> Result<Self, CorpusError> {
        let fallbacks = provider.fallbacks();
        let mut seen = HashSet::with_capacity(fallbacks.len());

        for fallback in &fallbacks {
            let invalid = |reason| CorpusError::InvalidFallback {
                provider: provider.name().to_string(),
                id: fallback.id().to_string(),
                reason,
            };
            if fallback.id().trim().is_empty() {
                return Err(invalid(RejectionReason::EmptyId));
            }
            if !fallback.id().starts_with(FALLBACK_ID_PREFIX) {
                return Err(invalid(RejectionReason::NotFallbackId(fallback.id().to_string())));
            }
            if fallback.text().trim().is_empty() {
                return Err(invalid(RejectionReason::EmptyText));
            }
            if let Some(n) = fallback.associated_number() {
                return Err(invalid(RejectionReason::NumberedFallback(n)));
            }
            if !seen.insert(fallback.id().to_string()) {
                return Err(invalid(RejectionReason::DuplicateId(fallback.id().to_string())));
            }
        }

        Ok(Self {
            max_len: surfaces.largest_max(),
            min_len: surfaces.smallest_min(),
            seen,
            fallbacks,
            accepted: Vec::new(),
            rejected: Vec::new(),
        })
    }

    fn admit(&mut self, source: &str, position: usize, record: Result<ContentEntry, (Option<String>, RejectionReason)>) {
        let outcome = record.and_then(|entry| match self.validate(&entry) {
            Ok(()) => Ok(entry),
            Err(reason) => Err((Some(entry.id().to_string()), reason)),
        });

        match outcome {
            Ok(entry) => {
                self.seen.insert(entry.id().to_string());
                self.accepted.push(entry);
            }
            Err((id, reason)) => self.rejected.push(RejectedRecord {
                source: source.to_string(),
                position,
                id: id.filter(|id| !id.is_empty()),
                reason,
            }),
        }
    }

    fn validate(&self, entry: &ContentEntry) -> Result<(), RejectionReason> {
        if entry.id().trim().is_empty() {
            return Err(RejectionReason::EmptyId);
        }
        if entry.id().starts_with(FALLBACK_ID_PREFIX) {
            return Err(RejectionReason::ReservedId(entry.id().to_string()));
        }
        if entry.text().trim().is_empty() {
            return Err(RejectionReason::EmptyText);
        }
        if let Some(n) = entry.associated_number() {
            if !numerology::is_valid_terminal(n) {
                return Err(RejectionReason::InvalidNumber(n));
            }
        }
        if let Some(max) = self.max_len {
            if entry.length() > max {
                return Err(RejectionReason::TooLong {
                    length: entry.length(),
                    max,
                });
            }
        }
        if let Some(min) = self.min_len {
            if entry.length() < min {
                return Err(RejectionReason::TooShort {
                    length: entry.length(),
                    min,
                });
            }
        }
        if self.seen.contains(entry.id()) {
            return Err(RejectionReason::DuplicateId(entry.id().to_string()));
        }
        Ok(())
    }
}

/// Builds a [`Corpus`] from sources, validating every record.
pub struct CorpusLoader {
    surfaces: SurfaceTable,
    strict: bool,
    require_coverage: bool,
    fallbacks: Box<dyn FallbackProvider>,
}

impl CorpusLoader {
    /// Create a lenient loader with built-in fallbacks.
    pub fn new(surfaces: SurfaceTable) -> Self {
        Self {
            surfaces,
            strict: false,
            require_coverage: true,
            fallbacks: Box::new(BuiltinFallbacks),
        }
    }

    /// Builder: fail the load if any record is rejected.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Builder: use a different fallback provider.
    pub fn with_fallbacks(mut self, provider: impl FallbackProvider + 'static) -> Self {
        self.fallbacks = Box::new(provider);
        self
    }

    /// Builder: publish even if some surface has no fallback.
    ///
    /// Selection on an uncovered surface then returns
    /// [`SelectionError::NoFallbackAvailable`].
    pub fn without_coverage_check(mut self) -> Self {
        self.require_coverage = false;
        self
    }

    /// Load a single source.
    pub async fn load(&self, source: &dyn CorpusSource) -> Result<(Corpus, LoadReport), CorpusError> {
        self.load_all(&[source]).await
    }

    /// Load several sources into one corpus. Ids must be unique across sources.
    pub async fn load_all(&self, sources: &[&dyn CorpusSource]) -> Result<(Corpus, LoadReport), CorpusError> {
        let mut admission = Admission::new(&self.surfaces, self.fallbacks.as_ref())?;
        let mut names = Vec::with_capacity(sources.len());

        for source in sources {
            let raw = source.read().await?;
            parse_into(source.name(), source.format(), &raw, &mut admission)?;
            names.push(source.name().to_string());
        }

        self.finish(admission, names)
    }

    /// Load raw text already in memory.
    pub fn load_str(&self, name: &str, raw: &str, format: CorpusFormat) -> Result<(Corpus, LoadReport), CorpusError> {
        let mut admission = Admission::new(&self.surfaces, self.fallbacks.as_ref())?;
        parse_into(name, format, raw, &mut admission)?;
        self.finish(admission, vec![name.to_string()])
    }

    /// Validate programmatically built entries.
    pub fn from_entries(&self, entries: Vec<ContentEntry>) -> Result<(Corpus, LoadReport), CorpusError> {
        let mut admission = Admission::new(&self.surfaces, self.fallbacks.as_ref())?;
        for (position, entry) in entries.into_iter().enumerate() {
            admission.admit("entries", position, Ok(entry));
        }
        self.finish(admission, vec!["entries".to_string()])
    }

    fn finish(&self, admission: Admission, sources: Vec<String>) -> Result<(Corpus, LoadReport), CorpusError> {
        let Admission {
            fallbacks,
            accepted,
            rejected,
            ..
        } = admission;

        if self.strict && !rejected.is_empty() {
            return Err(CorpusError::Rejected { rejected });
        }
        for record in &rejected {
            warn!(
                source = %record.source,
                position = record.position,
                id = ?record.id,
                reason = %record.reason,
                "Quarantined corpus record"
            );
        }
        if accepted.is_empty() {
            return Err(CorpusError::EmptyCorpus);
        }

        let accepted_count = accepted.len();
        let corpus = Corpus::new(accepted, fallbacks);

        if self.require_coverage {
            if let Some(surface) = corpus.uncovered_surfaces(&self.surfaces).first() {
                let budget = self
                    .surfaces
                    .budget(*surface)
                    .unwrap_or(surface.default_budget());
                return Err(CorpusError::MissingFallback {
                    surface: *surface,
                    min: budget.min,
                    max: budget.max,
                });
            }
        }

        info!(
            entries = accepted_count,
            rejected = rejected.len(),
            fallbacks = %self.fallbacks.name(),
            fingerprint = %corpus.fingerprint(),
            "Loaded insight corpus"
        );

        let report = LoadReport {
            sources,
            accepted: accepted_count,
            rejected,
            fingerprint: corpus.fingerprint().to_string(),
        };
        Ok((corpus, report))
    }
}

fn parse_into(name: &str, format: CorpusFormat, raw: &str, admission: &mut Admission) -> Result<(), CorpusError> {
    match format {
        CorpusFormat::JsonArray => {
            let values: Vec<serde_json::Value> =
                serde_json::from_str(raw).map_err(|e| CorpusError::Parse {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
            for (position, value) in values.into_iter().enumerate() {
                let id = record_id(&value);
                let record = serde_json::from_value::<ContentRecord>(value)
                    .map_err(|e| RejectionReason::Malformed(e.to_string()))
                    .and_then(ContentRecord::into_entry)
                    .map_err(|reason| (id, reason));
                admission.admit(name, position, record);
            }
        }
        CorpusFormat::NdJson => {
            for (line, text) in raw.lines().enumerate() {
                if text.trim().is_empty() {
                    continue;
                }
                let id = serde_json::from_str::<serde_json::Value>(text)
                    .ok()
                    .and_then(|v| record_id(&v));
                let record = serde_json::from_str::<ContentRecord>(text)
                    .map_err(|e| RejectionReason::Malformed(e.to_string()))
                    .and_then(ContentRecord::into_entry)
                    .map_err(|reason| (id, reason));
                admission.admit(name, line + 1, record);
            }
        }
    }
    Ok(())
}

fn record_id(value: &serde_json::Value) -> Option<String> {
    value.get("id").and_then(|v| v.as_str()).map(str::to_string)
}
