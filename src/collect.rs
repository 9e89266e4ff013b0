//! Pagination driver: fetch, parse and normalize pages until the source
//! runs dry.

use tracing::{debug, info, warn};

use crate::cache::DatasetCache;
use crate::error::{FetchError, ParseError};
use crate::fetch::PageSource;
use crate::models::CourseRecord;
use crate::parse::parse_page;
use crate::query::QueryParameters;
use crate::validate::{normalize, Strictness};

pub const DEFAULT_MAX_PAGES: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorConfig {
    pub strictness: Strictness,
    /// Safety bound on requests per run.
    pub max_pages: u32,
    /// Drop rows whose course type differs from the requested one.
    pub enforce_course_type: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            strictness: Strictness::Lenient,
            max_pages: DEFAULT_MAX_PAGES,
            enforce_course_type: false,
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A page came back with an empty result list.
    Exhausted,
    /// A page could not be read; everything before it is kept.
    Malformed { page: u32, error: ParseError },
    /// The page bound was reached while pages were still full.
    PageCap { pages: u32 },
    /// Served from the cache without touching the source.
    Cached,
    /// A request failed; the records are only what arrived before it.
    TransportFailed { error: FetchError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub records: Vec<CourseRecord>,
    pub pages_fetched: u32,
    pub skipped_rows: usize,
    pub outcome: Outcome,
}

impl Collection {
    pub fn is_partial(&self) -> bool {
        matches!(self.outcome, Outcome::TransportFailed { .. })
    }

    /// A run that finished normally and found nothing.
    pub fn is_no_data(&self) -> bool {
        !self.is_partial() && self.records.is_empty()
    }

    pub fn error(&self) -> Option<&FetchError> {
        match &self.outcome {
            Outcome::TransportFailed { error } => Some(error),
            _ => None,
        }
    }

    fn cacheable(&self) -> bool {
        match &self.outcome {
            Outcome::Exhausted | Outcome::PageCap { .. } => true,
            Outcome::Malformed { error, .. } => *error == ParseError::MissingResultList,
            Outcome::Cached | Outcome::TransportFailed { .. } => false,
        }
    }
}

pub struct Collector<S> {
    source: S,
    config: CollectorConfig,
    cache: Option<DatasetCache>,
}

impl<S: PageSource> Collector<S> {
    pub fn new(source: S, config: CollectorConfig) -> Self {
        Self {
            source,
            config,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: DatasetCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Memoization key for a run: the query fields plus every setting that
    /// changes which records survive. Collectors that share a cache only
    /// share entries when they would collect the same dataset.
    pub fn cache_key(&self, params: &QueryParameters) -> String {
        let mut key = params.key_fields();
        key["strictness"] = format!("{:?}", self.config.strictness).into();
        key["enforce_course_type"] = self.config.enforce_course_type.into();
        key["max_pages"] = self.config.max_pages.into();
        key.to_string()
    }

    /// Runs the whole pagination loop for `params`, starting at page 1.
    pub fn collect(&self, params: &QueryParameters) -> Collection {
        let cache = self
            .cache
            .as_ref()
            .map(|cache| (cache, self.cache_key(params)));
        if let Some(records) = cache.as_ref().and_then(|(cache, key)| cache.get(key)) {
            info!(records = records.len(), "serving collection from cache");
            return Collection {
                records: records.as_ref().clone(),
                pages_fetched: 0,
                skipped_rows: 0,
                outcome: Outcome::Cached,
            };
        }

        info!(
            course_type = %params.course_type,
            start = %params.start_date,
            end = %params.end_date,
            "collecting training rounds"
        );

        let collection = self.run(params);

        match &collection.outcome {
            Outcome::TransportFailed { error } => {
                warn!(%error, records = collection.records.len(), "collection interrupted");
            }
            Outcome::PageCap { pages } => {
                warn!(pages, "page cap reached before the source ran dry");
            }
            Outcome::Malformed { page, error } => {
                info!(page, %error, "treating unreadable page as end of data");
            }
            _ => {}
        }
        info!(
            records = collection.records.len(),
            pages = collection.pages_fetched,
            skipped = collection.skipped_rows,
            "collection finished"
        );

        if collection.cacheable() {
            if let Some((cache, key)) = cache {
                cache.insert(key, collection.records.clone());
            }
        }
        collection
    }

    fn run(&self, params: &QueryParameters) -> Collection {
        let expected_course_type = self
            .config
            .enforce_course_type
            .then_some(params.course_type.as_str());

        let mut page_params = params.clone();
        let mut records = Vec::new();
        let mut pages_fetched = 0;
        let mut skipped_rows = 0;

        for page in 1..=self.config.max_pages {
            page_params.page_number = page;

            let payload = match self.source.fetch_page(&page_params) {
                Ok(payload) => payload,
                Err(error) => {
                    return Collection {
                        records,
                        pages_fetched,
                        skipped_rows,
                        outcome: Outcome::TransportFailed { error },
                    };
                }
            };
            pages_fetched += 1;

            let rows = match parse_page(&payload) {
                Ok(rows) => rows,
                Err(error) => {
                    return Collection {
                        records,
                        pages_fetched,
                        skipped_rows,
                        outcome: Outcome::Malformed { page, error },
                    };
                }
            };

            if rows.is_empty() {
                return Collection {
                    records,
                    pages_fetched,
                    skipped_rows,
                    outcome: Outcome::Exhausted,
                };
            }

            debug!(page, rows = rows.len(), "parsed page");
            for (index, row) in rows.iter().enumerate() {
                match normalize(row, self.config.strictness, expected_course_type) {
                    Ok(record) => records.push(record),
                    Err(error) => {
                        skipped_rows += 1;
                        warn!(page, row = index, %error, "skipping row");
                    }
                }
            }
        }

        Collection {
            records,
            pages_fetched,
            skipped_rows,
            outcome: Outcome::PageCap {
                pages: self.config.max_pages,
            },
        }
    }
}
