//! Icon retrieval with graceful degradation.
//!
//! The loader turns a resource reference into displayable markup and never
//! fails outward: raster references, transport errors, bad statuses, and
//! wrong content types all degrade to the fixed placeholder glyph, with the
//! failure recorded for diagnostics. Retrieval itself is delegated to the
//! [`IconSource`] collaborator.
//!
//! Loads can be in flight while the element that wanted them is torn down,
//! so every load carries a generation ticket; a delivery whose ticket has
//! been superseded is discarded without touching any state.

use crate::cache::IconCache;
use crate::svg::{IconStyle, normalize_icon_markup, placeholder_glyph};
use thiserror::Error;

/// Errors an icon source can produce.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("unexpected content type: {0}")]
    ContentType(String),
    #[error("transport: {0}")]
    Transport(String),
}

/// A fetched payload, before any validation.
#[derive(Debug, Clone)]
pub struct IconPayload {
    pub content_type: Option<String>,
    pub body: String,
}

/// Resource-fetch collaborator.
///
/// Implemented differently by each host environment: native shells wrap
/// their HTTP client, tests use a map. A source reports transport-level
/// failure through [`FetchError`]; content validation happens in the loader.
pub trait IconSource {
    fn fetch(&self, reference: &str) -> Result<IconPayload, FetchError>;
}

/// Identifies one load request. Only the most recently issued ticket for a
/// loader is live; earlier ones deliver into the void.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Turns references into displayable icon markup, via cache and source.
pub struct IconLoader<S> {
    source: S,
    cache: IconCache,
    generation: u64,
    /// Most recent failure message, kept for diagnostics only.
    last_error: Option<String>,
}

impl<S: IconSource> IconLoader<S> {
    pub fn new(source: S, cache: IconCache) -> Self {
        Self {
            source,
            cache,
            generation: 0,
            last_error: None,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn cache(&self) -> &IconCache {
        &self.cache
    }

    /// Full pipeline for hosts with a blocking source: short-circuits,
    /// cache, fetch, normalize, fallback. Never fails.
    pub fn resolve(&mut self, reference: &str, style: &IconStyle) -> String {
        let ticket = self.begin();
        if let Some(markup) = self.try_fast_path(reference, style) {
            return markup;
        }
        let result = self.source.fetch(reference);
        self.deliver(ticket, reference, style, result)
            .unwrap_or_else(|| placeholder_glyph(style))
    }

    /// Issue a ticket for a load the host will perform asynchronously.
    /// Issuing a new ticket supersedes every earlier one.
    pub fn begin(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Mark a ticket cancelled (its element was torn down). Subsequent
    /// delivery for it will be discarded.
    pub fn cancel(&mut self, ticket: LoadTicket) {
        if ticket.generation == self.generation {
            self.generation += 1;
        }
    }

    /// Resolve without touching the network: empty or raster references get
    /// the placeholder, cached references get their markup.
    pub fn try_fast_path(&mut self, reference: &str, style: &IconStyle) -> Option<String> {
        if reference.is_empty() || is_raster_reference(reference) {
            return Some(placeholder_glyph(style));
        }
        let key = IconCache::key(reference, style);
        self.cache.get(&key).map(str::to_string)
    }

    /// Accept a fetch result for `ticket`. Returns the markup to display,
    /// or `None` when the ticket was superseded or cancelled: a late
    /// response must not mutate state for a no-longer-current request.
    pub fn deliver(
        &mut self,
        ticket: LoadTicket,
        reference: &str,
        style: &IconStyle,
        result: Result<IconPayload, FetchError>,
    ) -> Option<String> {
        if ticket.generation != self.generation {
            return None;
        }

        match validate(result) {
            Ok(body) => {
                let markup = normalize_icon_markup(&body, style);
                self.cache
                    .insert(IconCache::key(reference, style), markup.clone());
                self.last_error = None;
                Some(markup)
            }
            Err(err) => {
                log::warn!("icon fetch failed for {reference}: {err}");
                self.last_error = Some(err.to_string());
                Some(placeholder_glyph(style))
            }
        }
    }
}

fn validate(result: Result<IconPayload, FetchError>) -> Result<String, FetchError> {
    let payload = result?;
    if let Some(ct) = &payload.content_type
        && !ct.contains("svg")
    {
        return Err(FetchError::ContentType(ct.clone()));
    }
    Ok(payload.body)
}

/// References ending in a raster extension never hit the network; icon
/// sources only serve vector markup. Query strings are tolerated.
fn is_raster_reference(reference: &str) -> bool {
    let path = reference.split('?').next().unwrap_or(reference);
    let lower = path.to_ascii_lowercase();
    [".png", ".jpg", ".jpeg", ".gif", ".webp"]
        .iter()
        .any(|ext| lower.ends_with(ext))
}
