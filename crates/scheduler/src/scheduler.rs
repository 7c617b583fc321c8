//! Highlight scheduler implementation
//!
//! Owns the highlight state of every mounted page: keyword matches for the
//! active query, the anchors registered on the page and the semantic overlays
//! applied to them. Semantic requests run outside the state lock; their
//! results are applied only if the page render they were issued against is
//! still current.

use crate::anchor::{AnchorKey, AnchorState, ApplyOutcome};
use crate::cancel::{CancellationRegistry, CancellationToken};
use seekmark_core::{
    to_viewport_pixels, AnchorRegion, CharacterRun, Color, Highlight, HighlightConfig, HighlightError,
    MatchKind, MatchRange, PageText, PixelRect, SemanticMatch,
};
use seekmark_semantic::{MatchRequest, SemanticMatcher, ServiceError};
use seekmark_viewer::{render_window, ViewportState};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Scheduler statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Semantic requests issued
    pub requests_started: u64,

    /// Requests whose result was applied
    pub applied: u64,

    /// Requests that failed and left their anchor retryable
    pub failed: u64,

    /// Results discarded because the page moved on
    pub stale: u64,
}

impl SchedulerStats {
    /// Requests issued but not yet completed
    pub fn in_flight(&self) -> u64 {
        self.requests_started
            .saturating_sub(self.applied + self.failed + self.stale)
    }
}

/// One overlay rectangle in page pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub page: u32,
    pub rect: PixelRect,
    pub kind: MatchKind,
    /// Anchor the overlay belongs to; `None` for keyword overlays
    pub anchor: Option<AnchorKey>,
}

impl Overlay {
    pub fn color(&self) -> Color {
        self.kind.overlay_color()
    }
}

/// Claim on one anchor's semantic request, issued by [`HighlightScheduler::try_begin`].
///
/// A ticket dropped without being passed to [`HighlightScheduler::complete`]
/// releases its anchor back to `Unprocessed` and counts as stale.
#[derive(Debug)]
pub struct AnchorTicket {
    state: Weak<Mutex<SchedulerState>>,
    armed: bool,
    key: AnchorKey,
    anchor: AnchorRegion,
    generation: u64,
    token: CancellationToken,
    text: Arc<PageText>,
    request: MatchRequest,
    scale: f32,
    viewport_height: f32,
}

impl AnchorTicket {
    pub fn key(&self) -> &AnchorKey {
        &self.key
    }

    pub fn anchor(&self) -> &AnchorRegion {
        &self.anchor
    }

    pub fn request(&self) -> &MatchRequest {
        &self.request
    }
}

impl Drop for AnchorTicket {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Some(shared) = self.state.upgrade() else {
            return;
        };
        let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
        let SchedulerState { pages, stats, .. } = &mut *state;
        stats.stale += 1;

        let entry = pages
            .get_mut(&self.anchor.page)
            .filter(|ctx| ctx.generation == self.generation)
            .and_then(|ctx| ctx.anchors.get_mut(&self.key));
        if let Some(entry) = entry {
            if entry.state == AnchorState::Pending {
                entry.state = AnchorState::Unprocessed;
            }
        }
        tracing::debug!(anchor = %self.key, "semantic request abandoned, anchor released");
    }
}

#[derive(Debug)]
struct AnchorEntry {
    region: AnchorRegion,
    state: AnchorState,
    highlights: Vec<Highlight>,
    overlays: Vec<Overlay>,
}

impl AnchorEntry {
    fn new(region: AnchorRegion) -> Self {
        Self {
            region,
            state: AnchorState::Unprocessed,
            highlights: Vec::new(),
            overlays: Vec::new(),
        }
    }
}

/// Render context of one mounted page.
#[derive(Debug)]
struct PageContext {
    generation: u64,
    token: CancellationToken,
    text: Arc<PageText>,
    viewport_height: f32,
    keyword_ranges: Vec<MatchRange>,
    keyword_overlays: Vec<Overlay>,
    anchors: BTreeMap<AnchorKey, AnchorEntry>,
}

#[derive(Debug)]
struct SchedulerState {
    scale: f32,
    query: String,
    next_generation: u64,
    pages: HashMap<u32, PageContext>,
    stats: SchedulerStats,
}

/// Per-page, per-anchor highlight scheduler
///
/// Cloning yields another handle to the same state, so a clone can be moved
/// into a spawned task.
///
/// # Example
///
/// ```
/// use seekmark_core::{CharacterRun, HighlightConfig};
/// use seekmark_scheduler::HighlightScheduler;
///
/// let scheduler = HighlightScheduler::new(HighlightConfig::default());
/// scheduler.set_query("fox");
/// scheduler.mount_page(0, vec![CharacterRun::new("The Quick Brown Fox", 72.0, 700.0, 190.0, 12.0)], 792.0);
///
/// let highlights = scheduler.page_highlights(0);
/// assert_eq!(highlights.len(), 1);
/// assert_eq!(highlights[0].text, "Fox");
/// ```
#[derive(Debug, Clone)]
pub struct HighlightScheduler {
    config: Arc<HighlightConfig>,
    state: Arc<Mutex<SchedulerState>>,
    cancellation: Arc<CancellationRegistry>,
}

impl HighlightScheduler {
    pub fn new(config: HighlightConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(SchedulerState {
                scale: 1.0,
                query: String::new(),
                next_generation: 0,
                pages: HashMap::new(),
                stats: SchedulerStats::default(),
            })),
            cancellation: Arc::new(CancellationRegistry::new()),
        }
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn scale(&self) -> f32 {
        self.state().scale
    }

    pub fn query(&self) -> String {
        self.state().query.clone()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.state().stats.clone()
    }

    /// Mounted pages in ascending order
    pub fn mounted_pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.state().pages.keys().copied().collect();
        pages.sort_unstable();
        pages
    }

    /// Installs the text of a freshly rendered page.
    ///
    /// `viewport_height` is the page raster height in pixels at the current
    /// scale. Any previous context for the page is torn down: its token is
    /// cancelled and its anchors start over.
    pub fn mount_page(&self, page: u32, runs: Vec<CharacterRun>, viewport_height: f32) {
        let text = Arc::new(PageText::new(page, runs));

        let mut state = self.state();
        let token = self.cancellation.register(page);
        state.next_generation += 1;
        let generation = state.next_generation;
        let (keyword_ranges, keyword_overlays) =
            keyword_layout(&text, &state.query, &self.config, state.scale, viewport_height);

        tracing::debug!(page, generation, keywords = keyword_ranges.len(), "page mounted");
        state.pages.insert(
            page,
            PageContext {
                generation,
                token,
                text,
                viewport_height,
                keyword_ranges,
                keyword_overlays,
                anchors: BTreeMap::new(),
            },
        );
    }

    /// Drops a page's context. In-flight results for it become stale.
    pub fn unmount_page(&self, page: u32) -> bool {
        let mut state = self.state();
        let removed = state.pages.remove(&page).is_some();
        self.cancellation.cancel(page);
        drop(state);

        if removed {
            tracing::debug!(page, "page unmounted");
        }
        removed
    }

    /// Unmounts every page outside the render window. Returns the pages dropped.
    pub fn retain_window(&self, viewport: &ViewportState, buffer: u32) -> Vec<u32> {
        let window = render_window(viewport, buffer);
        let dropped: Vec<u32> = self
            .mounted_pages()
            .into_iter()
            .filter(|page| !window.contains(page))
            .collect();

        for page in &dropped {
            self.unmount_page(*page);
        }
        dropped
    }

    /// Changes the render scale.
    ///
    /// Every rectangle computed at the old scale is stale, so all pages are
    /// torn down and must be mounted again. Returns the number of pages reset.
    pub fn set_scale(&self, scale: f32) -> usize {
        let mut state = self.state();
        if state.scale == scale {
            return 0;
        }

        state.scale = scale;
        let reset = state.pages.len();
        state.pages.clear();
        self.cancellation.cancel_all();

        tracing::debug!(scale, pages = reset, "scale changed, page highlights reset");
        reset
    }

    /// Sets the active query and recomputes keyword matches on every mounted
    /// page. Semantic results belong to the old query and are discarded.
    pub fn set_query(&self, query: &str) {
        let mut state = self.state();
        let SchedulerState {
            scale,
            query: active,
            next_generation,
            pages,
            ..
        } = &mut *state;

        *active = query.trim().to_string();
        for (page, ctx) in pages.iter_mut() {
            *next_generation += 1;
            ctx.generation = *next_generation;
            ctx.token = self.cancellation.register(*page);
            ctx.anchors.clear();

            let (ranges, overlays) =
                keyword_layout(&ctx.text, active, &self.config, *scale, ctx.viewport_height);
            ctx.keyword_ranges = ranges;
            ctx.keyword_overlays = overlays;
        }
    }

    /// Registers anchors for semantic matching. Anchors on pages that are not
    /// mounted are ignored. Returns the number of newly registered anchors.
    pub fn register_anchors(&self, anchors: &[AnchorRegion]) -> usize {
        let mut state = self.state();
        let mut added = 0;
        for anchor in anchors {
            let Some(ctx) = state.pages.get_mut(&anchor.page) else {
                continue;
            };
            if let std::collections::btree_map::Entry::Vacant(slot) = ctx.anchors.entry(AnchorKey::from(anchor)) {
                slot.insert(AnchorEntry::new(anchor.clone()));
                added += 1;
            }
        }
        added
    }

    pub fn anchor_state(&self, anchor: &AnchorRegion) -> Option<AnchorState> {
        let state = self.state();
        let ctx = state.pages.get(&anchor.page)?;
        ctx.anchors.get(&AnchorKey::from(anchor)).map(|entry| entry.state)
    }

    /// Returns an applied anchor to `Unprocessed` so it is matched again.
    ///
    /// Its overlays stay visible until the new result replaces them.
    pub fn refresh_anchor(&self, anchor: &AnchorRegion) -> bool {
        let mut state = self.state();
        let entry = state
            .pages
            .get_mut(&anchor.page)
            .and_then(|ctx| ctx.anchors.get_mut(&AnchorKey::from(anchor)));

        match entry {
            Some(entry) if entry.state == AnchorState::Applied => {
                entry.state = AnchorState::Unprocessed;
                true
            }
            _ => false,
        }
    }

    /// Moves `anchor` from `Unprocessed` to `Pending`.
    ///
    /// Returns `None` without side effects when there is no active query, the
    /// page is not mounted, or the anchor is already pending or applied. The
    /// check and the transition happen under one lock, so at most one request
    /// per anchor is ever in flight.
    pub fn try_begin(&self, anchor: &AnchorRegion) -> Option<AnchorTicket> {
        let mut state = self.state();
        if state.query.is_empty() {
            return None;
        }

        let query = state.query.clone();
        let scale = state.scale;
        let SchedulerState { pages, stats, .. } = &mut *state;

        let Some(ctx) = pages.get_mut(&anchor.page) else {
            tracing::debug!(page = anchor.page, "anchor page not mounted");
            return None;
        };
        if ctx.token.is_cancelled() {
            return None;
        }

        let key = AnchorKey::from(anchor);
        let entry = ctx
            .anchors
            .entry(key.clone())
            .or_insert_with(|| AnchorEntry::new(anchor.clone()));
        if entry.state != AnchorState::Unprocessed {
            tracing::debug!(anchor = %key, state = ?entry.state, "anchor already claimed");
            return None;
        }
        entry.state = AnchorState::Pending;
        entry.region = anchor.clone();

        let text = if anchor.text.trim().is_empty() {
            ctx.text.within(&anchor.bbox).full_text().to_string()
        } else {
            anchor.text.clone()
        };
        let request = MatchRequest::new(text, query)
            .with_highlight_type(self.config.highlight_type)
            .with_threshold(self.config.semantic_threshold);

        stats.requests_started += 1;
        Some(AnchorTicket {
            state: Arc::downgrade(&self.state),
            armed: true,
            key,
            anchor: anchor.clone(),
            generation: ctx.generation,
            token: ctx.token.clone(),
            text: Arc::clone(&ctx.text),
            request,
            scale,
            viewport_height: ctx.viewport_height,
        })
    }

    /// Applies the result of a ticket's request.
    pub fn complete(
        &self,
        mut ticket: AnchorTicket,
        result: Result<Vec<SemanticMatch>, ServiceError>,
    ) -> ApplyOutcome {
        ticket.armed = false;
        let layout = result.map(|matches| self.semantic_layout(&ticket, &matches));

        let mut state = self.state();
        let page = ticket.anchor.page;
        let current = !ticket.token.is_cancelled()
            && state
                .pages
                .get(&page)
                .is_some_and(|ctx| ctx.generation == ticket.generation);
        if !current {
            state.stats.stale += 1;
            tracing::debug!(anchor = %ticket.key, "discarding stale semantic result");
            return ApplyOutcome::Stale;
        }

        let SchedulerState { pages, stats, .. } = &mut *state;
        let Some(ctx) = pages.get_mut(&page) else {
            return ApplyOutcome::Stale;
        };
        let entry = ctx
            .anchors
            .entry(ticket.key.clone())
            .or_insert_with(|| AnchorEntry::new(ticket.anchor.clone()));

        match layout {
            Err(err) => {
                entry.state = AnchorState::Unprocessed;
                stats.failed += 1;
                let err = HighlightError::Service(err.to_string());
                tracing::warn!(anchor = %ticket.key, "semantic matching failed, will retry: {err}");
                ApplyOutcome::Failed
            }
            Ok((highlights, overlays)) => {
                let groups = overlays.len();
                entry.highlights = highlights;
                entry.overlays = overlays;
                entry.state = AnchorState::Applied;
                stats.applied += 1;
                tracing::debug!(anchor = %ticket.key, groups, "semantic highlights applied");
                ApplyOutcome::Applied(groups)
            }
        }
    }

    /// Claims `anchor`, queries `matcher` and applies the result.
    ///
    /// Returns `None` when the anchor could not be claimed.
    pub async fn process_anchor<M>(&self, anchor: &AnchorRegion, matcher: &M) -> Option<ApplyOutcome>
    where
        M: SemanticMatcher + ?Sized,
    {
        let ticket = self.try_begin(anchor)?;
        let result = matcher.find_matches(ticket.request()).await;
        Some(self.complete(ticket, result))
    }

    /// Processes every registered anchor that is still `Unprocessed`.
    pub async fn process_pending<M>(&self, matcher: &M) -> Vec<ApplyOutcome>
    where
        M: SemanticMatcher + ?Sized,
    {
        let pending: Vec<AnchorRegion> = {
            let state = self.state();
            let mut pages: Vec<&PageContext> = state.pages.values().collect();
            pages.sort_by_key(|ctx| ctx.text.page());
            pages
                .into_iter()
                .flat_map(|ctx| ctx.anchors.values())
                .filter(|entry| entry.state == AnchorState::Unprocessed)
                .map(|entry| entry.region.clone())
                .collect()
        };

        let mut outcomes = Vec::with_capacity(pending.len());
        for anchor in &pending {
            if let Some(outcome) = self.process_anchor(anchor, matcher).await {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Content-space highlights of a page: keyword matches, then semantic
    /// matches per anchor, then the anchor boxes themselves.
    pub fn page_highlights(&self, page: u32) -> Vec<Highlight> {
        let state = self.state();
        let Some(ctx) = state.pages.get(&page) else {
            return Vec::new();
        };

        let mut highlights: Vec<Highlight> = ctx
            .keyword_ranges
            .iter()
            .filter_map(|range| ctx.text.highlight_for(range))
            .collect();
        for entry in ctx.anchors.values() {
            highlights.extend(entry.highlights.iter().cloned());
        }
        highlights.extend(ctx.anchors.values().map(|entry| entry.region.highlight()));
        highlights
    }

    /// Pixel overlays of a page, back to front: anchor boxes, semantic line
    /// groups, keyword line groups.
    pub fn page_overlays(&self, page: u32) -> Vec<Overlay> {
        let state = self.state();
        let Some(ctx) = state.pages.get(&page) else {
            return Vec::new();
        };

        let mut overlays: Vec<Overlay> = ctx
            .anchors
            .iter()
            .map(|(key, entry)| Overlay {
                page,
                rect: to_viewport_pixels(&entry.region.bbox, state.scale, ctx.viewport_height),
                kind: MatchKind::Anchor,
                anchor: Some(key.clone()),
            })
            .collect();
        for entry in ctx.anchors.values() {
            overlays.extend(entry.overlays.iter().cloned());
        }
        overlays.extend(ctx.keyword_overlays.iter().cloned());
        overlays
    }

    /// Overlays for every mounted page inside the render window.
    pub fn visible_overlays(&self, viewport: &ViewportState, buffer: u32) -> Vec<Overlay> {
        render_window(viewport, buffer)
            .into_iter()
            .flat_map(|page| self.page_overlays(page))
            .collect()
    }

    fn semantic_layout(&self, ticket: &AnchorTicket, matches: &[SemanticMatch]) -> (Vec<Highlight>, Vec<Overlay>) {
        let region = ticket.text.within(&ticket.anchor.bbox);
        let scope: &PageText = if region.full_text().is_empty() {
            ticket.text.as_ref()
        } else {
            &region
        };

        let ranges = scope.phrase_ranges(matches, self.config.highlight_type, &self.config);
        let highlights = ranges
            .iter()
            .filter_map(|range| scope.highlight_for(range))
            .collect();
        let overlays = range_overlays(
            scope,
            &ranges,
            &self.config,
            ticket.scale,
            ticket.viewport_height,
            Some(&ticket.key),
        );
        (highlights, overlays)
    }
}

fn keyword_layout(
    text: &PageText,
    query: &str,
    config: &HighlightConfig,
    scale: f32,
    viewport_height: f32,
) -> (Vec<MatchRange>, Vec<Overlay>) {
    if query.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let ranges = text.keyword_ranges(query, config);
    let overlays = range_overlays(text, &ranges, config, scale, viewport_height, None);
    (ranges, overlays)
}

fn range_overlays(
    text: &PageText,
    ranges: &[MatchRange],
    config: &HighlightConfig,
    scale: f32,
    viewport_height: f32,
    anchor: Option<&AnchorKey>,
) -> Vec<Overlay> {
    ranges
        .iter()
        .flat_map(|range| {
            text.line_groups(std::slice::from_ref(range), scale, viewport_height, config.line_tolerance)
                .into_iter()
                .map(move |group| Overlay {
                    page: text.page(),
                    rect: group.to_pixel_rect(),
                    kind: range.kind,
                    anchor: anchor.cloned(),
                })
        })
        .collect()
}
