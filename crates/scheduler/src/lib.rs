//! Seekmark Scheduler Library
//!
//! Per-page highlight state with single-flight semantic matching.
//!
//! Each mounted page carries a cancellation token and a generation number.
//! Semantic requests are claimed per anchor region before they are issued and
//! their results are applied only while the page render they were issued
//! against is still current.
//!
//! # Example
//!
//! ```
//! use seekmark_core::{AnchorRegion, CharacterRun, ContentRect, HighlightConfig};
//! use seekmark_scheduler::{AnchorState, HighlightScheduler};
//!
//! let scheduler = HighlightScheduler::new(HighlightConfig::default());
//! scheduler.set_query("quick fox");
//! scheduler.mount_page(0, vec![CharacterRun::new("The Quick Brown Fox", 0.0, 700.0, 190.0, 12.0)], 792.0);
//!
//! let anchor = AnchorRegion::new(0, ContentRect::new(0.0, 690.0, 200.0, 720.0), "The Quick Brown Fox");
//! let ticket = scheduler.try_begin(&anchor).unwrap();
//!
//! // a second claim while the first is pending is refused
//! assert!(scheduler.try_begin(&anchor).is_none());
//! assert_eq!(scheduler.anchor_state(&anchor), Some(AnchorState::Pending));
//!
//! // ... send ticket.request() to the semantic service, then:
//! scheduler.complete(ticket, Ok(Vec::new()));
//! assert_eq!(scheduler.anchor_state(&anchor), Some(AnchorState::Applied));
//! ```

mod anchor;
mod cancel;
mod scheduler;

// Re-export public API
pub use anchor::{AnchorKey, AnchorState, ApplyOutcome};
pub use cancel::{CancellationRegistry, CancellationToken};
pub use scheduler::{AnchorTicket, HighlightScheduler, Overlay, SchedulerStats};
