//! Pipeline stages for newsletter clipping.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and callers can stop after any stage (a selection UI
//! only needs the first four).
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ prefilter ──▶ extract ──▶ dedupe ──▶ select
//! (path/URL)  (markers)    (walk)     (text)    (user choices)
//!
//! select ──▶ fetch ──▶ encode ──▶ layout ──▶ render
//!           (HTTP)    (RGB8)     (pages)    (printpdf)
//! ```
//!
//! 1. [`input`]     — read the markup from a file or URL
//! 2. [`prefilter`] — optionally cut newsletter boilerplate
//! 3. [`extract`]   — walk the body in document order into elements
//! 4. [`dedupe`]    — drop repeated text, keep every image
//! 5. [`select`]    — pair each chosen image with its preceding text and note
//! 6. [`fetch`]     — download each chosen image; the only network stage
//! 7. [`encode`]    — decode and convert pixels for embedding
//! 8. [`layout`]    — wrap, fit and position; uses [`metrics`] for widths
//! 9. [`render`]    — serialise the page model to PDF bytes

pub mod dedupe;
pub mod encode;
pub mod extract;
pub mod fetch;
pub mod input;
pub mod layout;
pub mod metrics;
pub mod prefilter;
pub mod render;
pub mod select;
