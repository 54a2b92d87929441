//! Pipeline stages for paper-to-poster generation.
//!
//! Each submodule implements exactly one transformation step. Keeping the
//! stages separate makes each independently testable and keeps the two
//! fallible boundaries (document retrieval, summarizer calls) isolated from
//! the deterministic middle.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ segment ──▶ summarize ──▶ sanitize ─┐
//! (path/URL/   (lopdf)    (keyword     (chat API,   (regex   │
//!  arXiv id)              spans)       sentinels)   cleanup) │
//!              └──▶ figures ──────────────────────────────┐  │
//!                   (XObjects + CTM walk)                 ▼  ▼
//!                                          layout ──▶ compose ──▶ encode
//!                                          (columns)  (canvas)    (PNG)
//! ```
//!
//! 1. [`input`]     — resolve a path, URL, or arXiv id to a local PDF file
//! 2. [`extract`]   — open the document, pull linear full-text and metadata
//! 3. [`segment`]   — locate the configured sections by keyword heuristics
//! 4. [`figures`]   — decode embedded images with draw-orientation applied
//! 5. [`summarize`] — per-section chat calls; degrades to sentinels, the
//!    only stage with network I/O after input
//! 6. [`sanitize`]  — deterministic cleanup of model output quirks
//! 7. [`layout`]    — column geometry and pixel-width word wrapping
//! 8. [`compose`]   — render header, summaries, figures, QR onto the canvas
//! 9. [`encode`]    — PNG-encode the finished canvas

pub mod compose;
pub mod encode;
pub mod extract;
pub mod figures;
pub mod input;
pub mod layout;
pub mod sanitize;
pub mod segment;
pub mod summarize;
