//! Pipeline stages between an upload and a model reply.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render/extract ──▶ encode ──▶ llm ──▶ sanitize
//! (sniff)   (pdfium, 2-pass)   (base64)   (call)  (strip fences)
//! ```
//!
//! 1. [`input`]    — validate a local upload and sniff PDF vs image
//! 2. [`extract`]  — decide text-bearing vs scanned over a [`extract::PageSource`]
//! 3. [`render`]   — the pdfium-backed page source; runs in `spawn_blocking`
//! 4. [`encode`]   — base64 payloads with a detail hint
//! 5. [`llm`]      — the [`llm::ModelClient`] seam; the only stage with network I/O
//! 6. [`sanitize`] — recover bare JSON text from the reply

pub mod encode;
pub mod extract;
pub mod input;
pub mod llm;
pub mod render;
pub mod sanitize;
