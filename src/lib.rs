//! Purpose: Library crate behind the `pixpeek` CLI: Pix payload and token decoding.
//! Exports: `core` (pure decoders, errors), `api` (public surface + fetch), `notice`.
//! Role: Decoders are stateless pure functions; network access lives only in `api`.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
//! Invariants: Nothing in `core` performs I/O or logs.
pub mod api;
pub mod core;
pub(crate) mod json;
pub mod notice;
