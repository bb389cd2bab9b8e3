//! # Folio Gen
//!
//! A build-time manifest generator for photography and video portfolios.
//! The filesystem is the data source: folders under `Stills/` become galleries
//! and folder indexes, a flat video registry is partitioned across folders
//! under `Motion/`, and every folder gets a `manifest.json` that the page
//! layer reads at request time.
//!
//! # Architecture: Read, Derive, Flush
//!
//! ```text
//! 1. Read     Stills/ Motion/ registry  →  SourceDir snapshots   (scan, registry)
//! 2. Derive   snapshots                 →  StillsTree, MotionTree (stills, motion)
//! 3. Flush    trees                     →  WritePlan → disk       (write)
//! ```
//!
//! Only the first and last stages touch the filesystem. Derivation is a pure
//! function of the snapshots plus the image-metadata collaborator, so the
//! builders are unit-tested against in-memory trees and a mock backend.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`directives`] | `.order` file parsing: directive header, ordered keys, hidden keys |
//! | [`order`] | Applies an order file to candidates; natural sort fallback |
//! | [`naming`] | Display names, URL encoding, image extensions, reserved file names |
//! | [`scan`] | Reads a root into a [`scan::SourceDir`] snapshot |
//! | [`cover`] | Explicit cover resolution and content-addressed cover names |
//! | [`stills`] | Stills tree derivation: indexes, galleries, fallback covers |
//! | [`registry`] | Video registry loading, validation and dedup |
//! | [`motion`] | Motion tree derivation: projects, claimed set, leaf videos |
//! | [`types`] | The versioned manifest schema |
//! | [`write`] | Write plan, idempotent flush, stale cover pruning |
//! | [`imaging`] | Image metadata: dimensions and blur previews |
//! | [`pipeline`] | One full pass: [`pipeline::BuildContext`], `run`, `check` |
//! | [`watch`] | Input classification, debouncing and the watch loop |
//! | [`config`] | `folio.toml` loading, merging and validation |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Stateless Passes
//!
//! Each pass recomputes everything from disk. There is no cache between
//! passes, so a watch rebuild and a one-shot build produce identical bytes,
//! and writes that would not change a file are skipped.
//!
//! ## Disjoint Inputs and Outputs
//!
//! The generator writes into the trees it watches. Generated names are a
//! fixed set ([`naming::GENERATED_FILES`]) plus the covers directory, and the
//! watcher's classifier rejects exactly those, so a build never triggers
//! another build.
//!
//! ## Content-Addressed Covers
//!
//! A `<image>.cover` marker is copied to `_covers/<hash>-<image>`, where the
//! hash covers the marker's path. Names are stable across runs and cannot
//! collide between folders, which is what lets sibling folders be derived
//! in parallel.

pub mod config;
pub mod cover;
pub mod directives;
pub mod imaging;
pub mod motion;
pub mod naming;
pub mod order;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod scan;
pub mod stills;
pub mod types;
pub mod watch;
pub mod write;

#[cfg(test)]
pub(crate) mod test_helpers;
