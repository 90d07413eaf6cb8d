//! # Padbackup Architecture
//!
//! Padbackup keeps an incremental, history-preserving backup of Hackpad sites.
//! Every site gets its own git repository with one file per pad, and every
//! backed-up pad revision becomes one commit whose author date is the time the
//! revision was made. The history itself is the only backup state: the next
//! run reads its starting point back out of the newest commit messages.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, sets up logging, prints reports        │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs, sites.rs)                               │
//! │  - Owns the backends and the clock                          │
//! │  - Dispatches to commands, returns reports                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - The sync algorithm, one site or the whole backup list    │
//! │  - `now` is an argument; no terminal I/O                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Collaborators (client/, store/)                            │
//! │  - PadService: HackpadClient (production), MemService       │
//! │  - VersionedStore: GitStore (production), MemStore          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Sync Pass
//!
//! 1. Read the site's watermark (newest commit's `timestamp` line).
//! 2. List pads edited since then, or every pad if the service refuses.
//! 3. For each pad, keep the revisions newer than its last committed version
//!    and older than the race window ([`filter`]), fetching each one's content.
//! 4. Commit the buffered revisions in timestamp order ([`batch`]).
//!
//! Re-running after a crash is always safe: anything not committed is simply
//! fetched again, and identical content is never committed twice.
//!
//! ## Module Overview
//!
//! - [`api`]: facade used by the binary
//! - [`commands`]: backup, multi-site run and status
//! - [`filter`], [`batch`], [`watermark`]: the pieces of one sync pass
//! - [`client`], [`store`], [`sites`]: service and history backends
//! - [`config`], [`credentials`], [`targets`]: the three input files
//! - [`model`], [`error`]: shared types

pub mod api;
pub mod batch;
pub mod client;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod filter;
pub mod model;
pub mod sites;
pub mod store;
pub mod targets;
pub mod watermark;
