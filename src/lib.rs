//! # Verse Projector
//!
//! Paginated scripture projection for worship services, with an SQLite
//! index of the scripture library.
//!
//! An operator picks passages on a **control surface**; verses are sent
//! through a **hub** to a **projection surface**, which splits long verses
//! into slides that fit its display. "Next" and "previous" first move
//! between slides of the current verse and only then to the neighbouring
//! verse.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  verse-update   ┌──────────┐  ToProjection   ┌──────────────┐
//! │   Control    │────────────────▶│   Hub    │────────────────▶│  Projection  │
//! │   surface    │◀────────────────│ (tokens, │◀────────────────│   surface    │
//! └──────┬───────┘  handled: bool  │ timeout) │ ProjectionEvent └──────────────┘
//!        │                         └──────────┘
//!        ▼
//! ┌──────────────┐   vp import   ┌──────────────────┐
//! │  Book files  │──────────────▶│ SQLite + FTS5    │
//! │  (JSON)      │               │ books/verses/... │
//! └──────────────┘               └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types and numeric id ordering |
//! | [`library`] | File-backed book store |
//! | [`navigation`] | Next/previous verse selection |
//! | [`chunk`] | Character chunking and sentence splitting |
//! | [`layout`] | Display measurement |
//! | [`paginate`] | Measured slide pagination |
//! | [`protocol`] | Messages between the surfaces |
//! | [`projection`] | Projection surface |
//! | [`hub`] | Command routing, correlation, and timeouts |
//! | [`control`] | Control surface |
//! | [`session`] | Interactive terminal session |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`import`] | Library importer |
//! | [`search`] | Full-text search |

pub mod chunk;
pub mod config;
pub mod control;
pub mod db;
pub mod hub;
pub mod import;
pub mod layout;
pub mod library;
pub mod migrate;
pub mod models;
pub mod navigation;
pub mod paginate;
pub mod projection;
pub mod protocol;
pub mod search;
pub mod session;
