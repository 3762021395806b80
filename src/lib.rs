//! # Forum Archive
//!
//! Keyword lookup over an archive of forum question/answer pairs.
//!
//! A browser sends a parameter bag to `/serveFaqs`; the request is classified,
//! matched against the archive with a ranked SQL query, rendered as an HTML
//! page, and every result shown is appended to an audit log together with the
//! session and user it was shown to. Readers rate results through the same
//! endpoint, and those ratings land in the same log.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌────────────┐   ┌──────────┐   ┌───────────┐
//! │  server   │──▶│  classify  │──▶│  lookup  │──▶│  SQLite   │
//! │ /serveFaqs│   └────────────┘   └────┬─────┘   │  archive  │
//! └─────┬─────┘                         ▼         └───────────┘
//!       │                         ┌──────────┐   ┌───────────┐
//!       └────────────────────────▶│ assemble │──▶│ audit log │
//!                                 └──────────┘   └───────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Request, result and audit types |
//! | [`error`] | Validation / store / render errors |
//! | [`store`] | Archive connection traits and SQLite backend |
//! | [`classify`] | Parameter validation |
//! | [`lookup`] | Ranked keyword query |
//! | [`render`] | HTML layout |
//! | [`assemble`] | Result page and audit entries |
//! | [`audit`] | Append-only audit sinks |
//! | [`handler`] | Per-request orchestration |
//! | [`server`] | HTTP transport |
//! | [`db`] | Database connection |
//! | [`migrate`] | Archive schema |
//! | [`import`] | JSON-lines archive import |

pub mod assemble;
pub mod audit;
pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod import;
pub mod lookup;
pub mod migrate;
pub mod models;
pub mod render;
pub mod server;
pub mod store;
