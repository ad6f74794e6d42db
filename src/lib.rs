//! # Synapsis
//!
//! A small local service that saves notes and AI answers as Markdown files
//! and mirrors the notes directory to a git remote.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────────────┐   ┌─────────────┐
//! │  HTTP /  │──▶│           Pipeline           │──▶│  data root  │
//! │   CLI    │   │ mode → filename → AI → format│   │  *.md files │
//! └──────────┘   └──────────────┬───────────────┘   └──────┬──────┘
//!                               │                          │
//!                               ▼                          ▼
//!                        ┌─────────────┐          ┌────────────────┐
//!                        │  Assistant  │          │   Publisher    │
//!                        │  (OpenAI)   │          │ add/commit/push│
//!                        └─────────────┘          └────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! synapsis --config ./config/synapsis.toml serve
//! curl -X POST localhost:8000/save -H 'content-type: application/json' \
//!      -d '{"content": "hello"}'
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Request error taxonomy |
//! | [`models`] | Request, response, and mode types |
//! | [`modes`] | Mode registry loaded from JSON |
//! | [`filename`] | Filename sanitization and generation |
//! | [`format`] | Saved document rendering |
//! | [`store`] | File persistence under the data root |
//! | [`publish`] | git stage/commit/push |
//! | [`llm`] | Language-model client |
//! | [`pipeline`] | Save and ask operations |
//! | [`server`] | HTTP server |

pub mod config;
pub mod error;
pub mod filename;
pub mod format;
pub mod llm;
pub mod models;
pub mod modes;
pub mod pipeline;
pub mod publish;
pub mod server;
pub mod store;
