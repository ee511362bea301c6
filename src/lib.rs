//! web2ebook: turn a curated list of web articles into an asciidoc ebook project.

pub mod cache;
pub mod cli;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod markup;
pub mod model;
pub mod pipeline;
pub mod profile;
pub mod project;
pub mod settings;

// Re-exports for CLI and consumers.
pub use cache::{CachingFetcher, CACHE_DIR};
pub use config::{Config, ConfigError};
pub use extract::{extract, ExtractError};
pub use fetch::{Fetch, FetchError, HttpFetcher, HttpFetcherBuilder};
pub use markup::render_document;
pub use model::{Block, Chapter, Document, Inline};
pub use pipeline::{generate, ChapterError, GenerateError, GenerationContext, Report, UrlOutcome};
pub use profile::{profile_for, ProfileError, SiteProfile};
pub use project::{AssembleError, Project, ProjectOutput};
pub use settings::{load_settings, Settings, SettingsError};
