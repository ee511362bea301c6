//! Whole-run control flow. Each configured URL goes through profile lookup, fetch,
//! extraction, and rendering; a failure is recorded against that URL and the run moves on.
//! Successful chapters are then assembled into the project directory.

use crate::config::{Config, ConfigError};
use crate::extract::{extract, ExtractError};
use crate::fetch::{Fetch, FetchError};
use crate::markup::render_document;
use crate::model::Chapter;
use crate::profile::{profile_for, ProfileError};
use crate::project::{AssembleError, Project, ProjectOutput};
use reqwest::Url;
use thiserror::Error;
use tracing::{info, warn};

/// Why one URL produced no chapter. Never fatal to the run.
#[derive(Debug, Error)]
pub enum ChapterError {
    #[error("{0}")]
    UnsupportedSite(#[from] ProfileError),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Extract(#[from] ExtractError),
}

impl ChapterError {
    /// Short label for per-URL reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            ChapterError::UnsupportedSite(_) => "unsupported site",
            ChapterError::Fetch(_) => "fetch",
            ChapterError::Extract(_) => "extraction",
        }
    }
}

/// Errors that stop the whole run.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Assemble(#[from] AssembleError),
}

#[derive(Debug)]
pub enum UrlOutcome {
    Written { title: String, file_name: String },
    Failed(ChapterError),
}

#[derive(Debug)]
pub struct UrlReport {
    pub url: String,
    pub outcome: UrlOutcome,
}

/// Result of a run: one entry per configured URL, in configured order.
#[derive(Debug)]
pub struct Report {
    pub urls: Vec<UrlReport>,
    pub output: ProjectOutput,
}

impl Report {
    pub fn succeeded(&self) -> usize {
        self.urls
            .iter()
            .filter(|r| matches!(r.outcome, UrlOutcome::Written { .. }))
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &ChapterError)> {
        self.urls.iter().filter_map(|r| match &r.outcome {
            UrlOutcome::Failed(e) => Some((r.url.as_str(), e)),
            UrlOutcome::Written { .. } => None,
        })
    }
}

/// Everything one run accumulates: config, output layout, finished chapters, and per-URL outcomes.
pub struct GenerationContext<'a> {
    config: &'a Config,
    project: Project,
    chapters: Vec<Chapter>,
    outcomes: Vec<UrlReport>,
}

impl<'a> GenerationContext<'a> {
    pub fn new(config: &'a Config) -> Result<Self, ConfigError> {
        let urls = config.validate()?;
        let project = Project::new(&config.output_dir, &urls);
        Ok(Self {
            config,
            project,
            chapters: Vec::new(),
            outcomes: Vec::new(),
        })
    }

    /// Configured URLs in order, each with the chapter file it would produce.
    pub fn entries(&self) -> &[(Url, String)] {
        self.project.entries()
    }

    /// Build one chapter and record the outcome.
    pub fn process(&mut self, url: &Url, file_name: &str, fetcher: &mut dyn Fetch) {
        let outcome = match build_chapter(url, file_name, fetcher) {
            Ok(chapter) => {
                info!(%url, file = %chapter.file_name, "chapter ready");
                let outcome = UrlOutcome::Written {
                    title: chapter.title.clone(),
                    file_name: chapter.file_name.clone(),
                };
                self.chapters.push(chapter);
                outcome
            }
            Err(e) => {
                warn!(%url, kind = e.kind(), "skipped: {}", e);
                UrlOutcome::Failed(e)
            }
        };
        self.outcomes.push(UrlReport {
            url: url.to_string(),
            outcome,
        });
    }

    /// Write the project from the chapters built so far.
    pub fn finish(self) -> Result<Report, AssembleError> {
        let output = self.project.write(self.config, &self.chapters)?;
        Ok(Report {
            urls: self.outcomes,
            output,
        })
    }
}

fn build_chapter(url: &Url, file_name: &str, fetcher: &mut dyn Fetch) -> Result<Chapter, ChapterError> {
    let profile = profile_for(url)?;
    let html = fetcher.fetch(url)?;
    let doc = extract(&html, url, profile)?;
    Ok(Chapter {
        source_url: url.to_string(),
        title: doc.title.clone(),
        markup: render_document(&doc),
        file_name: file_name.to_string(),
    })
}

/// Run the full pipeline. `progress` is called with (done, total) before each URL.
pub fn generate(
    config: &Config,
    fetcher: &mut dyn Fetch,
    progress: Option<&dyn Fn(u32, u32)>,
) -> Result<Report, GenerateError> {
    let mut ctx = GenerationContext::new(config)?;
    let entries = ctx.entries().to_vec();
    let total = entries.len() as u32;
    for (i, (url, file_name)) in entries.iter().enumerate() {
        if let Some(p) = progress {
            p(i as u32 + 1, total);
        }
        ctx.process(url, file_name, fetcher);
    }
    Ok(ctx.finish()?)
}
