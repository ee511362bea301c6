//! Project assembly: one asciidoc file per chapter, the book index, and the Makefile that
//! drives asciidoctor. Everything is regenerated on each run.

use crate::config::Config;
use crate::model::Chapter;
use reqwest::Url;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const INDEX_FILE: &str = "index.asciidoc";
pub const MAKEFILE: &str = "Makefile";
pub const CHAPTERS_DIR: &str = "chapters";
const CHAPTER_EXT: &str = "asciidoc";

const MAKEFILE_TEMPLATE: &str = "\
ASCIIDOCTOR ?= asciidoctor
ASCIIDOCTOR_EPUB3 ?= asciidoctor-epub3
ASCIIDOCTOR_PDF ?= asciidoctor-pdf

.PHONY: all html epub pdf clean

all: html epub pdf

html:
\t$(ASCIIDOCTOR) index.asciidoc -d book -b html5 -D output

epub:
\t$(ASCIIDOCTOR_EPUB3) index.asciidoc -d book -D output

pdf:
\t$(ASCIIDOCTOR_PDF) index.asciidoc -d book -D output

clean:
\trm -rf output
";

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Failed to write project file: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where each configured URL's chapter lives inside the project directory.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    entries: Vec<(Url, String)>,
}

/// Paths touched by [Project::write].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectOutput {
    pub index: PathBuf,
    pub makefile: PathBuf,
    pub chapters: Vec<PathBuf>,
    /// Chapter files from an earlier run that no configured URL produced this time.
    pub removed: Vec<PathBuf>,
}

impl Project {
    /// File names are assigned over every configured URL, so one URL failing never renames another's chapter.
    pub fn new(root: impl Into<PathBuf>, urls: &[Url]) -> Self {
        let mut used = HashSet::new();
        let mut entries = Vec::with_capacity(urls.len());
        for url in urls {
            let base = chapter_slug(url);
            let mut slug = base.clone();
            let mut n = 2;
            while !used.insert(slug.clone()) {
                slug = format!("{}-{}", base, n);
                n += 1;
            }
            entries.push((
                url.clone(),
                format!("{}/{}.{}", CHAPTERS_DIR, slug, CHAPTER_EXT),
            ));
        }
        Self {
            root: root.into(),
            entries,
        }
    }

    /// Configured URLs in order, each with its project-relative chapter path.
    pub fn entries(&self) -> &[(Url, String)] {
        &self.entries
    }

    /// Write chapters in the given order, prune stale chapter files, then write the index and Makefile.
    pub fn write(&self, config: &Config, chapters: &[Chapter]) -> Result<ProjectOutput, AssembleError> {
        let chapters_dir = self.root.join(CHAPTERS_DIR);
        std::fs::create_dir_all(&chapters_dir).map_err(|e| AssembleError::Io {
            path: chapters_dir.clone(),
            source: e,
        })?;

        let mut output = ProjectOutput::default();
        for ch in chapters {
            let path = self.root.join(&ch.file_name);
            write_file(&path, &ch.markup)?;
            debug!(source = %ch.source_url, path = %path.display(), "wrote chapter");
            output.chapters.push(path);
        }

        output.removed = self.prune_stale(&chapters_dir, &output.chapters)?;
        for path in &output.removed {
            info!(path = %path.display(), "removed stale chapter");
        }

        output.index = self.root.join(INDEX_FILE);
        write_file(&output.index, &render_index(config, chapters))?;
        output.makefile = self.root.join(MAKEFILE);
        write_file(&output.makefile, MAKEFILE_TEMPLATE)?;
        Ok(output)
    }

    fn prune_stale(&self, dir: &Path, keep: &[PathBuf]) -> Result<Vec<PathBuf>, AssembleError> {
        let io_err = |e: std::io::Error| AssembleError::Io {
            path: dir.to_path_buf(),
            source: e,
        };
        let mut removed = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_chapter = path.is_file()
                && path.extension().is_some_and(|ext| ext == CHAPTER_EXT);
            if is_chapter && !keep.contains(&path) {
                std::fs::remove_file(&path).map_err(|e| AssembleError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                removed.push(path);
            }
        }
        removed.sort();
        Ok(removed)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), AssembleError> {
    std::fs::write(path, contents).map_err(|e| AssembleError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Book entry point: document header with metadata, then one include per chapter in order.
pub fn render_index(config: &Config, chapters: &[Chapter]) -> String {
    let mut out = format!(
        "= {}\n{}\n{}\n:doctype: book\n:toc:\n:homepage: {}\n",
        config.title.trim(),
        config.author.trim(),
        config.version.trim(),
        config.homepage.trim()
    );
    if !chapters.is_empty() {
        out.push('\n');
    }
    for ch in chapters {
        out.push_str(&format!("include::{}[]\n", ch.file_name));
    }
    out
}

/// Lowercase ASCII alphanumerics; every other run of characters becomes one `-`.
fn sanitize_slug(s: &str) -> String {
    let mut s = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>();
    while s.contains("--") {
        s = s.replace("--", "-");
    }
    s.trim_matches('-').to_string()
}

/// Last non-empty path segment (without a page extension), else the host.
fn chapter_slug(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segs| segs.filter(|s| !s.is_empty()).last())
        .map(|s| {
            [".html", ".htm", ".php"]
                .iter()
                .find_map(|ext| s.strip_suffix(ext))
                .unwrap_or(s)
        })
        .map(sanitize_slug)
        .filter(|s| !s.is_empty());
    segment
        .or_else(|| url.host_str().map(sanitize_slug).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| "chapter".to_string())
}
