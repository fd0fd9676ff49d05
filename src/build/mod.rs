// src/build/mod.rs

//! Cached PDF builds
//!
//! [`PdfService::get_pdf`] serves the cached artifact of a recipe when it is
//! fresh and rebuilds it otherwise:
//!
//! 1. assemble the LaTeX render model
//! 2. render the document template
//! 3. write the source into an isolated scratch directory
//! 4. run the compiler with a timeout
//! 5. move the artifact into the cache, or report `BuildFailed`
//!
//! Builds run on the blocking thread pool, at most `max_concurrent` at a
//! time. Concurrent requests for the same recipe share one build.

pub mod cache;
pub mod coalesce;
pub mod compiler;
pub mod template;

pub use cache::{CacheLayout, StaleReason, Staleness, check_staleness, parse_db_timestamp};
pub use coalesce::BuildCoalescer;
pub use compiler::{CompileOutput, CompileStatus, Compiler, Latexmk};
pub use template::{render_template, render_template_file};

use crate::document::DocumentAssembler;
use crate::error::{Error, Result};
use crate::markup::Target;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Default compiler timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Build parameters taken from the configuration
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Document template
    pub template: PathBuf,
    /// Compiler timeout
    pub timeout: Duration,
    /// Keep source and log of failed builds
    pub debug: bool,
    /// Maximum number of simultaneous compiler runs
    pub max_concurrent: usize,
}

impl BuildSettings {
    pub fn new(template: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            timeout: DEFAULT_TIMEOUT,
            debug: false,
            max_concurrent: 2,
        }
    }
}

/// A compiled document ready to be served
#[derive(Debug, Clone, PartialEq)]
pub struct PdfArtifact {
    pub path: PathBuf,
    /// File name offered to the client
    pub download_name: String,
    /// Whether this request triggered a compiler run
    pub rebuilt: bool,
}

/// Download file name for a recipe name
///
/// Spaces become `_`, path separators become `-`.
pub fn download_name(recipe_name: &str) -> String {
    let safe: String = recipe_name
        .chars()
        .map(|c| match c {
            ' ' => '_',
            '/' | '\\' => '-',
            other => other,
        })
        .collect();
    format!("{}.pdf", safe)
}

/// State shared between the async front and blocking build tasks
struct BuildContext {
    assembler: DocumentAssembler,
    compiler: Arc<dyn Compiler>,
    cache: CacheLayout,
    settings: BuildSettings,
}

impl BuildContext {
    fn staleness(&self, id: i64, updated_at: Option<&str>) -> Staleness {
        check_staleness(&self.cache.artifact_path(id), updated_at, &self.settings.template)
    }

    fn fresh_artifact(&self, id: i64, name: &str) -> PdfArtifact {
        PdfArtifact {
            path: self.cache.artifact_path(id),
            download_name: download_name(name),
            rebuilt: false,
        }
    }

    /// Re-check staleness and rebuild if still needed
    fn build_if_stale(&self, id: i64) -> Result<PdfArtifact> {
        let recipe = self
            .assembler
            .store()
            .recipe(id)?
            .ok_or(Error::RecipeNotFound(id))?;

        match self.staleness(id, recipe.updated_at.as_deref()) {
            Staleness::Fresh => {
                debug!("Recipe {} was rebuilt meanwhile, reusing artifact", id);
                Ok(self.fresh_artifact(id, &recipe.name))
            }
            Staleness::Stale(reason) => {
                info!("Building PDF for recipe {} ({})", id, reason.as_str());
                let path = self.build(id)?;
                Ok(PdfArtifact {
                    path,
                    download_name: download_name(&recipe.name),
                    rebuilt: true,
                })
            }
        }
    }

    fn build(&self, id: i64) -> Result<PathBuf> {
        let model = self.assembler.assemble(id, Target::Latex)?;
        let source = render_template_file(&self.settings.template, &model)?;

        let scratch = self.cache.scratch_dir(id)?;
        let workdir = scratch.path();
        let source_path = workdir.join(format!("recipe_{}.tex", id));
        std::fs::write(&source_path, &source).map_err(|e| Error::fs(&source_path, e))?;

        let output = match self
            .compiler
            .compile(workdir, &source_path, self.settings.timeout)
        {
            Ok(output) => output,
            Err(e) => {
                error!("{} could not run for recipe {}: {}", self.compiler.name(), id, e);
                self.keep_debug(id, &source, None);
                return Err(Error::BuildFailed(id));
            }
        };

        let built = source_path.with_extension("pdf");
        if output.status != CompileStatus::TimedOut && built.is_file() {
            if let CompileStatus::Exited(Some(code)) = output.status {
                if code != 0 {
                    warn!("{} exited with {} for recipe {} but produced a document", self.compiler.name(), code, id);
                }
            }
            let path = self.cache.persist_artifact(id, &built)?;
            info!("PDF for recipe {} written to {}", id, path.display());
            return Ok(path);
        }

        error!(
            "PDF build for recipe {} failed: {:?}, no document produced",
            id, output.status
        );
        self.keep_debug(id, &source, output.log.as_deref());
        Err(Error::BuildFailed(id))
    }

    fn keep_debug(&self, id: i64, source: &str, log: Option<&Path>) {
        if self.settings.debug {
            self.cache.write_debug(id, source, log);
            debug!("Debug files for recipe {} kept in {}", id, self.cache.debug_dir().display());
        }
    }
}

/// Serves cached PDFs and rebuilds stale ones
pub struct PdfService {
    ctx: Arc<BuildContext>,
    coalescer: BuildCoalescer<PdfArtifact>,
    permits: Arc<Semaphore>,
}

impl PdfService {
    /// Create the service and its cache directories
    pub fn new(
        assembler: DocumentAssembler,
        compiler: Arc<dyn Compiler>,
        cache: CacheLayout,
        settings: BuildSettings,
    ) -> Result<Self> {
        cache.ensure_dirs()?;
        let permits = Arc::new(Semaphore::new(settings.max_concurrent.max(1)));

        Ok(Self {
            ctx: Arc::new(BuildContext {
                assembler,
                compiler,
                cache,
                settings,
            }),
            coalescer: BuildCoalescer::new(),
            permits,
        })
    }

    pub fn cache(&self) -> &CacheLayout {
        &self.ctx.cache
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.ctx.settings
    }

    /// Builds that were served by another request's compiler run
    pub fn coalesced_builds(&self) -> u64 {
        self.coalescer.coalesced_count()
    }

    /// Current staleness of recipe `id`
    pub async fn staleness(&self, id: i64) -> Result<Staleness> {
        let ctx = Arc::clone(&self.ctx);
        let recipe = blocking(move || ctx.assembler.store().recipe(id))
            .await?
            .ok_or(Error::RecipeNotFound(id))?;
        Ok(self.ctx.staleness(id, recipe.updated_at.as_deref()))
    }

    /// Fresh PDF for recipe `id`, building it if necessary
    pub async fn get_pdf(&self, id: i64) -> Result<PdfArtifact> {
        let ctx = Arc::clone(&self.ctx);
        let recipe = blocking(move || ctx.assembler.store().recipe(id))
            .await?
            .ok_or(Error::RecipeNotFound(id))?;

        if self.ctx.staleness(id, recipe.updated_at.as_deref()).is_fresh() {
            debug!("Serving cached PDF for recipe {}", id);
            return Ok(self.ctx.fresh_artifact(id, &recipe.name));
        }

        self.coalescer
            .coalesce(id, || async {
                let _permit = Arc::clone(&self.permits)
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::TaskError(e.to_string()))?;
                let ctx = Arc::clone(&self.ctx);
                blocking(move || ctx.build_if_stale(id)).await
            })
            .await
    }
}

/// Run blocking work on the blocking pool
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::TaskError(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_name() {
        assert_eq!(download_name("Apfel Kuchen"), "Apfel_Kuchen.pdf");
        assert_eq!(download_name("Brot/Brötchen\\Zopf"), "Brot-Brötchen-Zopf.pdf");
        assert_eq!(download_name(""), ".pdf");
    }

    #[test]
    fn test_default_settings() {
        let settings = BuildSettings::new("templates/master.tex");
        assert_eq!(settings.timeout, Duration::from_secs(300));
        assert!(!settings.debug);
        assert_eq!(settings.max_concurrent, 2);
    }
}
