// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use rezept::Result;
use rezept::build::{
    BuildSettings, CacheLayout, CompileOutput, CompileStatus, Compiler, PdfService,
};
use rezept::db;
use rezept::db::models::{Ingredient, Recipe, Step, Unit};
use rezept::document::DocumentAssembler;
use rezept::store::SqliteStore;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

/// Timestamp well before any artifact built during a test
pub const OLD_TIMESTAMP: &str = "2000-01-01 00:00:00";

/// Temporary database, cache root and template.
///
/// Keep the value alive; dropping it removes everything.
pub struct TestEnv {
    pub dir: TempDir,
    pub db_path: PathBuf,
    pub cache_root: PathBuf,
    pub template: PathBuf,
}

impl TestEnv {
    pub fn conn(&self) -> rusqlite::Connection {
        db::open(&self.db_path).unwrap()
    }

    pub fn assembler(&self) -> DocumentAssembler {
        DocumentAssembler::new(Arc::new(SqliteStore::new(&self.db_path)))
    }

    pub fn settings(&self) -> BuildSettings {
        let mut settings = BuildSettings::new(&self.template);
        settings.timeout = Duration::from_secs(10);
        settings
    }

    pub fn pdf_service(&self, compiler: Arc<FakeCompiler>, debug: bool) -> PdfService {
        let mut settings = self.settings();
        settings.debug = debug;
        PdfService::new(
            self.assembler(),
            compiler,
            CacheLayout::new(&self.cache_root),
            settings,
        )
        .unwrap()
    }
}

/// Create a seeded database and a copy of the document template.
///
/// The template mtime is set far in the past so it never invalidates
/// artifacts built during the test.
pub fn setup() -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("rezept.db");
    let cache_root = dir.path().join("cache");
    let template = dir.path().join("master.tex");

    db::init(&db_path).unwrap();

    let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates/master.tex");
    std::fs::copy(&source, &template).unwrap();
    set_mtime(&template, 946_684_800);

    TestEnv {
        dir,
        db_path,
        cache_root,
        template,
    }
}

/// Insert the bread recipe used across tests.
///
/// Step 1 ("**Mix** well") has 2-8.5 g Flour and 1 EL Salz; step 2 is a
/// warning. `updated_at` is reset to [`OLD_TIMESTAMP`].
pub fn seed_recipe(env: &TestEnv) -> i64 {
    let mut conn = env.conn();

    db::transaction(&mut conn, |tx| {
        let mut recipe = Recipe::new("Omas Brot".to_string());
        recipe.author = Some("Oma".to_string());
        recipe.preamble = Some("Für 4 PP".to_string());
        let recipe_id = recipe.insert(tx)?;

        let mut mix = Step::new(recipe_id, 1, "**Mix** well".to_string());
        mix.category_id = Some(1);
        let mix_id = mix.insert(tx)?;

        let gram = Unit::find_by_symbol(tx, "g")?.and_then(|u| u.id);
        let el = Unit::find_by_symbol(tx, "EL")?.and_then(|u| u.id);

        let mut flour = Ingredient::new(mix_id, 1, "Flour".to_string());
        flour.amount_min = Some(2.0);
        flour.amount_max = Some(8.5);
        flour.unit_id = gram;
        flour.insert(tx)?;

        let mut salt = Ingredient::new(mix_id, 2, "Salz".to_string());
        salt.amount_min = Some(1.0);
        salt.unit_id = el;
        salt.insert(tx)?;

        let mut warning = Step::new(recipe_id, 2, "Ofen auf 220 °C vorheizen!".to_string());
        warning.category_id = Some(2);
        warning.insert(tx)?;

        Recipe::set_updated_at(tx, recipe_id, OLD_TIMESTAMP)?;
        Ok(recipe_id)
    })
    .unwrap()
}

/// Set the mtime of `path` to `secs` after the epoch.
pub fn set_mtime(path: &Path, secs: i64) {
    filetime::set_file_mtime(path, filetime::FileTime::from_unix_time(secs, 0)).unwrap();
}

pub fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).unwrap().as_secs()
}

/// Compiler stand-in that counts runs.
///
/// Writes `<source>.pdf` next to the source unless configured to fail.
pub struct FakeCompiler {
    calls: AtomicUsize,
    delay: Duration,
    produce: bool,
    last_source: Mutex<Option<String>>,
}

impl FakeCompiler {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            produce: true,
            last_source: Mutex::new(None),
        }
    }

    /// Sleep this long inside every run
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Never produce a document
    pub fn failing() -> Self {
        Self {
            produce: false,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Source text of the most recent run
    pub fn last_source(&self) -> Option<String> {
        self.last_source.lock().unwrap().clone()
    }
}

impl Compiler for FakeCompiler {
    fn compile(&self, workdir: &Path, source: &Path, _timeout: Duration) -> Result<CompileOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_source.lock().unwrap() = std::fs::read_to_string(source).ok();

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let log = workdir.join("compile.log");
        std::fs::write(&log, "This is FakeTeX\n! Undefined control sequence.\n")?;

        if self.produce {
            std::fs::write(source.with_extension("pdf"), b"%PDF-1.5\n%fake\n")?;
            Ok(CompileOutput {
                status: CompileStatus::Exited(Some(0)),
                log: Some(log),
            })
        } else {
            Ok(CompileOutput {
                status: CompileStatus::Exited(Some(1)),
                log: Some(log),
            })
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}
