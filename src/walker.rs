//! Source file walker with gitignore support and default exclusions.
//!
//! Wraps the `ignore` crate's `WalkBuilder` to provide a file walker that:
//! - Respects `.gitignore` rules
//! - Skips common build/dependency directories by default
//! - Skips hidden files/directories except `.github`
//! - Applies extra ignore globs from `[ignore] patterns`
//! - Yields only files whose extension maps to a supported language
//!
//! Paths come back sorted so that extraction order, and therefore output
//! order, is stable across runs.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ignore::overrides::OverrideBuilder;
use ignore::{WalkBuilder, WalkState};

use crate::extract::{Lang, detect_language};

/// Directories that are always excluded from walks, regardless of `.gitignore`.
const DEFAULT_EXCLUSIONS: &[&str] = &[
    "node_modules",
    "vendor",
    "target",
    "build",
    "dist",
    "__pycache__",
    ".venv",
];

/// Hidden directory names that are NOT excluded (i.e., they are allowed
/// even though hidden directories are otherwise skipped).
const HIDDEN_ALLOWLIST: &[&str] = &[".github"];

/// A file-system walker that respects `.gitignore` and applies default
/// exclusions.
pub struct Walker {
    root: PathBuf,
    threads: usize,
    patterns: Vec<String>,
    languages: Option<Vec<Lang>>,
}

impl Walker {
    /// Create a new walker rooted at the given path.
    ///
    /// The path may be a subdirectory of a repository; the walker will still
    /// respect `.gitignore` files from parent directories.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            threads: 0, // 0 means ignore crate picks a sensible default
            patterns: Vec::new(),
            languages: None,
        }
    }

    /// Set the number of threads used for parallel walking.
    ///
    /// A value of `0` (the default) lets the `ignore` crate choose.
    pub fn threads(mut self, n: usize) -> Self {
        self.threads = n;
        self
    }

    /// Exclude paths matching these gitignore-style globs.
    pub fn ignore_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Restrict the walk to files of these languages. By default every
    /// supported language is accepted.
    pub fn languages(mut self, langs: &[Lang]) -> Self {
        self.languages = Some(langs.to_vec());
        self
    }

    fn wanted(&self, path: &Path) -> bool {
        match (detect_language(path), &self.languages) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(lang), Some(allowed)) => allowed.contains(&lang),
        }
    }

    /// Build the underlying `WalkBuilder` with all our configuration applied.
    fn make_builder(&self) -> Result<WalkBuilder, ignore::Error> {
        let mut builder = WalkBuilder::new(&self.root);

        // Let the ignore crate handle .gitignore, .ignore, etc.
        builder.standard_filters(true);

        // The built-in hidden filter is replaced by the allowlist below.
        builder.hidden(false);

        // In the overrides system, a glob WITHOUT `!` means "include only",
        // and a glob WITH `!` means "exclude".
        let mut overrides = OverrideBuilder::new(&self.root);
        for dir in DEFAULT_EXCLUSIONS {
            overrides.add(&format!("!{dir}/"))?;
        }
        for pattern in &self.patterns {
            let pattern = pattern.trim();
            if pattern.is_empty() {
                continue;
            }
            overrides.add(&format!("!{}", pattern.trim_start_matches('!')))?;
        }
        builder.overrides(overrides.build()?);

        // Skip hidden entries (name starts with `.`) unless allowlisted.
        builder.filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') {
                // The root entry itself (depth 0) always passes through.
                if entry.depth() == 0 {
                    return true;
                }
                return HIDDEN_ALLOWLIST.iter().any(|a| *a == &*name);
            }
            true
        });

        if self.threads > 0 {
            builder.threads(self.threads);
        }

        Ok(builder)
    }

    /// Walk the file tree sequentially and collect all supported source files.
    pub fn collect_paths(&self) -> Result<Vec<PathBuf>, ignore::Error> {
        let builder = self.make_builder()?;
        let mut paths = Vec::new();
        for result in builder.build() {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    tracing::debug!(%err, "walk entry skipped");
                    continue;
                }
            };
            if entry.file_type().is_some_and(|ft| ft.is_file()) && self.wanted(entry.path()) {
                paths.push(entry.into_path());
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Walk the file tree in parallel and collect all supported source files.
    ///
    /// This uses the `ignore` crate's `WalkParallel` for concurrent directory
    /// traversal across multiple threads.
    pub fn collect_paths_parallel(&self) -> Result<Vec<PathBuf>, ignore::Error> {
        let builder = self.make_builder()?;
        let paths: Arc<Mutex<Vec<PathBuf>>> = Arc::new(Mutex::new(Vec::new()));
        let parallel = builder.build_parallel();

        parallel.run(|| {
            let paths = Arc::clone(&paths);
            Box::new(move |result| {
                let entry = match result {
                    Ok(e) => e,
                    Err(_) => return WalkState::Continue,
                };
                if entry.file_type().is_some_and(|ft| ft.is_file()) && self.wanted(entry.path()) {
                    // A poisoned lock only means another visitor panicked.
                    let mut guard = paths.lock().unwrap_or_else(|e| e.into_inner());
                    guard.push(entry.into_path());
                }
                WalkState::Continue
            })
        });

        let mut paths = match Arc::try_unwrap(paths) {
            Ok(m) => m.into_inner().unwrap_or_else(|e| e.into_inner()),
            Err(shared) => shared.lock().unwrap_or_else(|e| e.into_inner()).clone(),
        };
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Helper: create a temporary directory tree for testing.
    struct TestDir {
        dir: tempfile::TempDir,
    }

    impl TestDir {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        /// Create a file (and any necessary parent directories).
        fn create_file(&self, relative: &str) {
            let p = self.dir.path().join(relative);
            if let Some(parent) = p.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&p, "content").unwrap();
        }
    }

    /// Collect paths relative to the test root, sorted for determinism.
    fn sorted_relative(root: &Path, paths: &[PathBuf]) -> Vec<String> {
        let mut rel: Vec<String> = paths
            .iter()
            .filter_map(|p| {
                p.strip_prefix(root)
                    .ok()
                    .map(|r| r.to_string_lossy().replace('\\', "/"))
            })
            .collect();
        rel.sort();
        rel
    }

    #[test]
    fn respects_gitignore() {
        let td = TestDir::new();
        // The ignore crate only respects .gitignore inside a git repository.
        fs::create_dir(td.path().join(".git")).unwrap();
        td.create_file("keep.go");
        td.create_file("generated.go");
        fs::write(td.path().join(".gitignore"), "generated.go\n").unwrap();

        let paths = Walker::new(td.path()).collect_paths().unwrap();
        let rel = sorted_relative(td.path(), &paths);

        assert_eq!(rel, vec!["keep.go"]);
    }

    #[test]
    fn skips_default_exclusions() {
        let td = TestDir::new();
        td.create_file("src/main.c");
        td.create_file("node_modules/pkg/index.js");
        td.create_file("vendor/lib.go");
        td.create_file("target/debug/gen.c");
        td.create_file("build/output.js");
        td.create_file("dist/bundle.js");
        td.create_file("__pycache__/mod.py");
        td.create_file(".venv/lib/site.py");

        let paths = Walker::new(td.path()).collect_paths().unwrap();
        let rel = sorted_relative(td.path(), &paths);

        assert_eq!(rel, vec!["src/main.c"], "only src/main.c should survive, got: {rel:?}");
    }

    #[test]
    fn skips_hidden_except_github() {
        let td = TestDir::new();
        td.create_file("visible.py");
        td.create_file(".hidden/secret.py");
        td.create_file(".github/scripts/release.py");

        let paths = Walker::new(td.path()).collect_paths().unwrap();
        let rel = sorted_relative(td.path(), &paths);

        assert!(rel.contains(&"visible.py".to_string()));
        assert!(rel.contains(&".github/scripts/release.py".to_string()), "got: {rel:?}");
        assert!(!rel.iter().any(|p| p.starts_with(".hidden")));
    }

    #[test]
    fn only_supported_languages() {
        let td = TestDir::new();
        td.create_file("a.go");
        td.create_file("b.rs");
        td.create_file("README.md");
        td.create_file("c.tsx");

        let paths = Walker::new(td.path()).collect_paths().unwrap();
        assert_eq!(sorted_relative(td.path(), &paths), vec!["a.go", "c.tsx"]);
    }

    #[test]
    fn language_filter_narrows_walk() {
        let td = TestDir::new();
        td.create_file("a.go");
        td.create_file("b.py");
        td.create_file("c.php");

        let paths = Walker::new(td.path())
            .languages(&[Lang::Python, Lang::Php])
            .collect_paths()
            .unwrap();
        assert_eq!(sorted_relative(td.path(), &paths), vec!["b.py", "c.php"]);
    }

    #[test]
    fn extra_patterns_exclude() {
        let td = TestDir::new();
        td.create_file("src/app.ts");
        td.create_file("src/app.test.ts");
        td.create_file("fixtures/big.c");

        let paths = Walker::new(td.path())
            .ignore_patterns(["*.test.ts", "fixtures/", "  "])
            .collect_paths()
            .unwrap();
        assert_eq!(sorted_relative(td.path(), &paths), vec!["src/app.ts"]);
    }

    #[test]
    fn path_restriction_works() {
        let td = TestDir::new();
        td.create_file("src/main.go");
        td.create_file("src/util.go");
        td.create_file("tests/integration.go");

        let src = td.path().join("src");
        let paths = Walker::new(&src).collect_paths().unwrap();
        assert_eq!(sorted_relative(&src, &paths), vec!["main.go", "util.go"]);
    }

    #[test]
    fn parallel_walk_finds_same_files() {
        let td = TestDir::new();
        td.create_file("a.py");
        td.create_file("b.c");
        td.create_file("sub/c.go");
        td.create_file("node_modules/pkg/d.js");
        td.create_file(".hidden/e.ts");

        let walker = Walker::new(td.path());
        let seq = walker.collect_paths().unwrap();
        let par = walker.collect_paths_parallel().unwrap();

        assert_eq!(seq, par, "sequential and parallel walks should find the same files");
    }
}
