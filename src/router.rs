use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use symdex::config::Config;
use symdex::errors::SymdexError;
use symdex::extract::{Extractor, Lang};
use symdex::output::{GrepSink, JsonLinesSink, KindFilter, resolve_color};
use symdex::pipeline::{self, BatchStats, EntrySink};
use symdex::types::ContextType;
use symdex::walker::Walker;

use crate::cli::{Cli, Command, ExtractArgs};

pub fn dispatch(cli: Cli) -> Result<(), SymdexError> {
    match cli.command {
        Command::Extract(args) => extract(args),
        Command::Languages => languages(),
    }
}

fn languages() -> Result<(), SymdexError> {
    let mut out = std::io::stdout().lock();
    for lang in Lang::ALL {
        writeln!(out, "{}\t{}", lang.name(), lang.extensions().join(" "))?;
    }
    Ok(())
}

fn parse_kinds(raw: &[String]) -> Result<Vec<ContextType>, SymdexError> {
    raw.iter()
        .map(|k| k.trim().parse::<ContextType>().map_err(SymdexError::Usage))
        .collect()
}

fn extract(args: ExtractArgs) -> Result<(), SymdexError> {
    let kinds = parse_kinds(&args.kind)?;
    let root = match args.root {
        Some(r) => r,
        None => std::env::current_dir()?,
    };
    if !root.is_dir() {
        return Err(SymdexError::Usage(format!("root is not a directory: {}", root.display())));
    }

    let config = Config::load(Some(&root)).map_err(|e| SymdexError::Config(format!("{e:#}")))?;
    let extractor = Extractor::new(config.extract_options(), Arc::new(config.stopword_filter()));
    let json = args.json || config.output.default_format == "json";

    let paths = gather(&root, &args.paths, &config)?;
    tracing::info!(root = %root.display(), files = paths.len(), "extracting");

    let stdout = std::io::stdout().lock();
    let stats = if json {
        run(&extractor, &paths, &root, KindFilter::new(JsonLinesSink::new(stdout), kinds))?
    } else {
        let color = resolve_color(&config.output.color);
        run(&extractor, &paths, &root, KindFilter::new(GrepSink::new(stdout, color), kinds))?
    };

    if stats.failures > 0 {
        tracing::warn!(failures = stats.failures, "some files could not be extracted");
    }
    Ok(())
}

fn run(
    extractor: &Extractor,
    paths: &[PathBuf],
    root: &Path,
    mut sink: impl EntrySink,
) -> Result<BatchStats, SymdexError> {
    Ok(pipeline::extract_paths(extractor, paths, root, &mut sink)?)
}

/// Expand the requested paths: directories are walked, files are taken as
/// given. No paths means the whole root.
fn gather(
    root: &Path,
    requested: &[PathBuf],
    config: &Config,
) -> Result<Vec<PathBuf>, SymdexError> {
    let walk = |dir: &Path| {
        Walker::new(dir)
            .ignore_patterns(config.ignore.patterns.iter().cloned())
            .collect_paths()
            .map_err(|e| SymdexError::Usage(format!("invalid ignore pattern: {e}")))
    };
    if requested.is_empty() {
        return walk(root);
    }
    let mut paths = Vec::new();
    for path in requested {
        let path = if path.is_absolute() { path.clone() } else { root.join(path) };
        if path.is_dir() {
            paths.extend(walk(&path)?);
        } else if path.exists() {
            paths.push(path);
        } else {
            return Err(SymdexError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file or directory: {}", path.display()),
            )));
        }
    }
    Ok(paths)
}
