use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    makefile::{self, BuildRule},
    shader::{
        discover::discover,
        scan::{DependencyScanner, ScanError},
    },
    toolchain::Toolchain,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("could not list shaders")]
    Discovery(#[from] walkdir::Error),

    #[error("could not scan dependencies of `{shader}`")]
    Scan {
        shader: String,
        #[source]
        source: ScanError,
    },

    #[error("`{first}` and `{second}` both compile to `{artifact}`")]
    DuplicateArtifact {
        artifact: String,
        first: String,
        second: String,
    },

    #[error("could not write {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to a directory that was processed without errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Written { makefile: PathBuf, shaders: usize },
    /// No shaders matched, so nothing was written.
    Empty,
}

/// Generates the makefile for the shaders in `dir`.
///
/// Nothing is written unless every shader was scanned successfully, so on error an
/// existing makefile is left as it was.
pub fn process_directory(
    dir: &Path,
    toolchain: &Toolchain,
    scanner: &dyn DependencyScanner,
) -> Result<Outcome, Error> {
    if !dir.is_dir() {
        return Err(Error::NotADirectory(dir.to_owned()));
    }

    let shaders = discover(dir, toolchain)?;
    if shaders.is_empty() {
        warn!(?dir, "no shaders found, skipping");
        return Ok(Outcome::Empty);
    }

    let mut artifacts = HashMap::new();
    for shader in &shaders {
        if let Some(first) = artifacts.insert(shader.artifact(), shader.name()) {
            return Err(Error::DuplicateArtifact {
                artifact: shader.artifact().to_owned(),
                first: first.to_owned(),
                second: shader.name().to_owned(),
            });
        }
    }

    let mut rules = Vec::with_capacity(shaders.len());
    for shader in &shaders {
        let fragment = scanner
            .scan(dir, shader)
            .map_err(|source| Error::Scan {
                shader: shader.name().to_owned(),
                source,
            })?;
        rules.push(BuildRule::new(shader, &fragment, toolchain));
    }

    let contents = makefile::render(&shaders, &rules);
    let path = dir.join(makefile::FILE_NAME);
    makefile::write(&path, &contents).map_err(|source| Error::Write {
        path: path.clone(),
        source,
    })?;

    info!(?path, shaders = shaders.len(), "wrote makefile");

    Ok(Outcome::Written {
        makefile: path,
        shaders: shaders.len(),
    })
}

/// Result of every directory passed to [`run`], in input order.
#[derive(Debug)]
pub struct Report {
    pub results: Vec<(PathBuf, Result<Outcome, Error>)>,
}

impl Report {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|(_, result)| result.is_err()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }
}

/// Processes each directory in turn. A failing directory does not stop the others.
pub fn run<I, P>(dirs: I, toolchain: &Toolchain, scanner: &dyn DependencyScanner) -> Report
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut results = Vec::new();

    for dir in dirs {
        let dir = dir.as_ref();
        let result = process_directory(dir, toolchain, scanner);
        if let Err(error) = &result {
            error!(?dir, "{}", chain(error));
        }
        results.push((dir.to_owned(), result));
    }

    Report { results }
}

/// Formats an error followed by all of its sources, separated by `: `.
pub fn chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(next) = source {
        message.push_str(": ");
        message.push_str(&next.to_string());
        source = next.source();
    }
    message
}
