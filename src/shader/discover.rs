use std::path::Path;

use super::{ShaderFile, Stage};
use crate::toolchain::Toolchain;

/// Lists the shaders directly inside `dir`.
///
/// GLSL files come first, grouped by stage in [`Stage::NATIVE`] order and sorted by name
/// within each stage. The allow-listed HLSL files that exist follow in their configured
/// order.
pub fn discover(dir: &Path, toolchain: &Toolchain) -> Result<Vec<ShaderFile>, walkdir::Error> {
    let mut names = Vec::new();

    let entries = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            // the directory itself could not be read
            Err(error) if error.depth() == 0 => return Err(error),
            Err(error) => {
                warn!("skipping unreadable entry: {error}");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        match entry.file_name().to_str() {
            Some(name) if !name.starts_with('.') => names.push(name.to_owned()),
            Some(_) => {}
            None => debug!(path = ?entry.path(), "skipping non UTF-8 file name"),
        }
    }

    let mut shaders = Vec::new();

    for stage in Stage::NATIVE {
        let matches = names
            .iter()
            .filter_map(|name| ShaderFile::new(name.as_str(), toolchain))
            .filter(|shader| shader.stage() == stage);
        shaders.extend(matches);
    }

    for name in &toolchain.hlsl_files {
        if !names.contains(name) {
            continue;
        }

        match ShaderFile::new(name.as_str(), toolchain) {
            Some(shader) if shader.stage().is_hlsl() => shaders.push(shader),
            _ => warn!(%name, "allow-listed file is not an HLSL shader"),
        }
    }

    debug!(?dir, count = shaders.len(), "discovered shaders");

    Ok(shaders)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "").unwrap();
    }

    fn names(shaders: &[ShaderFile]) -> Vec<&str> {
        shaders.iter().map(ShaderFile::name).collect()
    }

    #[test]
    fn orders_by_stage_then_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["z.comp", "b.frag", "a.frag", "m.geom", "x.vert", "t.tese", "t.tesc"] {
            touch(dir.path(), name);
        }

        let shaders = discover(dir.path(), &Toolchain::default()).unwrap();
        assert_eq!(
            names(&shaders),
            ["x.vert", "t.tesc", "t.tese", "m.geom", "a.frag", "b.frag", "z.comp"]
        );
    }

    #[test]
    fn appends_allow_listed_hlsl_in_declared_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Alpha.hlsl", "Beta.hlsl", "Unlisted.hlsl", "a.vert"] {
            touch(dir.path(), name);
        }

        let toolchain = Toolchain {
            hlsl_files: vec!["Beta.hlsl".into(), "Missing.hlsl".into(), "Alpha.hlsl".into()],
            ..Default::default()
        };

        let shaders = discover(dir.path(), &toolchain).unwrap();
        assert_eq!(names(&shaders), ["a.vert", "Beta.hlsl", "Alpha.hlsl"]);
        assert_eq!(shaders[1].stage(), Stage::SpecialCompute);
    }

    #[test]
    fn ignores_other_files_and_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "common.glsl");
        touch(dir.path(), "a.vert.spv");
        touch(dir.path(), "Makefile");
        touch(dir.path(), ".hidden.frag");
        std::fs::create_dir(dir.path().join("nested.vert")).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub"), "deep.frag");

        let shaders = discover(dir.path(), &Toolchain::default()).unwrap();
        assert!(shaders.is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(&dir.path().join("absent"), &Toolchain::default()).is_err());
    }
}
