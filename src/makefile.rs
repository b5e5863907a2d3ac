use std::path::Path;

use crate::{
    shader::{scan::DependencyFragment, ShaderFile},
    toolchain::Toolchain,
};

/// Name of the generated file inside each shader directory.
pub const FILE_NAME: &str = "Makefile";

/// A dependency fragment completed with the recipe that compiles the shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRule {
    text: String,
}

impl BuildRule {
    pub fn new(shader: &ShaderFile, fragment: &DependencyFragment, toolchain: &Toolchain) -> Self {
        let mut text = fragment.as_str().to_owned();
        if !text.ends_with('\n') {
            text.push('\n');
        }

        // make requires recipe lines to start with a tab
        text.push('\t');
        text.push_str(&compile_command(shader, toolchain));

        BuildRule { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Command line compiling `shader` into its artifact.
pub fn compile_command(shader: &ShaderFile, toolchain: &Toolchain) -> String {
    let mut words = vec![toolchain.compile_command()];
    words.extend(shader.stage_flags(toolchain));

    // the compiler would otherwise name the module `Foo.hlsl.spv`
    if shader.stage().is_hlsl() {
        words.push("-o".into());
        words.push(shader.artifact().into());
    }

    words.push(shader.name().into());
    words.join(" ")
}

/// Joins the `all` target and every rule into the makefile's contents.
///
/// The result has no trailing newline.
pub fn render(shaders: &[ShaderFile], rules: &[BuildRule]) -> String {
    let artifacts: Vec<&str> = shaders.iter().map(ShaderFile::artifact).collect();

    let mut contents = format!("all: {}", artifacts.join(" "));
    contents.truncate(contents.trim_end().len());
    contents.push_str("\n\n");

    let rules: Vec<&str> = rules.iter().map(BuildRule::as_str).collect();
    contents.push_str(&rules.join("\n\n"));
    contents
}

/// Replaces `path` with `contents` in a single write.
pub fn write(path: &Path, contents: &str) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shader(name: &str) -> ShaderFile {
        ShaderFile::new(name, &Toolchain::default()).unwrap()
    }

    fn rule(name: &str, fragment: &str) -> BuildRule {
        let shader = shader(name);
        let fragment = DependencyFragment::parse(fragment.into(), &shader).unwrap();
        BuildRule::new(&shader, &fragment, &Toolchain::default())
    }

    #[test]
    fn native_rule_has_tab_indented_recipe() {
        let rule = rule("shader.vert", "shader.vert.spv: shader.vert common.glsl\n");
        assert_eq!(
            rule.as_str(),
            "shader.vert.spv: shader.vert common.glsl\n\tglslc -O -Os -c shader.vert"
        );
    }

    #[test]
    fn fragment_without_newline_gets_one() {
        let rule = rule("a.comp", "a.comp.spv: a.comp");
        assert_eq!(rule.as_str(), "a.comp.spv: a.comp\n\tglslc -O -Os -c a.comp");
    }

    #[test]
    fn hlsl_recipe_names_entry_point_and_output() {
        let rule = rule("Foo.hlsl", "Foo.spv: Foo.hlsl\n");
        assert_eq!(
            rule.as_str(),
            "Foo.spv: Foo.hlsl\n\
             \tglslc -O -Os -c -fshader-stage=compute -fentry-point=Foo -o Foo.spv Foo.hlsl"
        );
    }

    #[test]
    fn multi_line_fragment_is_kept_verbatim() {
        let fragment = "big.frag.spv: big.frag \\\n  lighting.glsl\n";
        let rule = rule("big.frag", fragment);
        assert!(rule.as_str().starts_with(fragment));
        assert_eq!(rule.as_str().lines().count(), 3);
    }

    #[test]
    fn renders_target_then_rules_without_trailing_newline() {
        let shaders = [shader("a.vert"), shader("b.frag")];
        let rules = [
            rule("a.vert", "a.vert.spv: a.vert\n"),
            rule("b.frag", "b.frag.spv: b.frag shared.glsl\n"),
        ];

        assert_eq!(
            render(&shaders, &rules),
            "all: a.vert.spv b.frag.spv\n\n\
             a.vert.spv: a.vert\n\tglslc -O -Os -c a.vert\n\n\
             b.frag.spv: b.frag shared.glsl\n\tglslc -O -Os -c b.frag"
        );
    }

    #[test]
    fn write_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        std::fs::write(&path, "hand written\n".repeat(100)).unwrap();

        write(&path, "all: a.vert.spv").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "all: a.vert.spv");
    }
}
