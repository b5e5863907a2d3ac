use std::time::Duration;

/// Fixed description of the compiler the generated makefiles drive.
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Program used both for dependency scanning and in the makefile recipes.
    pub compiler: String,

    /// Flags placed before any per-shader flags in every recipe.
    pub compile_flags: Vec<String>,

    /// Extension given to compiled modules (without the dot).
    pub artifact_extension: String,

    /// HLSL files picked up in addition to the native stage patterns, in order.
    pub hlsl_files: Vec<String>,

    /// Stage passed to the compiler for HLSL files.
    pub hlsl_stage: String,

    /// Upper bound on how long a single dependency scan may take.
    pub scan_timeout: Duration,
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain {
            compiler: "glslc".into(),
            compile_flags: vec!["-O".into(), "-Os".into(), "-c".into()],
            artifact_extension: "spv".into(),
            hlsl_files: vec!["ReduceDepthBuffer.hlsl".into()],
            hlsl_stage: "compute".into(),
            scan_timeout: Duration::from_secs(30),
        }
    }
}

impl Toolchain {
    /// The recipe prefix shared by every shader, e.g. `glslc -O -Os -c`.
    pub fn compile_command(&self) -> String {
        let mut command = self.compiler.clone();
        for flag in &self.compile_flags {
            command.push(' ');
            command.push_str(flag);
        }
        command
    }
}
