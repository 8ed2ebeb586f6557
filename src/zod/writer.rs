use log::{debug, info};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Writer for the generated schema and integration test files
pub struct TypeScriptWriter {
    /// Base directory for output files
    output_dir: PathBuf,

    /// Whether to create directories if they don't exist
    create_dirs: bool,
}

/// Result type for writer operations
pub type WriterResult<T> = Result<T, io::Error>;

impl TypeScriptWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P, create_dirs: bool) -> Self {
        TypeScriptWriter {
            output_dir: output_dir.as_ref().to_path_buf(),
            create_dirs,
        }
    }

    /// Write a file relative to the output directory
    pub fn write_file(&self, filename: &str, content: &str) -> WriterResult<PathBuf> {
        let file_path = self.output_dir.join(filename);

        if self.create_dirs {
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent)?;
            }
        }

        debug!("Writing file: {}", file_path.display());
        fs::write(&file_path, content)?;
        info!("Successfully wrote file: {}", file_path.display());

        Ok(file_path)
    }

    pub fn write_files(&self, files: &[(String, String)]) -> WriterResult<()> {
        for (filename, content) in files {
            self.write_file(filename, content)?;
        }

        Ok(())
    }

    pub fn get_file_path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }

    /// Import specifier for `target` as seen from a file in the output directory
    pub fn module_reference<P: AsRef<Path>>(&self, target: P) -> String {
        module_reference(&self.output_dir, target.as_ref())
    }
}

/// Relative import specifier from `from_dir` to `target`, extension dropped
pub fn module_reference(from_dir: &Path, target: &Path) -> String {
    let target = target.with_extension("");
    let from: Vec<Component> = from_dir
        .components()
        .filter(|c| *c != Component::CurDir)
        .collect();
    let to: Vec<Component> = target
        .components()
        .filter(|c| *c != Component::CurDir)
        .collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for component in &to[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }

    let reference = parts.join("/");
    if reference.starts_with("..") {
        reference
    } else {
        format!("./{}", reference)
    }
}
