use derive_new::new;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Eq, PartialEq, new)]
pub struct FileSpec {
    pub path: PathBuf,
    pub content: String,
}

pub fn write_file(file_spec: FileSpec) {
    if let Some(parent) = file_spec.path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }

    std::fs::write(&file_spec.path, file_spec.content).expect("Failed to write file");
}

/// Write `files_count` files with generated names and contents directly below `dir`
pub fn write_generated_files(dir: &Path, files_count: usize) -> Vec<FileSpec> {
    use fake::Fake;
    use fake::faker::lorem::en::{Word, Words};

    (0..files_count)
        .map(|i| {
            let name = format!("{}-{i}.txt", Word().fake::<String>());
            let content = Words(5..10).fake::<Vec<String>>().join(" ");
            let spec = FileSpec::new(dir.join(name), content);
            write_file(spec.clone());
            spec
        })
        .collect()
}
