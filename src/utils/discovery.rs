use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// PDF files under `input_folder`, sorted by path so batch numbering is stable.
pub fn collect_pdf_files(input_folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(input_folder)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if entry.file_type().is_file() {
            let path = entry.path().to_path_buf();
            if looks_like_pdf(&path) {
                files.push(path);
            }
        }
    }
    files
}

pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn looks_like_pdf(path: &Path) -> bool {
    const MAGIC: &[u8; 5] = b"%PDF-";

    if has_pdf_extension(path) {
        return true;
    }

    if let Ok(mut file) = File::open(path) {
        let mut buffer = [0u8; MAGIC.len()];
        if file.read_exact(&mut buffer).is_ok() {
            return &buffer == MAGIC;
        }
    }
    false
}
