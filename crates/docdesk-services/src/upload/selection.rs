use docdesk_core::models::FileRef;

const BYTES_PER_MIB: f64 = 1_048_576.0;
/// Rough transfer time used for the pre-upload estimate.
const MINUTES_PER_MIB: f64 = 1.5;

/// Files picked for the next batch, before anything is submitted.
///
/// A file with the same name and size as one already selected is ignored.
#[derive(Debug, Default, Clone)]
pub struct FileSelection {
    files: Vec<FileRef>,
}

impl FileSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when an identical (name, size) file was already selected.
    pub fn add(&mut self, file: FileRef) -> bool {
        let duplicate = self
            .files
            .iter()
            .any(|f| f.name == file.name && f.size_bytes == file.size_bytes);
        if duplicate {
            return false;
        }
        self.files.push(file);
        true
    }

    /// Number of files actually added.
    pub fn extend(&mut self, files: impl IntoIterator<Item = FileRef>) -> usize {
        files.into_iter().filter(|f| self.add(f.clone())).count()
    }

    pub fn remove(&mut self, index: usize) -> Option<FileRef> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn files(&self) -> &[FileRef] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    pub fn total_mib(&self) -> f64 {
        self.total_bytes() as f64 / BYTES_PER_MIB
    }

    pub fn estimated_minutes(&self) -> f64 {
        self.total_mib() * MINUTES_PER_MIB
    }

    /// Hand the files to the tracker, leaving the selection empty.
    pub fn take(&mut self) -> Vec<FileRef> {
        std::mem::take(&mut self.files)
    }
}
