/// Controls how definition documents are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// When true, documents with keys the loader does not know are rejected.
    pub strict_mode: bool,
    /// When true, a later definition replaces an earlier one with the same name or id.
    pub allow_redefinition: bool,
    /// Maximum number of documents loaded from a directory.
    pub max_documents_from_directory: usize,
    /// Maximum bytes allowed per document loaded from a directory.
    pub max_document_file_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            allow_redefinition: false,
            max_documents_from_directory: 256,
            max_document_file_size: 1024 * 1024,
        }
    }
}
