use std::path::Path;

/// Checks if a file should be searched based on its extension.
///
/// `extensions` must already be normalized (lowercase, no leading dot, see
/// [`SearchConfig::normalized_extensions`](crate::config::SearchConfig::normalized_extensions)).
/// An empty list accepts every file.
pub fn has_valid_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            let ext = ext.to_lowercase();
            extensions.iter().any(|e| *e == ext)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_valid_extension() {
        let extensions = vec!["txt".to_string()];
        assert!(has_valid_extension(Path::new("notes.txt"), &extensions));
        assert!(!has_valid_extension(Path::new("notes.log"), &extensions));

        // Test case insensitivity
        assert!(has_valid_extension(Path::new("NOTES.TXT"), &extensions));
        assert!(has_valid_extension(Path::new("dir/notes.Txt"), &extensions));

        // No extension
        assert!(!has_valid_extension(Path::new("README"), &extensions));
        // Dotfiles have no extension
        assert!(!has_valid_extension(Path::new(".txt"), &extensions));
        // Only the last extension counts
        assert!(!has_valid_extension(Path::new("archive.txt.gz"), &extensions));
    }

    #[test]
    fn test_non_ascii_extensions_ignore_case() {
        let config = crate::SearchConfig::default().with_allowed_extensions([".Ärger"]);
        let extensions = config.normalized_extensions();
        assert_eq!(extensions, vec!["ärger"]);

        assert!(has_valid_extension(Path::new("brief.ÄRGER"), &extensions));
        assert!(has_valid_extension(Path::new("brief.ärger"), &extensions));
        assert!(!has_valid_extension(Path::new("brief.arger"), &extensions));
    }

    #[test]
    fn test_empty_extension_list_accepts_everything() {
        let no_extensions: Vec<String> = Vec::new();
        assert!(has_valid_extension(Path::new("main.rs"), &no_extensions));
        assert!(has_valid_extension(Path::new("Makefile"), &no_extensions));
    }
}
