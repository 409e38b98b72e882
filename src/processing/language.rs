//! Language detection for repository files.
//!
//! Detection is by file name first, then extension, then shebang. Only
//! languages with an extraction profile are reported.

use std::collections::HashMap;
use std::path::Path;

use crate::ast_engine::LanguageId;

/// Maps file paths to the language whose profile should extract them.
pub struct LanguageDetector {
    extension_map: HashMap<&'static str, LanguageId>,
    filename_map: HashMap<&'static str, LanguageId>,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector {
    /// Create a detector with the default mappings.
    pub fn new() -> Self {
        let mut extension_map = HashMap::new();

        // Python
        for ext in ["py", "pyi", "pyw"] {
            extension_map.insert(ext, LanguageId::Python);
        }

        // JavaScript
        for ext in ["js", "mjs", "cjs", "jsx"] {
            extension_map.insert(ext, LanguageId::JavaScript);
        }

        extension_map.insert("ts", LanguageId::TypeScript);
        extension_map.insert("mts", LanguageId::TypeScript);
        extension_map.insert("cts", LanguageId::TypeScript);
        extension_map.insert("go", LanguageId::Go);
        extension_map.insert("rs", LanguageId::Rust);
        extension_map.insert("java", LanguageId::Java);
        extension_map.insert("rb", LanguageId::Ruby);
        extension_map.insert("rake", LanguageId::Ruby);

        let mut filename_map = HashMap::new();
        filename_map.insert("Rakefile", LanguageId::Ruby);
        filename_map.insert("Gemfile", LanguageId::Ruby);

        Self {
            extension_map,
            filename_map,
        }
    }

    /// Detect the language of `path`, consulting `content` for a shebang.
    pub fn detect(&self, path: &Path, content: Option<&[u8]>) -> Option<LanguageId> {
        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if let Some(&language) = self.filename_map.get(filename) {
            return Some(language);
        }

        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if let Some(&language) = self.extension_map.get(ext.to_lowercase().as_str()) {
                return Some(language);
            }
        }

        content
            .filter(|c| c.starts_with(b"#!"))
            .and_then(|c| c.split(|&b| b == b'\n').next())
            .and_then(|line| std::str::from_utf8(line).ok())
            .and_then(detect_from_shebang)
    }
}

fn detect_from_shebang(shebang: &str) -> Option<LanguageId> {
    let lower = shebang.to_lowercase();

    if lower.contains("python") {
        Some(LanguageId::Python)
    } else if lower.contains("node") || lower.contains("deno") {
        Some(LanguageId::JavaScript)
    } else if lower.contains("ruby") {
        Some(LanguageId::Ruby)
    } else {
        None
    }
}
