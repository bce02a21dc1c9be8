//! Extension-based selection of files to transform

/// Decides which files are transformed and what they are renamed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPolicy {
    /// Allowed extensions without the leading dot, longest first
    extensions: Vec<String>,
    target_extension: String,
}

impl ExtensionPolicy {
    /// `extensions` may contain compound extensions such as `es6.js`
    pub fn new(extensions: &[String], target_extension: &str) -> Self {
        let mut extensions: Vec<String> = extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        // Prefer the most specific match (`es6.js` before `js`)
        extensions.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        extensions.dedup();

        Self {
            extensions,
            target_extension: target_extension.trim_start_matches('.').to_string(),
        }
    }

    /// Extension of `relative_path` that matched the allow-list, if any.
    ///
    /// Only the file name is matched, so a dot-file such as `lib/.js` has no
    /// extension.
    pub fn matched_extension(&self, relative_path: &str) -> Option<&str> {
        let file_name = relative_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(relative_path);

        self.extensions
            .iter()
            .find(|ext| {
                file_name.len() > ext.len() + 1
                    && file_name.ends_with(ext.as_str())
                    && file_name[..file_name.len() - ext.len()].ends_with('.')
            })
            .map(String::as_str)
    }

    /// Whether `relative_path` should go through the transform
    pub fn can_process(&self, relative_path: &str) -> bool {
        self.matched_extension(relative_path).is_some()
    }

    /// Path the output is written to. Files that are not processed keep
    /// their path.
    pub fn output_path(&self, relative_path: &str) -> String {
        match self.matched_extension(relative_path) {
            Some(ext) => format!(
                "{}{}",
                &relative_path[..relative_path.len() - ext.len()],
                self.target_extension
            ),
            None => relative_path.to_string(),
        }
    }
}
