use serde::Serialize;

/// Fallback blurb for shaders whose documentation has no body paragraph.
pub const DEFAULT_DESCRIPTION: &str = "Cursor effect shader";

const NAME_PREFIX: &str = "cursor_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShaderEntry {
    /// Display title, e.g. `Digital Dissolve`.
    pub name: String,
    /// GLSL source file name.
    pub file: String,
    /// Identifier the other names derive from, e.g. `cursor_digital_dissolve`.
    pub base_name: String,
    /// Markdown documentation file name.
    pub markdown_file: String,
}

impl ShaderEntry {
    pub fn from_base_name(base_name: &str) -> Self {
        let base_name = base_name.trim();
        Self {
            name: shader_title(base_name),
            file: format!("{base_name}.glsl"),
            base_name: base_name.to_string(),
            markdown_file: format!("{base_name}.md"),
        }
    }

    /// True when `query` names this entry by title or base name.
    pub fn matches(&self, query: &str) -> bool {
        self.name == query || self.base_name == query
    }
}

/// Turns `cursor_pastel_sparkle` into `Pastel Sparkle`.
pub fn shader_title(base_name: &str) -> String {
    base_name
        .strip_prefix(NAME_PREFIX)
        .unwrap_or(base_name)
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First body line after the document title, skipping nested headings.
pub fn extract_description(markdown: &str) -> String {
    let mut found_title = false;
    for line in markdown.lines().map(str::trim) {
        if !found_title {
            if line.starts_with('#') {
                found_title = true;
            }
            continue;
        }
        if !line.is_empty() && !line.starts_with('#') {
            return line.to_string();
        }
    }
    DEFAULT_DESCRIPTION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_names_from_base() {
        let entry = ShaderEntry::from_base_name("cursor_digital_dissolve");
        assert_eq!(entry.name, "Digital Dissolve");
        assert_eq!(entry.file, "cursor_digital_dissolve.glsl");
        assert_eq!(entry.markdown_file, "cursor_digital_dissolve.md");
        assert!(entry.matches("Digital Dissolve"));
        assert!(entry.matches("cursor_digital_dissolve"));
        assert!(!entry.matches("dissolve"));
    }

    #[test]
    fn title_keeps_names_without_prefix() {
        assert_eq!(shader_title("glow"), "Glow");
        assert_eq!(shader_title("cursor_manga__slash"), "Manga Slash");
    }

    #[test]
    fn description_is_first_body_line_after_title() {
        let markdown = "# Rainbow Cursor\n\n## Overview\nCycles hues along the trail.\nMore text.";
        assert_eq!(extract_description(markdown), "Cycles hues along the trail.");
    }

    #[test]
    fn description_falls_back_without_body() {
        assert_eq!(extract_description("# Only a title\n## Section"), DEFAULT_DESCRIPTION);
        assert_eq!(extract_description("no heading at all"), DEFAULT_DESCRIPTION);
    }
}
