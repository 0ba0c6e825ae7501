//! Supported languages and their Sarvam language codes.

/// Display name and Sarvam code for each supported language, in listing order.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("English", "en-IN"),
    ("Hindi", "hi-IN"),
    ("Tamil", "ta-IN"),
    ("Telugu", "te-IN"),
    ("Kannada", "kn-IN"),
    ("Malayalam", "ml-IN"),
    ("Bengali", "bn-IN"),
    ("Marathi", "mr-IN"),
    ("Gujarati", "gu-IN"),
    ("Punjabi", "pa-IN"),
];

/// Display names of all supported languages.
pub fn language_names() -> Vec<&'static str> {
    SUPPORTED_LANGUAGES.iter().map(|(name, _)| *name).collect()
}

/// Sarvam code for a display name. Names are matched exactly.
pub fn code_for(name: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_ten_languages_in_order() {
        let names = language_names();
        assert_eq!(names.len(), 10);
        assert_eq!(names.first(), Some(&"English"));
        assert_eq!(names.last(), Some(&"Punjabi"));
    }

    #[test]
    fn resolves_codes() {
        assert_eq!(code_for("Telugu"), Some("te-IN"));
        assert_eq!(code_for("English"), Some("en-IN"));
        assert_eq!(code_for("Klingon"), None);
        assert_eq!(code_for("telugu"), None);
    }
}
