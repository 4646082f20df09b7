//! Fenced code block extraction

use regex::Regex;

/// Default fence language
pub const DEFAULT_LANGUAGE: &str = "python";

/// Return the bodies of every ```` ```<language> ```` fenced block in
/// `text`, in order of appearance.
///
/// The fence tag must match `language` exactly and be followed by a
/// newline; the body runs up to the next newline-then-fence.
///
/// # Examples
/// ```
/// use quorum_engine::code::extract_code;
///
/// let reply = "Here you go:\n```python\nprint('hi')\n```";
/// assert_eq!(extract_code(reply, "python"), vec!["print('hi')"]);
/// ```
pub fn extract_code(text: &str, language: &str) -> Vec<String> {
    let pattern = format!(r"(?s)```{}\n(.*?)\n```", regex::escape(language));

    match Regex::new(&pattern) {
        Ok(re) => re
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|body| body.as_str().to_string())
            .collect(),
        Err(e) => {
            tracing::warn!("Invalid code fence pattern for '{}': {}", language, e);
            Vec::new()
        }
    }
}
