use std::sync::LazyLock;

use log::debug;
use regex::Regex;

/// `Title (1999) anything.iso`
static PARENTHESIZED_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+)\(([0-9]+)\).*\.iso$").expect("valid filename pattern")
});

/// `Title.1999.Extended.iso`, only tried when the parenthesized form does not match.
static RELEASE_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)[. _-]((?:19|20)[0-9]{2})(?:[. _-].*)?\.iso$")
        .expect("valid release filename pattern")
});

/// Title and year inferred from a disc image file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub title: String,
    pub year: String,
}

/// Extracts the movie title and year from `file_name`.
///
/// Returns `None` when the name carries no recognisable year, in which case the
/// caller skips the file.
pub fn parse_file_name(file_name: &str) -> Option<ParsedName> {
    let captures = PARENTHESIZED_YEAR
        .captures(file_name)
        .or_else(|| RELEASE_YEAR.captures(file_name))?;

    let parsed = ParsedName {
        title: sanitize_title(&captures[1]),
        year: captures[2].trim().to_string(),
    };
    // Nothing left to search for, e.g. "...(1999).iso".
    if parsed.title.is_empty() {
        return None;
    }
    debug!("Parsed {:?} as {:?}", file_name, parsed);
    Some(parsed)
}

/// Replaces every character that is neither alphanumeric nor an apostrophe with a
/// space, then trims the ends.
pub fn sanitize_title(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect::<String>()
        .trim()
        .to_string()
}
