use url::Url;

/// Outcome of classifying raw user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub is_url: bool,
}

/// Classify `input` as a navigable URL or a search phrase.
///
/// Only absolute `http`/`https` URLs count. Anything that fails to parse, or
/// parses with another scheme, is a search phrase.
pub fn classify(input: &str) -> Classification {
    let is_url = match Url::parse(input) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    };
    Classification { is_url }
}
