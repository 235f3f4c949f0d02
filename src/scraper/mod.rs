pub mod events;
pub mod pairing;
pub mod races;
pub mod results;
pub mod tree;

pub use ::scraper::Html;

/// Parse raw markup into a document tree.
pub fn parse_document(markup: &str) -> Html {
    Html::parse_document(markup)
}

/// Resolve a potentially relative link against `base_url`.
pub(crate) fn normalize_url(base_url: &str, href: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("{base_url}{href}")
    } else {
        format!("{base_url}/{href}")
    }
}

/// Table header text as a dictionary key: lower-cased, spaces replaced with underscores.
pub(crate) fn standardize_header(header: &str) -> String {
    tree::collapse_whitespace(header)
        .to_lowercase()
        .replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        let base = "https://www.ucimtbworldseries.com/";
        assert_eq!(
            normalize_url(base, "/results/event/1"),
            "https://www.ucimtbworldseries.com/results/event/1"
        );
        assert_eq!(
            normalize_url(base, "results/event/1"),
            "https://www.ucimtbworldseries.com/results/event/1"
        );
        assert_eq!(
            normalize_url(base, "//cdn.example.com/a"),
            "https://cdn.example.com/a"
        );
        assert_eq!(
            normalize_url(base, "https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn test_standardize_header() {
        assert_eq!(standardize_header("  Rank "), "rank");
        assert_eq!(standardize_header("Time\n  Gap"), "time_gap");
        assert_eq!(standardize_header("UCI Points"), "uci_points");
    }
}
