use regex::RegexBuilder;

/// A piece of rendered cell text, flagged when it matched a search keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub matched: bool,
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            matched: false,
        }
    }

    fn hit(text: &str) -> Self {
        Self {
            text: text.to_string(),
            matched: true,
        }
    }
}

/// Split `text` into plain and keyword-matching segments.
///
/// Matching is case-insensitive and literal. At any position the longest
/// keyword wins. Joining the segment texts gives back `text` unchanged.
pub fn highlight<S: AsRef<str>>(text: &str, keywords: &[S]) -> Vec<Segment> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut terms: Vec<&str> = keywords
        .iter()
        .map(|k| normalize_keyword(k.as_ref()))
        .filter(|k| !k.is_empty())
        .collect();
    if terms.is_empty() {
        return vec![Segment::plain(text)];
    }
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    terms.dedup();

    let pattern = terms
        .iter()
        .map(|term| regex::escape(term))
        .collect::<Vec<_>>()
        .join("|");
    let matcher = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(matcher) => matcher,
        Err(err) => {
            console_logging::console_warn!("Keyword pattern rejected: {}", err);
            return vec![Segment::plain(text)];
        }
    };

    let mut segments = Vec::new();
    let mut cursor = 0;
    for found in matcher.find_iter(text) {
        if found.start() > cursor {
            segments.push(Segment::plain(&text[cursor..found.start()]));
        }
        segments.push(Segment::hit(found.as_str()));
        cursor = found.end();
    }
    if cursor < text.len() {
        segments.push(Segment::plain(&text[cursor..]));
    }
    segments
}

/// Search-bar keywords arrive as `'error'` or `  timeout `.
fn normalize_keyword(raw: &str) -> &str {
    raw.trim().trim_matches('\'').trim()
}
