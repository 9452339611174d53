use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// One command per line, the way bibtex itself emits them.
regex!(CITATION_REGEX, r"^\\citation\{([^}]+)\}$");
regex!(BIBDATA_REGEX, r"^\\bibdata\{([^}]+)\}$");
// Comment marker left behind by a redirect to preserve the original list.
regex!(REDIRECT_MARKER_REGEX, r"^%\\bibcachedata\{([^}]+)\}$");
