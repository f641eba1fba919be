use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Default cap on the torrent-internal path length (folder + `/` + file).
pub const DEFAULT_PATH_CAP: usize = 180;
/// Volume substituted when a name carries none.
pub const DEFAULT_VOLUME: &str = "vol_01";
/// Extension assumed when the caller provides no hint.
pub const DEFAULT_EXTENSION: &str = ".m4b";
/// Separator counted between folder and file inside a torrent.
pub const TORRENT_PATH_SEPARATOR: &str = "/";

// `{ASIN.B0CW3NF5NY}`, `{ID.ABC123}`: capture excludes the braces.
regex!(IDENTIFIER_REGEX, r"\{([A-Z][A-Z0-9]*\.[A-Z0-9]+)\}");
regex!(TRAILING_TAG_REGEX, r"\s*\[([^\]]+)\]\s*$");
regex!(TRAILING_GROUP_REGEX, r"\s*\(([^)]+)\)\s*$");
regex!(TRAILING_YEAR_REGEX, r"\s*\(((?:19|20)\d{2})\)\s*$");
regex!(VOLUME_TOKEN_REGEX, r"(?i)\b(vol(?:ume)?(?:_|\.|\s)\s*\d+(?:\.\d+)?)\b");
regex!(VOLUME_NUMBER_REGEX, r"(\d+)(?:\.(\d+))?");
