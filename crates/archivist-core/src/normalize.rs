//! Text normalization, tokenization, and language detection.
//!
//! Every component that looks at text (chunker, embedder, lexical index)
//! goes through these helpers so that "a token" means the same thing
//! everywhere: a maximal run of non-whitespace characters, lower-cased.

use whatlang::Lang;

/// Sentinel returned when the language of a text cannot be determined.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Collapse every whitespace run to a single ASCII space and trim the ends.
///
/// Unicode whitespace (including the non-breaking space `U+00A0`) counts as
/// whitespace.
///
/// ```rust
/// use archivist_core::normalize::normalize;
///
/// assert_eq!(normalize("  a\u{a0}\u{a0}b\n\tc  "), "a b c");
/// ```
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split on whitespace and lower-case each token.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Best-effort language detection.
///
/// Returns an ISO 639-1 code for common languages, the ISO 639-3 code for
/// the rest, or [`UNKNOWN_LANGUAGE`] when the detector has no reliable
/// answer (empty, very short, or mixed text). Never fails.
pub fn detect_language(text: &str) -> String {
    match whatlang::detect(text) {
        Some(info) if info.is_reliable() => iso_code(info.lang()).to_string(),
        Some(info) => {
            tracing::debug!(
                lang = info.lang().code(),
                confidence = info.confidence(),
                "language detection not reliable"
            );
            UNKNOWN_LANGUAGE.to_string()
        }
        None => UNKNOWN_LANGUAGE.to_string(),
    }
}

fn iso_code(lang: Lang) -> &'static str {
    match lang {
        Lang::Eng => "en",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Nld => "nl",
        Lang::Rus => "ru",
        Lang::Ukr => "uk",
        Lang::Pol => "pl",
        Lang::Swe => "sv",
        Lang::Tur => "tr",
        Lang::Ara => "ar",
        Lang::Hin => "hi",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Cmn => "zh",
        other => other.code(),
    }
}
