//! Language identification (whatlang).
//!
//! Pure in-process detection; never fails past this boundary. Undetermined
//! input yields the `und` code with zero confidence.

/// ISO 639-3 code returned when no language can be determined.
pub const UNDETERMINED: &str = "und";

/// Detect the dominant language of a text.
///
/// Returns the ISO 639-3 code and a confidence in `0.0..=1.0`.
pub fn detect(text: &str) -> (&'static str, f64) {
    let flattened = text.replace('\n', " ");
    let trimmed = flattened.trim();
    if trimmed.is_empty() {
        return (UNDETERMINED, 0.0);
    }

    match whatlang::detect(trimmed) {
        Some(info) => (info.lang().code(), info.confidence()),
        None => (UNDETERMINED, 0.0),
    }
}

/// Flag emoji for a detected language, falling back to the globe.
pub fn flag(code: &str) -> &'static str {
    match code {
        "eng" => "🇺🇸",
        "fra" => "🇫🇷",
        "spa" => "🇪🇸",
        "deu" => "🇩🇪",
        "ita" => "🇮🇹",
        "por" => "🇵🇹",
        "ara" => "🇸🇦",
        "pes" => "🇮🇷",
        "cmn" => "🇨🇳",
        "rus" => "🇷🇺",
        "kor" => "🇰🇷",
        "jpn" => "🇯🇵",
        "tur" => "🇹🇷",
        "hin" => "🇮🇳",
        _ => "🌐",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_obvious_languages() {
        let (code, confidence) = detect("The quick brown fox jumps over the lazy dog");
        assert_eq!(code, "eng");
        assert!(confidence > 0.0);

        let (code, _) = detect("Je voudrais une baguette et un café s'il vous plaît");
        assert_eq!(code, "fra");
    }

    #[test]
    fn empty_input_is_undetermined_not_an_error() {
        assert_eq!(detect(""), (UNDETERMINED, 0.0));
        assert_eq!(detect("  \n "), (UNDETERMINED, 0.0));
    }

    #[test]
    fn unknown_codes_fall_back_to_globe() {
        assert_eq!(flag("eng"), "🇺🇸");
        assert_eq!(flag("und"), "🌐");
        assert_eq!(flag("xyz"), "🌐");
    }
}
