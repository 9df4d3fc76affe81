//! Mojibake repair for text lifted out of candidate-list documents.
//!
//! Repair is generate-and-score: a fixed list of strategies each proposes a
//! candidate string, and the candidate with the best score wins. Scoring only
//! looks at corruption markers and Portuguese accented letters, so it can be
//! tested without any document at hand.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// A byte in 0x80..=0xBF as it shows up after a Latin-1 or Windows-1252 decode.
const CONTINUATION: &str = "[\\x{80}-\\x{BF}€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ]";

const ACCENTED: &str = "áéíóúâêôãõçàÁÉÍÓÚÂÊÔÃÕÇÀ";

const CLEAN_BONUS: i64 = 1_000;
const MARKER_PENALTY: i64 = 100;
const MAX_GARBLED_PASSES: usize = 3;

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "[ÃÂ]{c}|â{c}{{2}}|â€|\\x{{FFFD}}",
        c = CONTINUATION
    ))
    .expect("valid mojibake marker regex")
});

static GARBLED_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "[\\x{{C2}}-\\x{{DF}}]{c}|[\\x{{E0}}-\\x{{EF}}]{c}{{2}}|[\\x{{F0}}-\\x{{F4}}]{c}{{3}}",
        c = CONTINUATION
    ))
    .expect("valid garbled run regex")
});

/// Punctuation whose UTF-8 bytes are most often shown through Windows-1252.
const EXPLICIT_TARGETS: [char; 8] = ['–', '—', '“', '”', '‘', '’', '…', '€'];

static EXPLICIT_FIXES: LazyLock<Vec<(String, char)>> = LazyLock::new(|| {
    EXPLICIT_TARGETS
        .iter()
        .map(|target| (garble(*target), *target))
        .collect()
});

type Strategy = fn(&str) -> Option<String>;

const STRATEGIES: [Strategy; 4] = [
    keep_input,
    fix_garbled_runs,
    round_trip_single_byte,
    explicit_fixes,
];

/// Returns the best repair of `text`, NFC-normalized and trimmed.
pub fn repair(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let mut candidates = Vec::<String>::with_capacity(STRATEGIES.len());
    for strategy in STRATEGIES {
        let Some(candidate) = strategy(text) else {
            continue;
        };
        let candidate = normalize(&candidate);
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }

    let mut best: Option<(i64, String)> = None;
    for candidate in candidates {
        let candidate_score = score(&candidate);
        match &best {
            Some((best_score, _)) if *best_score >= candidate_score => {}
            _ => best = Some((candidate_score, candidate)),
        }
    }

    best.map(|(_, text)| text).unwrap_or_default()
}

pub fn is_corrupted(text: &str) -> bool {
    MARKER_RE.is_match(text)
}

pub fn marker_count(text: &str) -> usize {
    MARKER_RE.find_iter(text).count()
}

pub fn score(text: &str) -> i64 {
    let markers = marker_count(text) as i64;
    let accents = text.chars().filter(|ch| ACCENTED.contains(*ch)).count() as i64;
    let bonus = if markers == 0 { CLEAN_BONUS } else { 0 };

    bonus + accents - markers * MARKER_PENALTY
}

fn normalize(text: &str) -> String {
    text.nfc().collect::<String>().trim().to_string()
}

fn keep_input(text: &str) -> Option<String> {
    Some(text.to_string())
}

fn fix_garbled_runs(text: &str) -> Option<String> {
    let mut current = text.to_string();

    for _ in 0..MAX_GARBLED_PASSES {
        let next = GARBLED_RUN_RE
            .replace_all(&current, |captures: &regex::Captures<'_>| {
                let run = &captures[0];
                to_single_bytes(run)
                    .and_then(|bytes| String::from_utf8(bytes).ok())
                    .unwrap_or_else(|| run.to_string())
            })
            .into_owned();

        if next == current {
            break;
        }
        current = next;
    }

    Some(current)
}

fn round_trip_single_byte(text: &str) -> Option<String> {
    let bytes = to_single_bytes(text)?;
    String::from_utf8(bytes).ok()
}

fn explicit_fixes(text: &str) -> Option<String> {
    Some(apply_explicit_fixes(text))
}

fn apply_explicit_fixes(text: &str) -> String {
    let mut fixed = text.to_string();
    for (pattern, replacement) in EXPLICIT_FIXES.iter() {
        if fixed.contains(pattern.as_str()) {
            fixed = fixed.replace(pattern.as_str(), &replacement.to_string());
        }
    }
    fixed
}

fn to_single_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars().map(single_byte).collect()
}

fn single_byte(ch: char) -> Option<u8> {
    let code = ch as u32;
    if code <= 0xFF {
        return Some(code as u8);
    }

    let mut buf = [0_u8; 4];
    let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode(ch.encode_utf8(&mut buf));
    if had_errors || bytes.len() != 1 {
        return None;
    }
    Some(bytes[0])
}

/// What `ch` looks like after its UTF-8 bytes are decoded as Windows-1252.
fn garble(ch: char) -> String {
    let mut buf = [0_u8; 4];
    let bytes = ch.encode_utf8(&mut buf).as_bytes();
    encoding_rs::WINDOWS_1252
        .decode_without_bom_handling(bytes)
        .0
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repair_fixes_common_mojibake() {
        assert_eq!(repair("JoÃ£o"), "João");
        assert_eq!(repair("PESSOAS â€“ ANIMAIS"), "PESSOAS – ANIMAIS");
        assert_eq!(repair("ClÃ¡udia"), "Cláudia");
    }

    #[test]
    fn repair_leaves_clean_portuguese_alone() {
        assert_eq!(repair("Câmara Municipal"), "Câmara Municipal");
        assert_eq!(repair("  Assembleia de Freguesia "), "Assembleia de Freguesia");
        assert_eq!(repair("Conceição"), "Conceição");
    }

    #[test]
    fn repair_handles_mixed_clean_and_garbled_text() {
        assert_eq!(repair("Câmara - JoÃ£o Simões"), "Câmara - João Simões");
    }

    #[test]
    fn repair_unwinds_double_encoding() {
        assert_eq!(repair("JoÃƒÂ£o"), "João");
    }

    #[test]
    fn repair_normalizes_decomposed_accents() {
        assert_eq!(repair("Joa\u{303}o"), "João");
    }

    #[test]
    fn repair_of_empty_input_is_empty() {
        assert_eq!(repair(""), "");
        assert_eq!(repair("   "), "");
    }

    #[test]
    fn repair_is_idempotent_once_clean() {
        for (input, expected) in [
            ("JoÃ£o", "João"),
            ("Lista â€“ PS", "Lista – PS"),
            ("Maria Sousa", "Maria Sousa"),
            ("ClÃ¡udia Conceição", "Cláudia Conceição"),
            ("â‚¬ 5", "€ 5"),
        ] {
            let once = repair(input);
            assert_eq!(once, expected);
            assert!(!is_corrupted(&once), "{once} should be clean");
            assert_eq!(repair(&once), once);
        }
    }

    #[test]
    fn euro_mojibake_is_flagged_and_repaired() {
        assert!(is_corrupted("Custo 10 â‚¬"));
        assert_eq!(marker_count("Custo 10 â‚¬"), 1);
        assert_eq!(repair("Custo 10 â‚¬"), "Custo 10 €");
        assert!(!is_corrupted("Câmara São Brás"));
    }

    #[test]
    fn explicit_fix_patterns_are_always_repaired() {
        for (pattern, target) in EXPLICIT_FIXES.iter() {
            let input = format!("Lista {pattern} Norte");
            let repaired = repair(&input);
            assert!(!is_corrupted(&repaired), "{input} -> {repaired}");
            assert!(repaired.contains(*target), "{input} -> {repaired}");
        }
    }

    #[test]
    fn explicit_fixes_cover_quotes_and_euro() {
        assert_eq!(apply_explicit_fixes("â€œSimâ€\u{9d}"), "“Sim”");
        assert_eq!(apply_explicit_fixes("10 â‚¬"), "10 €");
    }

    #[test]
    fn is_corrupted_ignores_legitimate_accents() {
        assert!(!is_corrupted("Câmara"));
        assert!(!is_corrupted("JOÃO"));
        assert!(!is_corrupted("São Brás"));
        assert!(is_corrupted("JoÃ£o"));
        assert!(is_corrupted("a \u{FFFD} b"));
        assert!(is_corrupted("â€“"));
    }

    #[test]
    fn score_prefers_clean_text_with_accents() {
        assert!(score("João") > score("JoÃ£o"));
        assert!(score("João") > score("Joao"));
        assert!(score("Ã£ Ã£") < score("Ã£"));
    }

    #[test]
    fn round_trip_drops_text_that_is_not_single_byte() {
        assert_eq!(round_trip_single_byte("Câmara"), None);
        assert_eq!(round_trip_single_byte("日本"), None);
        assert_eq!(round_trip_single_byte("JoÃ£o").as_deref(), Some("João"));
    }
}
