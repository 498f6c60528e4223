use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

pub const UNKNOWN_MERCHANT: &str = "Unknown";

const MAX_MERCHANT_CHARS: usize = 40;

/// Payment-rail vocabulary removed as whole tokens, in this order.
const NOISE_WORDS: [&str; 14] = [
    "POS",
    "PURCHASE",
    "DEBIT",
    "CREDIT",
    "ONLINE",
    "PAYMENT",
    "WITHDRAWAL",
    "ACH",
    "CHECKCARD",
    "CHECK CARD",
    "CARD",
    "REF",
    "ID",
    "AUTH",
];

/// Qualifiers stripped by plain substring match when deriving a merchant key.
const KEY_QUALIFIERS: [&str; 4] = ["TRIAL", "PENDING", "VERIFY", "VERIFICATION"];

// Removed tokens become spaces, so one pass over the alternation never exposes
// a new match.
static NOISE_WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = NOISE_WORDS
        .iter()
        .map(|word| regex::escape(word))
        .collect::<Vec<String>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("noise word pattern is valid")
});

static REFERENCE_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*#]\s*\d+").expect("reference number pattern is valid"));

type Stage = fn(&str) -> String;

const NORMALIZE_PIPELINE: [(&str, Stage); 7] = [
    ("uppercase", uppercase),
    ("noise_words", strip_noise_words),
    ("reference_numbers", strip_reference_numbers),
    ("digits", strip_digits),
    ("character_class", keep_merchant_characters),
    ("whitespace", collapse_whitespace),
    ("truncate", truncate_merchant),
];

/// Turns a raw bank description into a readable merchant name.
///
/// Never fails: input that cleans down to nothing becomes `"Unknown"`.
pub fn normalize_merchant(raw_description: &str) -> String {
    let mut current = raw_description.to_string();
    for (stage_name, stage) in NORMALIZE_PIPELINE {
        current = stage(&current);
        trace!(stage = stage_name, value = %current, "merchant normalization stage");
    }
    title_or_unknown(&current)
}

/// Coarser key used to correlate trial and paid charges across naming drift,
/// so "Disney Plus Trial" and "Disney Plus" share one key.
///
/// Qualifiers are removed as substrings, so they are also stripped from inside
/// longer words.
pub fn merchant_key(merchant: &str) -> String {
    let mut upper = merchant.to_uppercase();
    for qualifier in KEY_QUALIFIERS {
        upper = upper.replace(qualifier, " ");
    }
    title_or_unknown(&collapse_whitespace(&upper))
}

pub(crate) fn uppercase(value: &str) -> String {
    value.to_uppercase()
}

pub(crate) fn strip_noise_words(value: &str) -> String {
    NOISE_WORD_PATTERN.replace_all(value, " ").into_owned()
}

pub(crate) fn strip_reference_numbers(value: &str) -> String {
    REFERENCE_NUMBER_PATTERN.replace_all(value, " ").into_owned()
}

pub(crate) fn strip_digits(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut previous_digit = false;
    for character in value.chars() {
        if character.is_numeric() {
            if !previous_digit {
                output.push(' ');
            }
            previous_digit = true;
        } else {
            output.push(character);
            previous_digit = false;
        }
    }
    output
}

pub(crate) fn keep_merchant_characters(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut previous_replaced = false;
    for character in value.chars() {
        if character.is_ascii_uppercase() || character == '&' || character == ' ' {
            output.push(character);
            previous_replaced = false;
        } else if !previous_replaced {
            output.push(' ');
            previous_replaced = true;
        }
    }
    output
}

pub(crate) fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<&str>>().join(" ")
}

pub(crate) fn truncate_merchant(value: &str) -> String {
    if value.chars().count() <= MAX_MERCHANT_CHARS {
        return value.to_string();
    }
    let truncated = value.chars().take(MAX_MERCHANT_CHARS).collect::<String>();
    truncated.trim().to_string()
}

pub(crate) fn title_case(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut previous_cased = false;
    for character in value.chars() {
        if character.is_alphabetic() {
            if previous_cased {
                output.extend(character.to_lowercase());
            } else {
                output.extend(character.to_uppercase());
            }
            previous_cased = true;
        } else {
            output.push(character);
            previous_cased = false;
        }
    }
    output
}

fn title_or_unknown(value: &str) -> String {
    if value.is_empty() {
        return UNKNOWN_MERCHANT.to_string();
    }
    title_case(value)
}

#[cfg(test)]
mod tests {
    use super::{
        NOISE_WORD_PATTERN, NOISE_WORDS, REFERENCE_NUMBER_PATTERN, keep_merchant_characters,
        merchant_key, normalize_merchant, strip_noise_words, strip_reference_numbers, title_case,
        truncate_merchant,
    };

    #[test]
    fn every_pattern_compiles() {
        for word in NOISE_WORDS {
            assert!(NOISE_WORD_PATTERN.is_match(word), "{word} is not matched");
        }
        assert!(REFERENCE_NUMBER_PATTERN.is_match("#12"));
    }

    #[test]
    fn strips_rail_noise_and_reference_numbers() {
        assert_eq!(
            normalize_merchant("POS PURCHASE NETFLIX.COM #1234 CA"),
            "Netflix Com Ca"
        );
        assert_eq!(
            normalize_merchant("CHECKCARD 0412 SPOTIFY USA *99812"),
            "Spotify Usa"
        );
        assert_eq!(
            normalize_merchant("Debit Card Purchase - Trader Joe's 552"),
            "Trader Joe S"
        );
    }

    #[test]
    fn noise_words_only_match_whole_tokens() {
        assert_eq!(strip_noise_words("IDAHO POWER"), "IDAHO POWER");
        assert_eq!(strip_noise_words("CARDINAL HEALTH"), "CARDINAL HEALTH");
        assert_eq!(strip_noise_words("CHECK CARD ACME"), "  ACME");
        assert_eq!(strip_noise_words("POS-ACME"), " -ACME");
    }

    #[test]
    fn reference_numbers_allow_whitespace_after_marker() {
        assert_eq!(strip_reference_numbers("SHOP # 8812 X"), "SHOP   X");
        assert_eq!(strip_reference_numbers("AMZN*77"), "AMZN ");
    }

    #[test]
    fn character_filter_keeps_ampersand() {
        assert_eq!(keep_merchant_characters("AT&T.COM/BILL"), "AT&T COM BILL");
        assert_eq!(normalize_merchant("AT&T WIRELESS"), "At&T Wireless");
    }

    #[test]
    fn empty_or_noise_only_input_becomes_unknown() {
        assert_eq!(normalize_merchant(""), "Unknown");
        assert_eq!(normalize_merchant("   "), "Unknown");
        assert_eq!(normalize_merchant("ACH DEBIT 12345 #99"), "Unknown");
    }

    #[test]
    fn output_is_bounded_to_forty_characters() {
        let long = "SUPERCALIFRAGILISTIC EXPIALIDOCIOUS WONDERFUL EMPORIUM OF GOODS";
        let normalized = normalize_merchant(long);
        assert!(normalized.chars().count() <= 40);
        assert!(!normalized.ends_with(' '));
        assert_eq!(
            truncate_merchant("ABCDEFGHIJ ABCDEFGHIJ ABCDEFGHIJ ABCDEF XYZ"),
            "ABCDEFGHIJ ABCDEFGHIJ ABCDEFGHIJ ABCDEF"
        );
        assert_eq!(
            truncate_merchant("ABCDEFGHIJ ABCDEFGHIJ ABCDEFGHIJ ABCDEFG HIJ"),
            "ABCDEFGHIJ ABCDEFGHIJ ABCDEFGHIJ ABCDEFG"
        );
    }

    #[test]
    fn normalization_is_idempotent_on_its_own_output() {
        for raw in [
            "POS PURCHASE NETFLIX.COM #1234 CA",
            "ach payment   geico   auto 00981",
            "SQ *BLUE BOTTLE COFFEE 4412",
            "",
            "AT&T WIRELESS",
        ] {
            let once = normalize_merchant(raw);
            assert_eq!(normalize_merchant(&once), once);
        }
    }

    #[test]
    fn title_case_lowercases_after_letters() {
        assert_eq!(title_case("BLUE BOTTLE"), "Blue Bottle");
        assert_eq!(title_case("o'reilly"), "O'Reilly");
    }

    #[test]
    fn merchant_key_merges_trial_variants() {
        assert_eq!(merchant_key("Disney Plus Trial"), "Disney Plus");
        assert_eq!(merchant_key("Disney Plus"), "Disney Plus");
        assert_eq!(merchant_key("Pending Verification Hulu"), "Hulu");
    }

    #[test]
    fn merchant_key_strips_qualifiers_inside_words() {
        assert_eq!(merchant_key("Trialtech"), "Tech");
        assert_eq!(merchant_key("Trial"), "Unknown");
    }
}
