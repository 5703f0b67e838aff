//! Folding of free-text product labels into catalog lookup keys.
//!
//! Catalog product names are folded with the same function before they are
//! compared, so the output must stay stable byte-for-byte across releases.

/// Fold a display name into its canonical lookup key.
///
/// Lower-cases, folds accented Latin vowels, drops every character that is
/// neither an ASCII word character nor whitespace, collapses whitespace runs
/// and trims. `normalize(normalize(x)) == normalize(x)` for every input.
pub fn normalize(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.to_lowercase().chars() {
        let ch = fold_vowel(ch);
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if !is_word_char(ch) {
            continue;
        }
        if pending_space && !key.is_empty() {
            key.push(' ');
        }
        pending_space = false;
        key.push(ch);
    }

    key
}

fn fold_vowel(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        other => other,
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_diacritics_and_punctuation_are_ignored() {
        assert_eq!(normalize("CPU Núcleo!"), normalize("cpu nucleo"));
        assert_eq!(normalize("CPU Núcleo!"), "cpu nucleo");
    }

    #[test]
    fn test_uppercase_accents_fold_after_lowercasing() {
        assert_eq!(normalize("ÁÉÍÓÚ àèìòù ÄËÏÖÜ âêîôû"), "aeiou aeiou aeiou aeiou");
    }

    #[test]
    fn test_other_accented_characters_are_stripped() {
        assert_eq!(normalize("Señal Façade"), "seal faade");
    }

    #[test]
    fn test_whitespace_is_collapsed_and_trimmed() {
        assert_eq!(normalize("  EVGA\t550   B5 \n 550W  "), "evga 550 b5 550w");
    }

    #[test]
    fn test_punctuation_between_tokens_does_not_leave_spaces() {
        assert_eq!(
            normalize("Transcend MTE245S 250GB M.2-2280"),
            "transcend mte245s 250gb m22280"
        );
        assert_eq!(
            normalize("Samsung 32 GB (1x 32GB) 2133MHz"),
            "samsung 32 gb 1x 32gb 2133mhz"
        );
    }

    #[test]
    fn test_punctuation_only_token_collapses_surrounding_whitespace() {
        assert_eq!(normalize("AMD - Ryzen"), "amd ryzen");
    }

    #[test]
    fn test_underscore_and_digits_are_kept() {
        assert_eq!(normalize("part_no 42"), "part_no 42");
    }

    #[test]
    fn test_empty_and_symbol_only_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  ¡¿!?  "), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "AMD Ryzen 9 7900X 4.70GHz AM5",
            "ASRock Z87 Extreme3 LGA1150 ATX",
            "KOLINK Observatory Y ARGB ATX Mid Tower",
            "Gigabyte AORUS MASTER 8GB GeForce RTX 3070",
            "  Ñandú   Pingüino!!  ",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }
}
