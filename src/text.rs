//! Text folding shared by SQL search and in-memory filters.
//!
//! `fold_text` lowercases and removes Latin diacritics. The same function
//! backs the `fold()` SQL function, so store-side `LIKE` searches and
//! in-memory filtering agree on what matches.

/// Lowercase and strip diacritics (é → e, Ç → c, œ → oe).
pub fn fold_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => out.push('a'),
            'ç' | 'Ç' => out.push('c'),
            'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => out.push('e'),
            'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => out.push('i'),
            'ñ' | 'Ñ' => out.push('n'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => out.push('o'),
            'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => out.push('u'),
            'ý' | 'ÿ' | 'Ý' | 'Ÿ' => out.push('y'),
            'æ' | 'Æ' => out.push_str("ae"),
            'œ' | 'Œ' => out.push_str("oe"),
            'ß' => out.push_str("ss"),
            // Combining marks left behind by decomposed input
            '\u{0300}'..='\u{036f}' => {}
            other => out.extend(other.to_lowercase()),
        }
    }
    out
}

/// Case- and accent-insensitive substring match. An empty needle matches.
pub fn matches_text(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || fold_text(haystack).contains(&fold_text(needle))
}

/// `Some` only when the value is present and not blank.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_french_accents() {
        assert_eq!(fold_text("Hélène Gaëtan"), "helene gaetan");
        assert_eq!(fold_text("FRANÇOIS"), "francois");
        assert_eq!(fold_text("Cœur"), "coeur");
    }

    #[test]
    fn strips_combining_marks() {
        assert_eq!(fold_text("e\u{0301}le\u{0300}ve"), "eleve");
    }

    #[test]
    fn match_ignores_case_and_accents() {
        assert!(matches_text("Dupont", "dup"));
        assert!(matches_text("Élodie", "elo"));
        assert!(matches_text("elodie", "ÉLO"));
        assert!(!matches_text("Martin", "dup"));
    }

    #[test]
    fn empty_needle_matches_everything() {
        assert!(matches_text("anything", ""));
        assert!(matches_text("anything", "   "));
    }

    #[test]
    fn non_blank_filters_whitespace() {
        assert_eq!(non_blank(&Some("  ".into())), None);
        assert_eq!(non_blank(&None), None);
        assert_eq!(non_blank(&Some(" dup ".into())), Some("dup"));
    }
}
