//! Number formatting conventions per locale.

use std::fmt;

use smol_str::SmolStr;

/// Decimal and grouping separators of a locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    tag: SmolStr,
    decimal: char,
    grouping: Option<char>,
}

/// (language, country, decimal, grouping); an empty country matches any.
const CONVENTIONS: &[(&str, &str, char, char)] = &[
    ("de", "CH", '.', '\''),
    ("it", "CH", '.', '\''),
    ("en", "", '.', ','),
    ("ja", "", '.', ','),
    ("zh", "", '.', ','),
    ("ko", "", '.', ','),
    ("he", "", '.', ','),
    ("th", "", '.', ','),
    ("de", "", ',', '.'),
    ("es", "", ',', '.'),
    ("it", "", ',', '.'),
    ("nl", "", ',', '.'),
    ("pt", "", ',', '.'),
    ("da", "", ',', '.'),
    ("id", "", ',', '.'),
    ("tr", "", ',', '.'),
    ("fr", "", ',', ' '),
    ("ru", "", ',', ' '),
    ("pl", "", ',', ' '),
    ("sv", "", ',', ' '),
    ("nb", "", ',', ' '),
    ("fi", "", ',', ' '),
    ("cs", "", ',', ' '),
    ("uk", "", ',', ' '),
];

impl Locale {
    /// Locale with explicit separators.
    pub fn new(tag: impl Into<SmolStr>, decimal: char, grouping: Option<char>) -> Self {
        Self {
            tag: tag.into(),
            decimal,
            grouping,
        }
    }

    /// `en_US`: `1,234.5`.
    pub fn en_us() -> Self {
        Self::new("en_US", '.', Some(','))
    }

    /// Parse a tag such as `de_DE`, `fr-FR` or `de`.
    pub fn parse(tag: &str) -> Option<Self> {
        let mut parts = tag.split(['_', '-']);
        let language = parts.next()?.to_ascii_lowercase();
        let country = parts.next().unwrap_or("").to_ascii_uppercase();
        if language.is_empty() {
            return None;
        }

        let (_, _, decimal, grouping) = CONVENTIONS
            .iter()
            .find(|(l, c, _, _)| *l == language && !c.is_empty() && *c == country)
            .or_else(|| {
                CONVENTIONS
                    .iter()
                    .find(|(l, c, _, _)| *l == language && c.is_empty())
            })?;

        let tag = if country.is_empty() {
            language
        } else {
            format!("{}_{}", language, country)
        };
        Some(Self::new(tag, *decimal, Some(*grouping)))
    }

    /// The normalized tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Decimal separator.
    pub fn decimal_separator(&self) -> char {
        self.decimal
    }

    /// Grouping separator, if any.
    pub fn grouping_separator(&self) -> Option<char> {
        self.grouping
    }

    /// Rewrite a localized number into canonical form (`1.234,5` → `1234.5`).
    pub fn normalize_number(&self, input: &str) -> String {
        let space_grouping = self.grouping == Some(' ');
        input
            .trim()
            .chars()
            .filter(|c| {
                Some(*c) != self.grouping
                    && !(space_grouping && matches!(c, '\u{a0}' | '\u{202f}'))
            })
            .map(|c| if c == self.decimal { '.' } else { c })
            .collect()
    }

    /// Render a canonical number string with this locale's decimal separator.
    pub fn localize_number(&self, canonical: &str) -> String {
        if self.decimal == '.' {
            return canonical.to_string();
        }
        canonical.replace('.', &self.decimal.to_string())
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::en_us()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let de = Locale::parse("de_DE").unwrap();
        assert_eq!(de.tag(), "de_DE");
        assert_eq!(de.decimal_separator(), ',');
        assert_eq!(de.grouping_separator(), Some('.'));

        let ch = Locale::parse("de-ch").unwrap();
        assert_eq!(ch.tag(), "de_CH");
        assert_eq!(ch.decimal_separator(), '.');

        assert_eq!(Locale::parse("fr").unwrap().grouping_separator(), Some(' '));
        assert!(Locale::parse("xx_YY").is_none());
        assert!(Locale::parse("").is_none());
    }

    #[test]
    fn test_normalize_number() {
        let de = Locale::parse("de_DE").unwrap();
        assert_eq!(de.normalize_number("1.234,5"), "1234.5");

        let fr = Locale::parse("fr_FR").unwrap();
        assert_eq!(fr.normalize_number("1\u{a0}234,5"), "1234.5");

        assert_eq!(Locale::en_us().normalize_number(" 1,234.5 "), "1234.5");
    }

    #[test]
    fn test_localize_number() {
        let de = Locale::parse("de").unwrap();
        assert_eq!(de.localize_number("12.5"), "12,5");
        assert_eq!(Locale::en_us().localize_number("12.5"), "12.5");
    }
}
