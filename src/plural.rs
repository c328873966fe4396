use std::collections::HashMap;

use fixed_decimal::Decimal;
use icu_locale::Locale;
use icu_plurals::{PluralRuleType, PluralRules};

use crate::error::{EngineError, EngineResult};
use crate::message::PluralForms;

/// CLDR plural categories.
///
/// Not all languages use all categories: English uses one/other, Slavic
/// languages add few/many, and zero-plural languages map everything to
/// `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    /// Parse a category name as it appears in message trees.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "zero" => Some(Self::Zero),
            "one" => Some(Self::One),
            "two" => Some(Self::Two),
            "few" => Some(Self::Few),
            "many" => Some(Self::Many),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::One => "one",
            Self::Two => "two",
            Self::Few => "few",
            Self::Many => "many",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn from_icu(category: icu_plurals::PluralCategory) -> PluralCategory {
    match category {
        icu_plurals::PluralCategory::Zero => PluralCategory::Zero,
        icu_plurals::PluralCategory::One => PluralCategory::One,
        icu_plurals::PluralCategory::Two => PluralCategory::Two,
        icu_plurals::PluralCategory::Few => PluralCategory::Few,
        icu_plurals::PluralCategory::Many => PluralCategory::Many,
        icu_plurals::PluralCategory::Other => PluralCategory::Other,
    }
}

/// Selects plural categories and templates for (count, locale) pairs.
///
/// ICU `PluralRules` construction is not free, so rule instances are
/// memoized per locale. Locales whose rules cannot be built (unknown or
/// unparseable tags) classify everything as `Other`.
pub struct PluralRuleEngine {
    rules: HashMap<String, Option<PluralRules>>,
}

impl PluralRuleEngine {
    pub fn new() -> Self {
        PluralRuleEngine {
            rules: HashMap::new(),
        }
    }

    fn rules_for(&mut self, locale: &str) -> Option<&PluralRules> {
        self.rules
            .entry(locale.to_string())
            .or_insert_with(|| {
                let parsed: Locale = locale.parse().ok()?;
                PluralRules::try_new(parsed.into(), PluralRuleType::Cardinal.into()).ok()
            })
            .as_ref()
    }

    /// Compute the CLDR cardinal category for a count in a locale.
    pub fn category_for(&mut self, count: f64, locale: &str) -> PluralCategory {
        let Some(rules) = self.rules_for(locale) else {
            return PluralCategory::Other;
        };
        if count.fract() == 0.0 && count.abs() < u64::MAX as f64 {
            from_icu(rules.category_for(count.abs() as u64 as usize))
        } else {
            // Non-integral counts carry visible-fraction operands, so
            // classify through the decimal string form: English "1.5"
            // is other, not one.
            match Decimal::try_from_str(&count.abs().to_string()) {
                Ok(dec) => from_icu(rules.category_for(&dec)),
                Err(_) => PluralCategory::Other,
            }
        }
    }

    /// Select the matching template from a plural-form object.
    ///
    /// An explicit `=N` entry wins for integral counts; otherwise the
    /// CLDR category is used, with `other` as the catch-all. A form set
    /// without `other` is a configuration error.
    pub fn select<'a>(
        &mut self,
        forms: &'a PluralForms,
        count: f64,
        locale: &str,
        key: &str,
    ) -> EngineResult<&'a str> {
        if count.fract() == 0.0 && count.abs() < i64::MAX as f64 {
            if let Some(template) = forms.exact(count as i64) {
                return Ok(template);
            }
        }

        let category = self.category_for(count, locale);
        if let Some(template) = forms.category(category) {
            return Ok(template);
        }
        forms
            .category(PluralCategory::Other)
            .ok_or_else(|| EngineError::PluralConfig {
                key: key.to_string(),
            })
    }
}

impl Default for PluralRuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_categories() {
        let mut engine = PluralRuleEngine::new();
        assert_eq!(engine.category_for(1.0, "en"), PluralCategory::One);
        assert_eq!(engine.category_for(0.0, "en"), PluralCategory::Other);
        assert_eq!(engine.category_for(2.0, "en"), PluralCategory::Other);
        assert_eq!(engine.category_for(100.0, "en"), PluralCategory::Other);
    }

    #[test]
    fn test_russian_categories() {
        let mut engine = PluralRuleEngine::new();
        assert_eq!(engine.category_for(1.0, "ru"), PluralCategory::One);
        assert_eq!(engine.category_for(2.0, "ru"), PluralCategory::Few);
        assert_eq!(engine.category_for(5.0, "ru"), PluralCategory::Many);
        assert_eq!(engine.category_for(11.0, "ru"), PluralCategory::Many);
        assert_eq!(engine.category_for(21.0, "ru"), PluralCategory::One);
    }

    #[test]
    fn test_zero_plural_language() {
        let mut engine = PluralRuleEngine::new();
        assert_eq!(engine.category_for(1.0, "ja"), PluralCategory::Other);
        assert_eq!(engine.category_for(7.0, "ja"), PluralCategory::Other);
    }

    #[test]
    fn test_non_integral_counts() {
        let mut engine = PluralRuleEngine::new();
        // English "1.5" has visible fraction digits, so it is not "one"
        assert_eq!(engine.category_for(1.5, "en"), PluralCategory::Other);
        // French "one" covers integer parts 0 and 1, fractions included
        assert_eq!(engine.category_for(1.5, "fr"), PluralCategory::One);
        assert_eq!(engine.category_for(0.5, "fr"), PluralCategory::One);
    }

    #[test]
    fn test_unparseable_locale_degrades_to_other() {
        let mut engine = PluralRuleEngine::new();
        assert_eq!(engine.category_for(1.0, "???"), PluralCategory::Other);
    }

    #[test]
    fn test_select_prefers_exact_match() {
        let mut forms = PluralForms::new();
        forms.insert_exact(0, "no items".to_string());
        forms.insert_category(PluralCategory::One, "{{count}} item".to_string());
        forms.insert_category(PluralCategory::Other, "{{count}} items".to_string());

        let mut engine = PluralRuleEngine::new();
        assert_eq!(engine.select(&forms, 0.0, "en", "items").unwrap(), "no items");
        assert_eq!(
            engine.select(&forms, 1.0, "en", "items").unwrap(),
            "{{count}} item"
        );
        assert_eq!(
            engine.select(&forms, 5.0, "en", "items").unwrap(),
            "{{count}} items"
        );
    }

    #[test]
    fn test_select_falls_back_to_other() {
        let mut forms = PluralForms::new();
        forms.insert_category(PluralCategory::Other, "items".to_string());

        // Russian "few" category is absent, so "other" catches it
        let mut engine = PluralRuleEngine::new();
        assert_eq!(engine.select(&forms, 2.0, "ru", "items").unwrap(), "items");
    }

    #[test]
    fn test_select_missing_other_is_an_error() {
        let mut forms = PluralForms::new();
        forms.insert_category(PluralCategory::One, "one item".to_string());

        let mut engine = PluralRuleEngine::new();
        assert_eq!(
            engine.select(&forms, 5.0, "en", "items"),
            Err(EngineError::PluralConfig {
                key: "items".to_string()
            })
        );
    }

    #[test]
    fn test_plural_coverage() {
        // Any form set containing "other" selects a template for every
        // integer count
        let mut forms = PluralForms::new();
        forms.insert_category(PluralCategory::One, "one".to_string());
        forms.insert_category(PluralCategory::Other, "other".to_string());

        let mut engine = PluralRuleEngine::new();
        for locale in ["en", "ru", "ar", "ja", "cy"] {
            for n in 0..=1000 {
                assert!(engine.select(&forms, n as f64, locale, "key").is_ok());
            }
        }
    }
}
