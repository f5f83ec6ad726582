use std::collections::HashMap;
use std::sync::OnceLock;

use crate::calendar::{to_ethiopian, try_to_ethiopian, EthiopianDate, GregorianDate};
use crate::config::LanguageConfig;
use crate::error::InvalidDateError;

/// Language used when a requested code has no table.
pub const FALLBACK_LANGUAGE: &str = "en";

pub const ENGLISH_MONTHS: [&str; 13] = [
    "Meskerem", "Tikimt", "Hidar", "Tahsas", "Tir", "Yekatit", "Megabit", "Miazia", "Ginbot",
    "Sene", "Hamle", "Nehase", "Pagume",
];

pub const AMHARIC_MONTHS: [&str; 13] = [
    "መስከረም", "ጥቅምት", "ኅዳር", "ታኅሣሥ", "ጥር", "የካቲት", "መጋቢት", "ሚያዝያ", "ግንቦት", "ሰኔ", "ሐምሌ",
    "ነሐሴ", "ጳጉሜን",
];

/// Ethiopian month names per language code.
///
/// Always holds an `en` table. Built once and only read afterwards.
#[derive(Debug, Clone)]
pub struct MonthNameTable {
    tables: HashMap<String, [String; 13]>,
}

impl MonthNameTable {
    /// The `en` and `am` tables, shared by the whole process.
    pub fn builtin() -> &'static MonthNameTable {
        static BUILTIN: OnceLock<MonthNameTable> = OnceLock::new();
        BUILTIN.get_or_init(|| Self::with_languages(&[]))
    }

    /// Builtin tables plus configured ones; a configured code replaces a builtin.
    pub fn with_languages(languages: &[LanguageConfig]) -> Self {
        let mut tables = HashMap::new();
        tables.insert("en".to_string(), ENGLISH_MONTHS.map(String::from));
        tables.insert("am".to_string(), AMHARIC_MONTHS.map(String::from));

        for language in languages {
            tables.insert(language.code.clone(), language.months.clone());
        }

        Self { tables }
    }

    pub fn contains(&self, language: &str) -> bool {
        self.tables.contains_key(language)
    }

    /// Available language codes, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    /// Exact table for `language`, without falling back.
    pub fn get(&self, language: &str) -> Option<&[String; 13]> {
        self.tables.get(language)
    }

    /// The table for `language`, or the English one if it is unknown. Returns
    /// the code of the table actually used.
    pub fn resolve<'a, 'b>(&'a self, language: &'b str) -> (&'b str, &'a [String; 13]) {
        if let Some(names) = self.tables.get(language) {
            return (language, names);
        }
        let names = self
            .tables
            .get(FALLBACK_LANGUAGE)
            .expect("month table always holds the fallback language");
        (FALLBACK_LANGUAGE, names)
    }

    /// Month name, or an empty string when `month` is not 1-13.
    pub fn month_name(&self, language: &str, month: i32) -> &str {
        let (_, names) = self.resolve(language);
        month
            .checked_sub(1)
            .and_then(|index| usize::try_from(index).ok())
            .and_then(|index| names.get(index))
            .map_or("", String::as_str)
    }

    /// `"<MonthName> <day>, <year>"` for an already converted date.
    pub fn format_ethiopian(&self, date: &EthiopianDate, language: &str) -> String {
        format!(
            "{} {}, {}",
            self.month_name(language, date.month),
            date.day,
            date.year
        )
    }

    /// Convert and format. Never fails; see [`to_ethiopian`].
    pub fn format(&self, date: GregorianDate, language: &str) -> String {
        self.format_ethiopian(&to_ethiopian(date), language)
    }

    pub fn try_format(
        &self,
        date: GregorianDate,
        language: &str,
    ) -> Result<String, InvalidDateError> {
        let ethiopian = try_to_ethiopian(date)?;
        Ok(self.format_ethiopian(&ethiopian, language))
    }
}

/// Format `date` as an Ethiopian date using the builtin month names.
pub fn format_ethiopian_date(date: GregorianDate, language: &str) -> String {
    MonthNameTable::builtin().format(date, language)
}
