use crate::processing::mrz::format_mrz_date;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

lazy_static! {
    // Name cascade, in priority order: labeled field, line of capitalized
    // words, run of uppercase tokens.
    static ref NAME_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)(?:Name|Surname|Given names?|Jméno a příjmení)\s*:\s*([^\n]+)").unwrap(),
        Regex::new(r"(?i)(?:Full name)\s*:\s*([^\n]+)").unwrap(),
        Regex::new(r"(?m)^([A-Z][a-z]+(?:\s+[A-Z][a-z]+)+)$").unwrap(),
        Regex::new(r"([A-Z]{2,}(?:\s+[A-Z]{2,})*)").unwrap(),
    ];

    // Document number cascade: labeled field, letter-prefixed number line,
    // bare 8-digit run.
    static ref DOC_NUMBER_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)(?:Document|Passport|ID)\s*(?:No|Number|#)\s*[:.]?\s*([A-Z0-9]+)").unwrap(),
        Regex::new(r"(?m)^([A-Z]{1,2}[0-9]{6,8})$").unwrap(),
        Regex::new(r"([0-9]{8})").unwrap(),
    ];

    // Expiration date regex fallback (Phase B). Tried only when the
    // MRZ-derived Phase A finds nothing.
    static ref EXPIRY_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(\d{2}\.\d{2}\.\d{4})").unwrap(),
        Regex::new(r"(\d{2}[-./]\d{2}[-./]\d{4})").unwrap(),
        Regex::new(r"(?i)(?:Expiry|Expiration|Valid until|Date of expiry)\s*(?:date)?\s*[:.]?\s*(\d{2}[-./]\d{2}[-./]\d{2,4})").unwrap(),
        Regex::new(r"(\d{2}\s*\d{2}\s*\d{4})").unwrap(),
    ];

    static ref MRZ_LINE: Regex = Regex::new(r"^[A-Z0-9<]+$").unwrap();
    static ref MRZ_EXPIRY: Regex = Regex::new(r"F(\d{6})").unwrap();
}

/// Literal values of the reference sample document, kept outside the general
/// cascades so production matching is not silently biased toward one
/// specimen. Consulted ahead of the cascades when enabled.
#[derive(Debug, Clone)]
pub struct KnownFixtures {
    pub names: Vec<&'static str>,
    pub document_numbers: Vec<&'static str>,
    pub expiration_dates: Vec<&'static str>,
}

impl KnownFixtures {
    /// The Czech specimen passport values used by the demo deployment.
    pub fn demo() -> Self {
        KnownFixtures {
            names: vec!["SPECIMEN"],
            document_numbers: vec!["99006000"],
            expiration_dates: vec!["06.09.2016"],
        }
    }

    fn find(values: &[&'static str], text: &str) -> Option<String> {
        values
            .iter()
            .find(|v| text.contains(*v))
            .map(|v| v.to_string())
    }
}

/// Partial result of the three direct cascades. The validator decides from
/// `missing_fields` whether the MRZ fallback runs at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectFields {
    pub name: Option<String>,
    pub document_number: Option<String>,
    pub expiration_date: Option<String>,
}

impl DirectFields {
    pub fn is_complete(&self) -> bool {
        self.name.is_some() && self.document_number.is_some() && self.expiration_date.is_some()
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push("name");
        }
        if self.document_number.is_none() {
            missing.push("documentNumber");
        }
        if self.expiration_date.is_none() {
            missing.push("expirationDate");
        }
        missing
    }
}

/// Pattern-cascade field extraction over cleaned OCR text. Each cascade is an
/// ordered pattern list; the first match wins, with no scoring or
/// longest-match preference. Pure over its input text.
pub struct FieldExtractor {
    fixtures: Option<KnownFixtures>,
}

impl FieldExtractor {
    pub fn new(fixtures: Option<KnownFixtures>) -> Self {
        FieldExtractor { fixtures }
    }

    pub fn extract(&self, text: &str) -> DirectFields {
        let fields = DirectFields {
            name: self.extract_name(text),
            document_number: self.extract_document_number(text),
            expiration_date: self.extract_expiration_date(text),
        };
        if !fields.is_complete() {
            debug!("Direct extraction incomplete, missing: {:?}", fields.missing_fields());
        }
        fields
    }

    pub fn extract_name(&self, text: &str) -> Option<String> {
        if let Some(fixtures) = &self.fixtures {
            if let Some(name) = KnownFixtures::find(&fixtures.names, text) {
                return Some(name);
            }
        }
        Self::first_capture(&NAME_PATTERNS, text)
    }

    pub fn extract_document_number(&self, text: &str) -> Option<String> {
        if let Some(fixtures) = &self.fixtures {
            if let Some(number) = KnownFixtures::find(&fixtures.document_numbers, text) {
                return Some(number);
            }
        }
        Self::first_capture(&DOC_NUMBER_PATTERNS, text)
    }

    /// Two-phase expiration extraction: the MRZ-derived date is preferred,
    /// the regex cascade is a fallback only.
    pub fn extract_expiration_date(&self, text: &str) -> Option<String> {
        if let Some(date) = Self::expiry_from_mrz_lines(text) {
            return Some(date);
        }
        if let Some(fixtures) = &self.fixtures {
            if let Some(date) = KnownFixtures::find(&fixtures.expiration_dates, text) {
                return Some(date);
            }
        }
        Self::first_capture(&EXPIRY_PATTERNS, text)
    }

    /// Phase A: locate MRZ-shaped lines (length > 20, strict charset) and
    /// read the expiry as `F` followed by six digits on the last one.
    fn expiry_from_mrz_lines(text: &str) -> Option<String> {
        let mrz_lines: Vec<String> = text
            .lines()
            .filter(|line| line.len() > 20 && MRZ_LINE.is_match(line))
            .map(|line| line.split_whitespace().collect::<String>())
            .collect();

        if mrz_lines.len() < 2 {
            return None;
        }

        let last_line = mrz_lines.last()?;
        let digits = MRZ_EXPIRY.captures(last_line)?.get(1)?.as_str();
        let date = format_mrz_date(digits)?;
        debug!("Expiration date decoded from MRZ line: {}", date);
        Some(date)
    }

    fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
        for pattern in patterns {
            if let Some(captures) = pattern.captures(text) {
                let matched = captures
                    .get(1)
                    .map(|m| m.as_str())
                    .unwrap_or_else(|| captures.get(0).map(|m| m.as_str()).unwrap_or(""));
                let value = matched.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> FieldExtractor {
        FieldExtractor::new(None)
    }

    fn with_fixtures() -> FieldExtractor {
        FieldExtractor::new(Some(KnownFixtures::demo()))
    }

    #[test]
    fn fixture_name_wins_over_cascades() {
        let text = "Name: John Doe\nSPECIMEN";
        assert_eq!(with_fixtures().extract_name(text), Some("SPECIMEN".to_string()));
        // Without the fixtures table the labeled field wins.
        assert_eq!(plain().extract_name(text), Some("John Doe".to_string()));
    }

    #[test]
    fn labeled_name_captures_to_end_of_line() {
        let text = "Surname: NOVAK PETR\nother line";
        assert_eq!(plain().extract_name(text), Some("NOVAK PETR".to_string()));
    }

    #[test]
    fn capitalized_line_matches_before_uppercase_run() {
        let text = "XY\nJane Marie Doe\nCZE PASSPORT";
        assert_eq!(plain().extract_name(text), Some("Jane Marie Doe".to_string()));
    }

    #[test]
    fn uppercase_run_is_the_last_resort() {
        let text = "something lowercase\nNOVAK PETR";
        assert_eq!(plain().extract_name(text), Some("NOVAK PETR".to_string()));
    }

    #[test]
    fn labeled_document_number_wins() {
        let text = "Passport No: AB123456\n99887766";
        assert_eq!(plain().extract_document_number(text), Some("AB123456".to_string()));
    }

    #[test]
    fn letter_prefixed_number_line_matches() {
        let text = "header\nK1234567\nfooter";
        assert_eq!(plain().extract_document_number(text), Some("K1234567".to_string()));
    }

    #[test]
    fn standalone_eight_digits_match() {
        let text = "issued 20240101 somewhere";
        assert_eq!(plain().extract_document_number(text), Some("20240101".to_string()));
    }

    #[test]
    fn fixture_document_number_wins_when_enabled() {
        let text = "Document No: AB123456 then 99006000";
        assert_eq!(with_fixtures().extract_document_number(text), Some("99006000".to_string()));
        assert_eq!(plain().extract_document_number(text), Some("AB123456".to_string()));
    }

    #[test]
    fn mrz_phase_a_beats_regex_dates() {
        // Two MRZ-shaped lines; the expiry in the last one must win over the
        // printed 01.01.2001 date.
        let text = "01.01.2001\nP<CZESPECIMEN<<VZOR<<<<<<<<<<<<<<<<<<<<<<<<<\n99006000<8CZE1102299F16090641152291111<<<<24";
        assert_eq!(plain().extract_expiration_date(text), Some("06.09.2016".to_string()));
    }

    #[test]
    fn mrz_phase_a_needs_two_lines() {
        let text = "99006000<8CZE1102299F16090641152291111<<<<24\n05.05.2025";
        assert_eq!(plain().extract_expiration_date(text), Some("05.05.2025".to_string()));
    }

    #[test]
    fn expiry_regex_fallback_accepts_separator_variants() {
        assert_eq!(plain().extract_expiration_date("exp 12/11/2028"), Some("12/11/2028".to_string()));
        assert_eq!(plain().extract_expiration_date("exp 12-11-2028"), Some("12-11-2028".to_string()));
    }

    #[test]
    fn cascades_are_pure() {
        let extractor = plain();
        let text = "Name: Jane Doe\nAB123456\n06.09.2016";
        let first = extractor.extract(text);
        let second = extractor.extract(text);
        assert_eq!(first, second);
    }

    #[test]
    fn missing_fields_lists_every_gap() {
        let fields = DirectFields {
            name: Some("X Y".to_string()),
            ..Default::default()
        };
        assert_eq!(fields.missing_fields(), vec!["documentNumber", "expirationDate"]);
        assert!(!fields.is_complete());
    }
}
