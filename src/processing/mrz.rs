use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

lazy_static! {
    static ref MRZ_CHARSET: Regex = Regex::new(r"^[A-Z0-9<]+$").unwrap();
}

const CHECK_WEIGHTS: [u32; 3] = [7, 3, 1];

/// Fields recovered from the machine readable zone. Empty when the zone is
/// absent or fails checksum verification; the parser never errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MrzFields {
    pub name: Option<String>,
    pub document_number: Option<String>,
    pub expiration_date: Option<String>,
}

/// TD3 (two-row) MRZ fallback parser. Only a fully checksum-valid zone
/// contributes fields; anything malformed yields an empty partial so the
/// caller can fall through to its own failure handling.
pub struct MrzParser;

impl MrzParser {
    pub fn parse(text: &str) -> MrzFields {
        let mrz_lines: Vec<&str> = text
            .lines()
            .filter(|line| MRZ_CHARSET.is_match(line))
            .collect();

        if mrz_lines.len() < 2 {
            debug!("MRZ parse skipped: fewer than two candidate lines");
            return MrzFields::default();
        }

        // The two MRZ rows sit at the bottom of the document, so the last
        // two candidate lines are taken as the zone.
        let line1 = mrz_lines[mrz_lines.len() - 2];
        let line2 = mrz_lines[mrz_lines.len() - 1];

        match Self::parse_td3(line1, line2) {
            Some(fields) => fields,
            None => {
                debug!("Invalid MRZ data detected, ignoring zone");
                MrzFields::default()
            }
        }
    }

    fn parse_td3(line1: &str, line2: &str) -> Option<MrzFields> {
        // Field layout per ICAO Doc 9303 TD3: line 2 carries the document
        // number (0..9, check 9), birth date (13..19, check 19), expiry
        // (21..27, check 27), personal number (28..42, check 42) and the
        // composite check digit (43).
        let doc_number_field = line2.get(0..9)?;
        let doc_check = line2.chars().nth(9)?;
        let birth_field = line2.get(13..19)?;
        let birth_check = line2.chars().nth(19)?;
        let expiry_field = line2.get(21..27)?;
        let expiry_check = line2.chars().nth(27)?;
        let personal_field = line2.get(28..42)?;
        let personal_check = line2.chars().nth(42)?;
        let composite_check = line2.chars().nth(43)?;

        if !Self::check_digit_matches(doc_number_field, doc_check)
            || !Self::check_digit_matches(birth_field, birth_check)
            || !Self::check_digit_matches(expiry_field, expiry_check)
            || !Self::check_digit_matches(personal_field, personal_check)
        {
            return None;
        }

        let composite_input = format!(
            "{}{}{}",
            line2.get(0..10)?,
            line2.get(13..20)?,
            line2.get(21..43)?
        );
        if !Self::check_digit_matches(&composite_input, composite_check) {
            return None;
        }

        let name = Self::parse_name(line1.get(5..)?);
        let document_number = doc_number_field.trim_end_matches('<').to_string();
        let expiration_date = format_mrz_date(expiry_field)?;

        debug!("MRZ parse successful for document {}", document_number);
        Some(MrzFields {
            name,
            document_number: Some(document_number).filter(|n| !n.is_empty()),
            expiration_date: Some(expiration_date),
        })
    }

    /// The name field is `SURNAME<<GIVEN<NAMES` padded with fillers; the
    /// result is given names then surname, space separated.
    fn parse_name(field: &str) -> Option<String> {
        let mut parts = field.splitn(2, "<<");
        let surname = normalize_fillers(parts.next()?);
        let given_names = normalize_fillers(parts.next().unwrap_or(""));

        let name = format!("{} {}", given_names, surname);
        let name = name.trim().to_string();
        Some(name).filter(|n| !n.is_empty())
    }

    fn check_digit_matches(field: &str, expected: char) -> bool {
        let Some(computed) = compute_check_digit(field) else {
            return false;
        };
        // An empty optional field may carry '<' in place of the zero digit.
        let expected_value = match expected {
            '<' => 0,
            c => match c.to_digit(10) {
                Some(d) => d,
                None => return false,
            },
        };
        computed == expected_value
    }
}

/// ICAO 9303 check digit: 7-3-1 repeating weights over character values
/// (digits as-is, A-Z as 10-35, filler as 0), modulo 10.
pub fn compute_check_digit(field: &str) -> Option<u32> {
    let mut sum = 0u32;
    for (i, c) in field.chars().enumerate() {
        let value = match c {
            '0'..='9' => c as u32 - '0' as u32,
            'A'..='Z' => c as u32 - 'A' as u32 + 10,
            '<' => 0,
            _ => return None,
        };
        sum += value * CHECK_WEIGHTS[i % 3];
    }
    Some(sum % 10)
}

/// Decodes a six digit `YYMMDD` MRZ date as `DD.MM.YYYY`. Two digit years
/// above 50 resolve to the 1900s, the rest to the 2000s.
pub fn format_mrz_date(digits: &str) -> Option<String> {
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let yy: u32 = digits[0..2].parse().ok()?;
    let mm = &digits[2..4];
    let dd = &digits[4..6];
    let year = if yy > 50 { 1900 + yy } else { 2000 + yy };
    Some(format!("{}.{}.{}", dd, mm, year))
}

fn normalize_fillers(field: &str) -> String {
    field
        .replace('<', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Czech specimen passport TD3 rows; every check digit verifies.
    const LINE1: &str = "P<CZESPECIMEN<<VZOR<<<<<<<<<<<<<<<<<<<<<<<<<";
    const LINE2: &str = "99006000<8CZE1102299F16090641152291111<<<<24";

    #[test]
    fn check_digit_follows_731_weighting() {
        assert_eq!(compute_check_digit("99006000<"), Some(8));
        assert_eq!(compute_check_digit("110229"), Some(9));
        assert_eq!(compute_check_digit("160906"), Some(4));
    }

    #[test]
    fn format_mrz_date_applies_century_rule() {
        assert_eq!(format_mrz_date("160906"), Some("06.09.2016".to_string()));
        assert_eq!(format_mrz_date("990101"), Some("01.01.1999".to_string()));
    }

    #[test]
    fn format_mrz_date_rejects_malformed_input() {
        assert_eq!(format_mrz_date("16090"), None);
        assert_eq!(format_mrz_date("16O906"), None);
    }

    #[test]
    fn valid_zone_decodes_all_fields() {
        let text = format!("Jmeno a prijmeni\n{}\n{}", LINE1, LINE2);
        let fields = MrzParser::parse(&text);
        assert_eq!(fields.name, Some("VZOR SPECIMEN".to_string()));
        assert_eq!(fields.document_number, Some("99006000".to_string()));
        assert_eq!(fields.expiration_date, Some("06.09.2016".to_string()));
    }

    #[test]
    fn last_two_candidate_lines_are_taken_as_the_zone() {
        // A stray uppercase line earlier in the text also matches the
        // charset; the zone is still the final two lines.
        let text = format!("CZE\n{}\n{}", LINE1, LINE2);
        let fields = MrzParser::parse(&text);
        assert_eq!(fields.document_number, Some("99006000".to_string()));
    }

    #[test]
    fn corrupted_check_digit_yields_empty_partial() {
        let corrupted = LINE2.replace("99006000<8", "99006000<7");
        let text = format!("{}\n{}", LINE1, corrupted);
        assert_eq!(MrzParser::parse(&text), MrzFields::default());
    }

    #[test]
    fn single_candidate_line_yields_empty_partial() {
        assert_eq!(MrzParser::parse(LINE2), MrzFields::default());
    }

    #[test]
    fn short_second_line_yields_empty_partial() {
        let text = format!("{}\n99006000<8CZE", LINE1);
        assert_eq!(MrzParser::parse(&text), MrzFields::default());
    }
}
