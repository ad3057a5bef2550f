//! Multi-criterion city scoring.
//!
//! Seven additive criteria, all case-insensitive. A city criterion whose
//! field is missing contributes zero. The weights and the decision
//! thresholds in `decision.rs` were tuned together and must move together.

use super::lines::ClassifiedLines;
use super::tokens::Tokens;
use crate::gazetteer::CityRecord;
use serde::Serialize;

// ─── Scoring weights ─────────────────────────────────────────────

/// City name found on the last, second-last and third-last content line.
const W_LINE_CITY: [u32; 3] = [150, 80, 40];
const W_LINE_DISTRICT: [u32; 3] = [40, 20, 10];
const W_LINE_ZONE: [u32; 3] = [30, 15, 5];
const W_LINE_EXACT: u32 = 80;
const W_LINE_ENDS_WITH: u32 = 40;
const W_LINE_STARTS_WITH: u32 = 20;

const W_WORD_EXACT: u32 = 50;
const W_WORD_IN_CITY: u32 = 15;
const W_CITY_IN_WORD: u32 = 10;

const W_POSTAL_FIRST_DIGIT: u32 = 25;
const W_POSTAL_TWO_DIGITS: u32 = 15;

const W_DISTRICT_WORD: u32 = 10;
const W_DISTRICT_ANYWHERE: u32 = 15;
const W_ZONE_ANYWHERE: u32 = 10;
const W_FIRST_LINE: u32 = 5;

/// Per-address inputs, lowercased once and shared read-only across candidates.
#[derive(Debug, Clone)]
pub struct ScoreInputs {
    content: Vec<String>,
    reversed: Vec<String>,
    words: Vec<String>,
    address: String,
    postal_code: Option<String>,
}

impl ScoreInputs {
    pub fn new(address: &str, lines: &ClassifiedLines, tokens: &Tokens) -> Self {
        Self {
            content: lowercase_all(&lines.content),
            reversed: lowercase_all(&lines.reversed),
            words: tokens.words.clone(),
            address: address.to_lowercase(),
            postal_code: tokens.postal_code.clone(),
        }
    }
}

fn lowercase_all(lines: &[String]) -> Vec<String> {
    lines.iter().map(|l| l.to_lowercase()).collect()
}

/// Points awarded by each criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub positional: u32,
    pub any_line: u32,
    pub words: u32,
    pub postal: u32,
    pub district: u32,
    pub zone: u32,
    pub first_line: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.positional
            + self.any_line
            + self.words
            + self.postal
            + self.district
            + self.zone
            + self.first_line
    }
}

fn lowered(field: Option<&str>) -> Option<String> {
    field
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty())
}

pub fn score(city: &CityRecord, inputs: &ScoreInputs) -> u32 {
    breakdown(city, inputs).total()
}

pub fn breakdown(city: &CityRecord, inputs: &ScoreInputs) -> ScoreBreakdown {
    let name = lowered(Some(city.name.as_str()));
    let district = lowered(city.district_name.as_deref());
    let zone = lowered(city.zone_name.as_deref());

    ScoreBreakdown {
        positional: positional(&inputs.reversed, name.as_deref(), district.as_deref(), zone.as_deref()),
        any_line: name.as_deref().map_or(0, |n| any_line(&inputs.reversed, n)),
        words: name.as_deref().map_or(0, |n| word_matches(&inputs.words, n)),
        postal: postal(inputs.postal_code.as_deref(), city.city_id),
        district: district.as_deref().map_or(0, |d| district_matches(&inputs.words, &inputs.address, d)),
        zone: zone.as_deref().map_or(0, |z| if inputs.address.contains(z) { W_ZONE_ANYWHERE } else { 0 }),
        first_line: match (name.as_deref(), inputs.content.first()) {
            (Some(n), Some(first)) if first.contains(n) => W_FIRST_LINE,
            _ => 0,
        },
    }
}

fn positional(reversed: &[String], name: Option<&str>, district: Option<&str>, zone: Option<&str>) -> u32 {
    let mut points = 0;
    for (i, line) in reversed.iter().take(3).enumerate() {
        if let Some(n) = name {
            if line.contains(n) {
                points += W_LINE_CITY[i];
                let trimmed = line.trim();
                if trimmed == n {
                    points += W_LINE_EXACT;
                }
                if trimmed.ends_with(n) {
                    points += W_LINE_ENDS_WITH;
                }
                if trimmed.starts_with(n) {
                    points += W_LINE_STARTS_WITH;
                }
            }
        }
        if district.is_some_and(|d| line.contains(d)) {
            points += W_LINE_DISTRICT[i];
        }
        if zone.is_some_and(|z| line.contains(z)) {
            points += W_LINE_ZONE[i];
        }
    }
    points
}

/// Decays by five per line from the city line, never below three.
fn any_line(reversed: &[String], name: &str) -> u32 {
    reversed
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains(name))
        .map(|(i, _)| 15u32.saturating_sub(5u32.saturating_mul(i as u32)).max(3))
        .sum()
}

fn word_matches(words: &[String], name: &str) -> u32 {
    let name_len = name.chars().count();
    words
        .iter()
        .map(|w| {
            if w == name {
                W_WORD_EXACT
            } else if name.contains(w.as_str()) && w.chars().count() > 3 {
                W_WORD_IN_CITY
            } else if w.contains(name) && name_len > 3 {
                W_CITY_IN_WORD
            } else {
                0
            }
        })
        .sum()
}

fn postal(postal_code: Option<&str>, city_id: Option<u32>) -> u32 {
    let (Some(code), Some(id)) = (postal_code, city_id) else {
        return 0;
    };
    let id = id.to_string();
    let mut points = 0;
    if code.get(..1) == id.get(..1) {
        points += W_POSTAL_FIRST_DIGIT;
    }
    if id.len() >= 2 && code.get(..2) == id.get(..2) {
        points += W_POSTAL_TWO_DIGITS;
    }
    points
}

// Every matching word counts, so multi-word district names accumulate.
fn district_matches(words: &[String], address: &str, district: &str) -> u32 {
    let per_word: u32 = words
        .iter()
        .filter(|w| w.contains(district) || district.contains(w.as_str()))
        .map(|_| W_DISTRICT_WORD)
        .sum();
    let anywhere = if address.contains(district) { W_DISTRICT_ANYWHERE } else { 0 };
    per_word + anywhere
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::lines::classify;
    use crate::address::tokens::tokenize;

    fn inputs(address: &str) -> ScoreInputs {
        ScoreInputs::new(address, &classify(address), &tokenize(address))
    }

    fn city(name: &str) -> CityRecord {
        CityRecord::new(name, None, None, None, None, None)
    }

    #[test]
    fn test_colombo_breakdown() {
        let colombo = CityRecord::with_district("Colombo", "Colombo");
        let b = breakdown(&colombo, &inputs("John Doe\n123 Main Street\nColombo 01\n0771234567"));
        // 150 base + 20 starts-with + 40 district on the city line.
        assert_eq!(b.positional, 210);
        assert_eq!(b.any_line, 15);
        assert_eq!(b.words, 50);
        assert_eq!(b.postal, 0);
        // One matching word plus the whole-address bonus.
        assert_eq!(b.district, 25);
        assert_eq!(b.zone, 0);
        assert_eq!(b.first_line, 0);
        assert_eq!(b.total(), 300);
    }

    #[test]
    fn test_unrelated_city_scores_zero() {
        let kandy = CityRecord::with_district("Kandy", "Kandy");
        assert_eq!(score(&kandy, &inputs("John Doe\n123 Main Street\nColombo 01")), 0);
    }

    #[test]
    fn test_exact_city_line() {
        let b = breakdown(&city("Kandy"), &inputs("Nimal\n12 Peradeniya Rd\n  KANDY "));
        assert_eq!(b.positional, 150 + 80 + 40 + 20);
    }

    #[test]
    fn test_positional_weights_by_line() {
        let galle = city("Galle");
        assert_eq!(breakdown(&galle, &inputs("a\nb\nGalle Fort")).positional, 150 + 20);
        assert_eq!(breakdown(&galle, &inputs("a\nGalle Fort\nx")).positional, 80 + 20);
        assert_eq!(breakdown(&galle, &inputs("Galle Fort\nx\ny")).positional, 40 + 20);
        assert_eq!(breakdown(&galle, &inputs("Galle Fort\nx\ny\nz")).positional, 0);
    }

    #[test]
    fn test_ends_with_city() {
        let b = breakdown(&city("Galle"), &inputs("Nimal\nNo 4, Fort, Galle"));
        assert_eq!(b.positional, 150 + 40);
    }

    #[test]
    fn test_district_and_zone_lines() {
        let matale = CityRecord::new("Dambulla", None, None, Some("Central".into()), None, Some("Matale".into()));
        let b = breakdown(&matale, &inputs("Sunil\nMatale District\nCentral Province"));
        assert_eq!(b.positional, 20 + 30);
        assert_eq!(b.zone, 10);
    }

    #[test]
    fn test_any_line_decay_floor() {
        let lines: Vec<String> = (0..5).map(|_| "kandy".to_string()).collect();
        assert_eq!(any_line(&lines, "kandy"), 15 + 10 + 5 + 3 + 3);
    }

    #[test]
    fn test_word_matches() {
        let words: Vec<String> = ["kandy", "nuwara", "eliya", "mahanuwara", "nuw"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(word_matches(&words, "kandy"), 50);
        // "nuwara" and "eliya" are inside the name; "nuw" is too short.
        assert_eq!(word_matches(&words, "nuwara eliya"), 15 + 15);
        // "mahanuwara" contains the name.
        assert_eq!(word_matches(&words, "nuwara"), 50 + 10);
        // Name too short for the contains-name rule.
        assert_eq!(word_matches(&["galle123".to_string()], "gal"), 0);
    }

    #[test]
    fn test_postal_prefix() {
        assert_eq!(postal(Some("20000"), Some(2)), 25);
        assert_eq!(postal(Some("20000"), Some(20)), 40);
        assert_eq!(postal(Some("21000"), Some(20)), 25);
        assert_eq!(postal(Some("80000"), Some(20)), 0);
        assert_eq!(postal(None, Some(20)), 0);
        assert_eq!(postal(Some("20000"), None), 0);
    }

    #[test]
    fn test_district_counts_every_word() {
        let words: Vec<String> = ["nuwara", "eliya", "road"].iter().map(|s| s.to_string()).collect();
        assert_eq!(district_matches(&words, "nuwara eliya road", "nuwara eliya"), 10 + 10 + 15);
    }

    #[test]
    fn test_punctuation_token_matches_any_district() {
        let kandy = CityRecord::with_district("Peradeniya", "Kandy");
        let b = breakdown(&kandy, &inputs("Nimal\n12 Main St ---"));
        assert_eq!(b.district, 10);
        assert_eq!(b.words, 0);
        assert_eq!(breakdown(&city("Peradeniya"), &inputs("Nimal\n12 Main St ---")).district, 0);
    }

    #[test]
    fn test_first_line_match() {
        let b = breakdown(&city("Kandy"), &inputs("Kandy Traders\nNo 5\nPeradeniya"));
        assert_eq!(b.first_line, 5);
    }

    #[test]
    fn test_missing_fields_never_penalize() {
        let bare = city("Jaffna");
        let b = breakdown(&bare, &inputs("Jaffna"));
        assert_eq!(b.district, 0);
        assert_eq!(b.zone, 0);
        assert_eq!(b.postal, 0);
        assert!(b.total() > 0);
    }
}
