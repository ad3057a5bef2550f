//! Separates trailing phone/contact lines from address content.

use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,/]+").unwrap());
static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{7,}").unwrap());

/// Address lines with trailing contact lines removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLines {
    /// Content lines in original order.
    pub content: Vec<String>,
    /// Content lines last-first; index 0 is the presumed city line.
    pub reversed: Vec<String>,
}

/// True if every token of the line is a 7 to 12 digit phone number.
pub fn is_contact_line(line: &str) -> bool {
    let collapsed = SEPARATORS.replace_all(line.trim(), " ");
    let mut tokens = collapsed.split(' ').filter(|t| !t.is_empty()).peekable();
    if tokens.peek().is_none() {
        return false;
    }
    tokens.all(|token| {
        let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
        (7..=12).contains(&digits) && DIGIT_RUN.is_match(token)
    })
}

/// Split into non-blank lines and strip trailing contact lines, always keeping one.
pub fn classify(address: &str) -> ClassifiedLines {
    let mut content: Vec<String> = address
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect();

    while content.len() > 1 && content.last().is_some_and(|l| is_contact_line(l)) {
        content.pop();
    }

    let reversed = content.iter().rev().cloned().collect();
    ClassifiedLines { content, reversed }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_trailing_phone() {
        let lines = classify("John Doe\n123 Main St\nColombo 01\n0771234567");
        assert_eq!(lines.content, vec!["John Doe", "123 Main St", "Colombo 01"]);
        assert_eq!(lines.reversed[0], "Colombo 01");
        assert_eq!(lines.reversed.len(), 3);
    }

    #[test]
    fn test_strips_multiple_contact_lines() {
        let lines = classify("Nimal\nGalle Road\nGalle\n077-1234567 / 0112345678\n\n0719876543\n");
        assert_eq!(lines.content, vec!["Nimal", "Galle Road", "Galle"]);
    }

    #[test]
    fn test_single_phone_line_kept() {
        let lines = classify("0771234567");
        assert_eq!(lines.content, vec!["0771234567"]);
        assert_eq!(lines.reversed, vec!["0771234567"]);
    }

    #[test]
    fn test_contact_line_only_stripped_from_end() {
        let lines = classify("0771234567\nKandy");
        assert_eq!(lines.content, vec!["0771234567", "Kandy"]);
    }

    #[test]
    fn test_blank_lines_dropped() {
        let lines = classify("\n  \nKandy\n\n");
        assert_eq!(lines.content, vec!["Kandy"]);
    }

    #[test]
    fn test_is_contact_line() {
        assert!(is_contact_line("0771234567"));
        assert!(is_contact_line("  0771234567, 0112345678 "));
        assert!(is_contact_line("077-1234567"));
        // Too short.
        assert!(!is_contact_line("123456"));
        // Digits only after stripping, but no run of seven.
        assert!(!is_contact_line("077-123-4567"));
        // Country code token is too short on its own.
        assert!(!is_contact_line("+94 771234567"));
        assert!(!is_contact_line("Tel 0771234567"));
        assert!(!is_contact_line("1234567890123"));
        assert!(!is_contact_line(" , / "));
    }
}
