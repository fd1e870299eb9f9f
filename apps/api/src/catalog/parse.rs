//! Splitting of multi-value CSV cells into clean lists.

const BULLET: char = '•';
const MIDDLE_DOT: char = '·';

/// Splits a responsibilities/qualifications cell into items.
///
/// Separators are newlines, bullets, and hyphens used as list markers. A hyphen only
/// separates when it stands alone (start of a segment, or whitespace on both sides), so
/// `full-stack` and `3-5 years` survive intact. Leading markers are stripped and empty
/// items dropped.
pub fn parse_list(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    raw.split(|c| c == '\n' || c == BULLET)
        .flat_map(split_marker_hyphens)
        .map(|item| {
            item.trim_start_matches(|c: char| c.is_whitespace() || c == BULLET || c == '-')
                .trim()
        })
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits a skills cell on commas, newlines, and middle dots.
pub fn parse_skills(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    raw.split(|c| c == ',' || c == '\n' || c == MIDDLE_DOT)
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_marker_hyphens(segment: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = segment.char_indices().collect();
    let mut pieces = Vec::new();
    let mut start = 0;

    for (i, &(idx, c)) in chars.iter().enumerate() {
        if c != '-' {
            continue;
        }
        let spaced_before = i == 0 || chars[i - 1].1.is_whitespace();
        let spaced_after = chars.get(i + 1).map_or(true, |&(_, next)| next.is_whitespace());
        if spaced_before && spaced_after {
            pieces.push(&segment[start..idx]);
            start = idx + 1;
        }
    }
    pieces.push(&segment[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_normalizes_markers() {
        assert_eq!(parse_list(Some("A\n- B\n• C")), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_parse_list_handles_crlf_and_blank_lines() {
        assert_eq!(
            parse_list(Some("- Build APIs\r\n\r\n- Review code\r\n")),
            vec!["Build APIs", "Review code"]
        );
    }

    #[test]
    fn test_parse_list_inline_bullets() {
        assert_eq!(
            parse_list(Some("• Design • Ship • Operate")),
            vec!["Design", "Ship", "Operate"]
        );
    }

    #[test]
    fn test_parse_list_spaced_hyphen_separates() {
        assert_eq!(parse_list(Some("Go - Rust")), vec!["Go", "Rust"]);
    }

    #[test]
    fn test_parse_list_preserves_word_hyphens() {
        assert_eq!(
            parse_list(Some("- full-stack development\n- 3-5 years of e-commerce")),
            vec!["full-stack development", "3-5 years of e-commerce"]
        );
    }

    #[test]
    fn test_parse_list_strips_glued_leading_marker() {
        assert_eq!(parse_list(Some("-Python\n•SQL")), vec!["Python", "SQL"]);
    }

    #[test]
    fn test_parse_list_empty_inputs() {
        assert!(parse_list(None).is_empty());
        assert!(parse_list(Some("")).is_empty());
        assert!(parse_list(Some(" \n - \n • ")).is_empty());
    }

    #[test]
    fn test_parse_skills_mixed_separators() {
        assert_eq!(
            parse_skills(Some("Go, Rust·C++\nPython")),
            vec!["Go", "Rust", "C++", "Python"]
        );
    }

    #[test]
    fn test_parse_skills_drops_empty_entries() {
        assert_eq!(parse_skills(Some(" ,Kotlin,, · \n")), vec!["Kotlin"]);
        assert!(parse_skills(None).is_empty());
    }
}
