//! Output diffing: what a full re-run printed that the user hasn't seen yet.

/// The newly visible part of a program's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    /// New non-blank lines, each trimmed, stitched together with no separator.
    pub text: String,
    /// Total non-blank lines in the full output.
    pub shown: usize,
}

/// Reduce `full` output to the lines after the first `previously_shown`
/// non-blank ones.
///
/// Blank lines (empty after trimming) are ignored for both the delta and the
/// count. The returned count is recomputed from `full`, so it never exceeds
/// the number of non-blank lines actually present.
#[must_use]
pub fn reduce(full: &str, previously_shown: usize) -> Delta {
    let visible: Vec<&str> = full
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if visible.len() < previously_shown {
        tracing::warn!(
            total = visible.len(),
            previously_shown,
            "program output shrank below the shown-line count"
        );
    }

    let text = visible.iter().skip(previously_shown).copied().collect();
    Delta {
        text,
        shown: visible.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_output() {
        let delta = reduce("2\n", 0);
        assert_eq!(delta.text, "2");
        assert_eq!(delta.shown, 1);
    }

    #[test]
    fn test_skips_already_shown() {
        let delta = reduce("2\n5\n", 1);
        assert_eq!(delta.text, "5");
        assert_eq!(delta.shown, 2);
    }

    #[test]
    fn test_no_new_output() {
        let delta = reduce("2\n", 1);
        assert_eq!(delta.text, "");
        assert_eq!(delta.shown, 1);

        let delta = reduce("", 0);
        assert_eq!(delta, Delta { text: String::new(), shown: 0 });
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let full = "\n  \na\n\n\t\nb\n   \nc\n";
        let delta = reduce(full, 1);
        assert_eq!(delta.text, "bc");
        assert_eq!(delta.shown, 3);
    }

    #[test]
    fn test_new_lines_are_stitched_without_separator() {
        let delta = reduce("1\nhello\n world \n", 1);
        assert_eq!(delta.text, "helloworld");
        assert_eq!(delta.shown, 3);
    }

    #[test]
    fn test_crlf_output() {
        let delta = reduce("1\r\n2\r\n", 1);
        assert_eq!(delta.text, "2");
        assert_eq!(delta.shown, 2);
    }

    #[test]
    fn test_shrinking_output_is_capped_at_total() {
        let delta = reduce("only\n", 4);
        assert_eq!(delta.text, "");
        assert_eq!(delta.shown, 1);
    }

    #[test]
    fn test_count_monotonic_when_output_grows() {
        let mut shown = 0;
        let mut full = String::new();
        for i in 0..5 {
            full.push_str(&format!("{i}\n\n"));
            let delta = reduce(&full, shown);
            assert!(delta.shown >= shown);
            assert_eq!(delta.text, i.to_string());
            shown = delta.shown;
        }
        assert_eq!(shown, 5);
    }
}
