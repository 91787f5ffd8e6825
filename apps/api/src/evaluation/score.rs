//! Score-line normalization.
//!
//! Models are asked to open the Overall Evaluation section with `Score: XX/100`,
//! but every provider drifts: `**Final Score** - 82 / 100`, `SCORE 75/100`,
//! `Score (out of 100): 64/100`, and so on. The UI reads exactly one format, so
//! every line is rewritten independently by the first of three passes that
//! matches it:
//!
//! 1. structured: `<words> score <separators> N / 100`, matched span replaced
//! 2. loose: `score`, up to 20 non-digit characters, `N / 100`, matched span replaced
//! 3. rebuild: standalone word `score` plus any `N/100` on the line; the whole
//!    line becomes the canonical form
//!
//! Only integers in `0..=100` are ever written out. Lines no pass accepts are
//! returned untouched.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Words (optionally wrapped in `**`) leading up to the keyword are absorbed
/// into the replaced span. A word starts at a word boundary and never with a
/// digit, so fractions such as `80/100` earlier on the line stay out of it.
/// Both span passes share this prefix so a line rewritten by the loose pass is
/// a fixed point of the structured pass.
const LEADING_WORDS: &str = r"(?:(?:\b[\p{L}_]|\*)[\w*]*\s+)*\**";

static STRUCTURED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i){LEADING_WORDS}score\**\s*[:\-–—\s*]*([0-9]{{1,3}})\s*/\s*100\b"
    ))
    .expect("structured score pattern is valid")
});

static LOOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i){LEADING_WORDS}score[^0-9]{{0,20}}([0-9]{{1,3}})\s*/\s*100\b"
    ))
    .expect("loose score pattern is valid")
});

static SCORE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bscore\b").expect("score word pattern is valid"));

static OUT_OF_HUNDRED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])([0-9]{1,3})\s*/\s*100\b").expect("out-of-hundred pattern is valid")
});

static CANONICAL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Score: ([0-9]{1,3})/100$").expect("canonical line pattern is valid")
});

pub const MAX_SCORE: u8 = 100;

/// The one format the UI accepts.
pub fn canonical_score_line(score: u8) -> String {
    format!("Score: {score}/100")
}

/// Rewrites every score-bearing line of `text` into `Score: N/100`.
///
/// Idempotent, and line structure (count, order, separators) is preserved.
pub fn normalize_score_lines(text: &str) -> String {
    text.split('\n')
        .map(normalize_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize_line(line: &str) -> String {
    replace_in_range(&STRUCTURED, line)
        .or_else(|| replace_in_range(&LOOSE, line))
        .or_else(|| rebuild_line(line))
        .unwrap_or_else(|| line.to_string())
}

/// Replaces every in-range match of `pattern`, leaving out-of-range matches
/// verbatim. Returns `None` when no in-range match exists so the caller can
/// fall through to the next pass.
fn replace_in_range(pattern: &Regex, line: &str) -> Option<String> {
    let mut replaced = false;
    let rewritten = pattern.replace_all(line, |caps: &Captures| match parse_score(&caps[1]) {
        Some(score) => {
            replaced = true;
            canonical_score_line(score)
        }
        None => caps[0].to_string(),
    });

    replaced.then(|| rewritten.into_owned())
}

/// Last resort: drops everything else on the line.
fn rebuild_line(line: &str) -> Option<String> {
    if !SCORE_WORD.is_match(line) {
        return None;
    }
    let caps = OUT_OF_HUNDRED.captures(line)?;
    parse_score(&caps[1]).map(canonical_score_line)
}

fn parse_score(digits: &str) -> Option<u8> {
    digits.parse::<u8>().ok().filter(|score| *score <= MAX_SCORE)
}

/// Reads the canonical score from the Overall Evaluation section.
///
/// Sections start at lines beginning with `###`. Returns `None` when the
/// section is missing or carries no canonical line.
pub fn overall_score(text: &str) -> Option<u8> {
    text.lines()
        .skip_while(|line| !is_overall_heading(line))
        .skip(1)
        .take_while(|line| !line.trim_start().starts_with("###"))
        .find_map(|line| {
            CANONICAL_LINE
                .captures(line.trim())
                .and_then(|caps| parse_score(&caps[1]))
        })
}

fn is_overall_heading(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("###") && line.to_lowercase().contains("overall evaluation")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_canonical_line_is_fixed_point() {
        assert_eq!(normalize_score_lines("Score: 75/100"), "Score: 75/100");
    }

    #[test]
    fn test_overall_score_with_dash_and_spaced_slash() {
        assert_eq!(
            normalize_score_lines("Overall Score - 82 / 100"),
            "Score: 82/100"
        );
    }

    #[test]
    fn test_bold_final_score() {
        assert_eq!(
            normalize_score_lines("**Final Score**: 91/100"),
            "Score: 91/100"
        );
    }

    #[test]
    fn test_bold_label_with_colon_inside_emphasis() {
        assert_eq!(normalize_score_lines("**Score:** 64/100"), "Score: 64/100");
    }

    #[test]
    fn test_en_and_em_dash_separators() {
        assert_eq!(normalize_score_lines("Score – 70/100"), "Score: 70/100");
        assert_eq!(normalize_score_lines("Score — 71/100"), "Score: 71/100");
    }

    #[test]
    fn test_structured_pass_keeps_trailing_text() {
        // The structured pass matches here, so only the matched span is rewritten.
        assert_eq!(
            normalize_score_lines("SCORE   75 / 100 extra text"),
            "Score: 75/100 extra text"
        );
    }

    #[test]
    fn test_structured_pass_keeps_text_before_punctuation() {
        assert_eq!(
            normalize_score_lines("Result -> Final Score 80/100"),
            "Result -> Score: 80/100"
        );
    }

    #[test]
    fn test_earlier_fraction_is_not_absorbed() {
        assert_eq!(
            normalize_score_lines("Skills 80/100 score 70/100"),
            "Skills 80/100 Score: 70/100"
        );
        assert_eq!(
            normalize_score_lines("Experience 8/10, overall score 70/100"),
            "Experience 8/10, Score: 70/100"
        );
    }

    #[test]
    fn test_word_starting_with_digit_is_kept() {
        assert_eq!(
            normalize_score_lines("2nd round Score: 64/100"),
            "2nd Score: 64/100"
        );
    }

    #[test]
    fn test_loose_pass_tolerates_noise_between_keyword_and_number() {
        assert_eq!(
            normalize_score_lines("Score (overall): 58/100 for this role"),
            "Score: 58/100 for this role"
        );
    }

    #[test]
    fn test_loose_pass_absorbs_leading_words() {
        assert_eq!(
            normalize_score_lines("the candidate deserves score, I think 45/100 overall"),
            "Score: 45/100 overall"
        );
    }

    #[test]
    fn test_loose_window_is_bounded() {
        let line = "score is hard to pin down for this profile, roughly 45/100";
        // Gap exceeds the window, so the rebuild pass takes the whole line.
        assert_eq!(normalize_score_lines(line), "Score: 45/100");
    }

    #[test]
    fn test_rebuild_when_number_precedes_keyword() {
        assert_eq!(
            normalize_score_lines("45/100 is the final score for this candidate"),
            "Score: 45/100"
        );
    }

    #[test]
    fn test_rebuild_out_of_range_leaves_line() {
        let line = "score ... 150/100";
        assert_eq!(normalize_score_lines(line), line);
    }

    #[test]
    fn test_structured_out_of_range_is_not_canonicalized() {
        let line = "Score: 150/100";
        assert_eq!(normalize_score_lines(line), line);
    }

    #[test]
    fn test_no_keyword_is_left_alone() {
        let line = "100/100 students passed";
        assert_eq!(normalize_score_lines(line), line);
    }

    #[test]
    fn test_rebuild_requires_standalone_word() {
        let line = "The scoreboard showed 40/100";
        // Loose pass still sees "score" as a substring.
        assert_eq!(normalize_score_lines(line), "Score: 40/100");

        let line = "scores vary, 40 out of 100 at best";
        assert_eq!(normalize_score_lines(line), line);
    }

    #[test]
    fn test_digits_must_be_whole_numbers() {
        let line = "score ratio 1500/100";
        assert_eq!(normalize_score_lines(line), line);

        let line = "score 50/1000";
        assert_eq!(normalize_score_lines(line), line);
    }

    #[test]
    fn test_other_lines_preserved_verbatim() {
        let input = "### Overall Evaluation\n**Overall Score** - 77 / 100\nSolid resume.\n\n### Skills\n- Rust";
        let expected = "### Overall Evaluation\nScore: 77/100\nSolid resume.\n\n### Skills\n- Rust";
        assert_eq!(normalize_score_lines(input), expected);
    }

    #[test]
    fn test_trailing_newline_and_empty_input() {
        assert_eq!(normalize_score_lines(""), "");
        assert_eq!(normalize_score_lines("Score 5/100\n"), "Score: 5/100\n");
    }

    #[test]
    fn test_zero_and_hundred_bounds() {
        assert_eq!(normalize_score_lines("score: 0/100"), "Score: 0/100");
        assert_eq!(normalize_score_lines("score: 100/100"), "Score: 100/100");
    }

    #[test]
    fn test_idempotent_on_known_cases() {
        let cases = [
            "Overall Score - 82 / 100",
            "SCORE   75 / 100 extra text",
            "the candidate deserves score, I think 45/100 overall",
            "ab **Final Score**: 80/100",
            "Note - candidate score, I think 45/100",
            "xyz-abc Score: 5/100",
            "score ... 150/100",
            "Skills 80/100 score 70/100",
            "2nd round Score: 64/100",
        ];
        for case in cases {
            let once = normalize_score_lines(case);
            assert_eq!(normalize_score_lines(&once), once, "input: {case}");
        }
    }

    #[test]
    fn test_overall_score_reads_section() {
        let text = "### Overall Evaluation\nScore: 68/100\nSummary.\n### Skills\nScore: 10/100";
        assert_eq!(overall_score(text), Some(68));
    }

    #[test]
    fn test_overall_score_ignores_other_sections() {
        let text = "### Skills\nScore: 10/100\n### Overall Evaluation\nNo score here.";
        assert_eq!(overall_score(text), None);
    }

    #[test]
    fn test_overall_score_missing_section() {
        assert_eq!(overall_score("Score: 50/100"), None);
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(s in "(?s).{0,120}") {
            let once = normalize_score_lines(&s);
            prop_assert_eq!(normalize_score_lines(&once), once);
        }

        #[test]
        fn prop_scoreish_lines_are_idempotent(
            prefix in "[A-Za-z* ]{0,12}",
            sep in "[:\\-– *]{0,4}",
            noise in "[a-z ,()]{0,25}",
            n in 0u32..1000,
            suffix in "[a-z .]{0,10}",
        ) {
            let line = format!("{prefix}Score{sep}{noise}{n} / 100{suffix}");
            let once = normalize_score_lines(&line);
            prop_assert_eq!(normalize_score_lines(&once), once);
        }

        #[test]
        fn prop_earlier_fraction_survives(
            label in "[a-rt-zA-RT-Z]{1,10}",
            earlier in 0u32..1000,
            n in 0u8..=100,
        ) {
            let line = format!("{label} {earlier}/100 score {n}/100");
            prop_assert_eq!(
                normalize_score_lines(&line),
                format!("{label} {earlier}/100 Score: {n}/100")
            );
        }

        #[test]
        fn prop_line_count_preserved(s in "(?s).{0,200}") {
            let out = normalize_score_lines(&s);
            prop_assert_eq!(out.split('\n').count(), s.split('\n').count());
        }
    }
}
