//! SRT subtitle generation.
//!
//! The output contract is exact: blocks of index line, time-range line,
//! one text line, and a blank separator, joined with `\n`. Segments whose
//! trimmed text is empty are dropped without consuming an index.

use crate::types::Segment;

/// Format seconds as an SRT timestamp: `HH:MM:SS,mmm`.
///
/// Milliseconds are truncated, never rounded. All fields are carved out of a
/// single total-milliseconds value so rounding error cannot accumulate from
/// one field into the next. Hours widen past two digits when needed.
///
/// # Panics
///
/// Panics if `seconds` is negative or not finite.
pub fn format_timestamp(seconds: f64) -> String {
    assert!(
        seconds.is_finite() && seconds >= 0.0,
        "timestamp must be a non-negative finite number of seconds, got {seconds}"
    );
    let total_ms = (seconds * 1000.0) as u64;
    let h = total_ms / 3_600_000;
    let m = (total_ms % 3_600_000) / 60_000;
    let s = (total_ms % 60_000) / 1_000;
    let ms = total_ms % 1_000;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

/// Render ordered segments as SRT text.
///
/// Segments are taken in the order given (no re-sorting). A segment whose
/// trimmed text is empty emits nothing and does not advance the index, so
/// entry numbers stay contiguous from 1. The result is the emitted lines
/// joined with `\n`, nothing more.
pub fn render(segments: &[Segment]) -> String {
    let mut lines = Vec::new();
    let mut index = 1u32;

    for segment in segments {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }

        lines.push(index.to_string());
        lines.push(format!(
            "{} --> {}",
            format_timestamp(segment.start),
            format_timestamp(segment.end)
        ));
        lines.push(text.to_string());
        lines.push(String::new());
        index += 1;
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> Segment {
        Segment {
            start,
            end,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_timestamp(0.0), "00:00:00,000");
    }

    #[test]
    fn test_format_hours_minutes_seconds_millis() {
        assert_eq!(format_timestamp(3661.5), "01:01:01,500");
    }

    #[test]
    fn test_format_truncates_milliseconds() {
        assert_eq!(format_timestamp(59.999), "00:00:59,999");
        assert_eq!(format_timestamp(12.34), "00:00:12,340");
        assert_eq!(format_timestamp(0.0009), "00:00:00,000");
    }

    #[test]
    fn test_format_hours_widen_past_two_digits() {
        assert_eq!(format_timestamp(360_000.0), "100:00:00,000");
    }

    #[test]
    #[should_panic]
    fn test_format_rejects_negative() {
        format_timestamp(-0.5);
    }

    #[test]
    fn test_render_empty_input() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn test_render_skips_blank_segments_and_renumbers() {
        let segments = [
            seg(0.0, 5.0, "Hello"),
            seg(5.0, 10.0, "  "),
            seg(10.0, 12.34, "World"),
        ];

        let expected = "1\n\
                        00:00:00,000 --> 00:00:05,000\n\
                        Hello\n\
                        \n\
                        2\n\
                        00:00:10,000 --> 00:00:12,340\n\
                        World\n";

        assert_eq!(render(&segments), expected);
    }

    #[test]
    fn test_render_trims_segment_text() {
        let out = render(&[seg(1.0, 2.0, "  padded  ")]);
        assert_eq!(out, "1\n00:00:01,000 --> 00:00:02,000\npadded\n");
    }

    #[test]
    fn test_render_numbers_are_contiguous() {
        let segments = [
            seg(0.0, 1.0, ""),
            seg(1.0, 2.0, "one"),
            seg(2.0, 3.0, "\t\n"),
            seg(3.0, 4.0, "two"),
            seg(4.0, 5.0, "three"),
        ];
        let out = render(&segments);
        let indices: Vec<&str> = out
            .split("\n\n")
            .filter(|block| !block.trim().is_empty())
            .map(|block| block.lines().next().unwrap())
            .collect();
        assert_eq!(indices, ["1", "2", "3"]);
    }

    #[test]
    fn test_render_preserves_input_order() {
        let out = render(&[seg(10.0, 11.0, "later"), seg(0.0, 1.0, "earlier")]);
        let first = out.lines().nth(2).unwrap();
        assert_eq!(first, "later");
    }
}
