#[cfg(test)]
mod tests {
    use bagrut_coach::pipelines::markers::{
        classify_step_response, extract_between, preview, StepSignal, ALL_STEPS_CORRECT_MARKER,
        END_STEP_MARKER, NEXT_STEP_MARKER, RETRY_STEP_MARKER,
    };

    #[test]
    fn test_completion_signal() {
        let reply = format!("כל הכבוד! פתרת את כל השלבים. {}", ALL_STEPS_CORRECT_MARKER);
        assert_eq!(classify_step_response(&reply), StepSignal::Complete);
    }

    #[test]
    fn test_completion_wins_over_advance_and_retry() {
        // Completion replies sometimes restate the last step inside the
        // advance or retry markers; the session must still close.
        let reply = format!(
            "{} מעולה! {} סיימנו את השלב האחרון {} {} נסה שוב {}",
            ALL_STEPS_CORRECT_MARKER,
            NEXT_STEP_MARKER,
            END_STEP_MARKER,
            RETRY_STEP_MARKER,
            END_STEP_MARKER
        );
        assert_eq!(classify_step_response(&reply), StepSignal::Complete);
    }

    #[test]
    fn test_advance_signal_extracts_step_text() {
        let reply = format!(
            "תשובה נכונה! {} חשב את שיפוע הישר בעזרת הנגזרת {}",
            NEXT_STEP_MARKER, END_STEP_MARKER
        );
        assert_eq!(
            classify_step_response(&reply),
            StepSignal::Advance("חשב את שיפוע הישר בעזרת הנגזרת".to_string())
        );
    }

    #[test]
    fn test_advance_wins_over_retry() {
        let reply = format!(
            "{} השלב הבא {} אם טעית, {} נסה שוב {}",
            NEXT_STEP_MARKER, END_STEP_MARKER, RETRY_STEP_MARKER, END_STEP_MARKER
        );
        assert_eq!(
            classify_step_response(&reply),
            StepSignal::Advance("השלב הבא".to_string())
        );
    }

    #[test]
    fn test_retry_signal_extracts_step_text() {
        let reply = format!(
            "לא מדויק. {} נסה שוב: מהו המקדם של x? {}",
            RETRY_STEP_MARKER, END_STEP_MARKER
        );
        assert_eq!(
            classify_step_response(&reply),
            StepSignal::Retry("נסה שוב: מהו המקדם של x?".to_string())
        );
    }

    #[test]
    fn test_no_marker_is_unparseable() {
        let reply = "תשובה מצוינת, נמשיך לשלב הבא.";
        assert_eq!(classify_step_response(reply), StepSignal::Unparseable);
    }

    #[test]
    fn test_empty_advance_content_is_unparseable() {
        // A matched opening marker with nothing inside must not fall
        // through to the retry marker further down the reply.
        let reply = format!(
            "{}   {} {} יש כאן תוכן {}",
            NEXT_STEP_MARKER, END_STEP_MARKER, RETRY_STEP_MARKER, END_STEP_MARKER
        );
        assert_eq!(classify_step_response(&reply), StepSignal::Unparseable);
    }

    #[test]
    fn test_unclosed_marker_is_unparseable() {
        let reply = format!("{} שלב בלי סוגר", NEXT_STEP_MARKER);
        assert_eq!(classify_step_response(&reply), StepSignal::Unparseable);
    }

    #[test]
    fn test_extract_between_takes_nearest_closing() {
        let text = "[A] first [B] second [B]";
        assert_eq!(extract_between(text, "[A]", "[B]"), Some("first"));
    }

    #[test]
    fn test_extract_between_trims_whitespace() {
        let text = "[A]\n  תוכן עם רווחים  \n[B]";
        assert_eq!(extract_between(text, "[A]", "[B]"), Some("תוכן עם רווחים"));
    }

    #[test]
    fn test_extract_between_missing_tokens() {
        assert_eq!(extract_between("no markers here", "[A]", "[B]"), None);
        assert_eq!(extract_between("[A] opened only", "[A]", "[B]"), None);
    }

    #[test]
    fn test_preview_counts_chars_not_bytes() {
        // Hebrew letters are two bytes each; byte slicing would panic here.
        let text = "אבגדהוזחטי";
        assert_eq!(preview(text, 4), "אבגד...");
        assert_eq!(preview(text, 10), "אבגדהוזחטי");
        assert_eq!(preview(text, 20), "אבגדהוזחטי");
    }
}
