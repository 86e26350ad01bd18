//! Property tests for the scroll window

use charlcd_core::{Line, Screen, ScrollMode, DISPLAY_COLS, MAX_TEXT_LEN};
use proptest::prelude::*;

fn printable(min: usize, max: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0x20u8..0x7F, min..=max)
}

proptest! {
    #[test]
    fn short_text_is_padded_and_never_scrolls(text in printable(0, DISPLAY_COLS), ticks in 1usize..40) {
        let mut screen = Screen::default();
        screen.set_line(Line::Top, &text);

        let mut expected = [b' '; DISPLAY_COLS];
        expected[..text.len()].copy_from_slice(&text);

        for _ in 0..ticks {
            let frame = screen.next_frame();
            prop_assert_eq!(frame.row(Line::Top), &expected);
            prop_assert_eq!(screen.line(Line::Top).offset(), 0);
        }
    }

    #[test]
    fn rollback_window_slides_then_snaps_back(text in printable(DISPLAY_COLS + 1, MAX_TEXT_LEN)) {
        let mut screen = Screen::new(ScrollMode::Rollback);
        screen.set_line(Line::Bottom, &text);
        let period = text.len() - DISPLAY_COLS + 1;

        for tick in 0..2 * period {
            let start = tick % period;
            let frame = screen.next_frame();
            prop_assert_eq!(&frame.row(Line::Bottom)[..], &text[start..start + DISPLAY_COLS]);
        }
    }

    #[test]
    fn offset_stays_in_range(text in printable(0, MAX_TEXT_LEN), ticks in 0usize..300) {
        let mut screen = Screen::default();
        screen.set_line(Line::Top, &text);
        let max_offset = text.len().saturating_sub(DISPLAY_COLS);

        for _ in 0..ticks {
            screen.next_frame();
            prop_assert!(screen.line(Line::Top).offset() <= max_offset);
        }
    }

    #[test]
    fn set_line_restarts_scroll(text in printable(DISPLAY_COLS + 1, MAX_TEXT_LEN), ticks in 0usize..50) {
        let mut screen = Screen::default();
        screen.set_line(Line::Top, &text);
        for _ in 0..ticks {
            screen.next_frame();
        }

        screen.set_line(Line::Top, &text);
        let frame = screen.next_frame();
        prop_assert!(frame.clear);
        prop_assert_eq!(&frame.row(Line::Top)[..], &text[..DISPLAY_COLS]);
    }

    #[test]
    fn lines_are_independent(top in printable(0, 40), bottom in printable(0, 40), ticks in 1usize..30) {
        let mut together = Screen::default();
        together.set_line(Line::Top, &top);
        together.set_line(Line::Bottom, &bottom);

        let mut only_top = Screen::default();
        only_top.set_line(Line::Top, &top);
        let mut only_bottom = Screen::default();
        only_bottom.set_line(Line::Bottom, &bottom);

        for _ in 0..ticks {
            let frame = together.next_frame();
            let top_frame = only_top.next_frame();
            let bottom_frame = only_bottom.next_frame();
            prop_assert_eq!(frame.row(Line::Top), top_frame.row(Line::Top));
            prop_assert_eq!(frame.row(Line::Bottom), bottom_frame.row(Line::Bottom));
        }
    }
}
