//! Two-line display with a main page and expiring overlays

use super::feedback::Feedback;
use crate::runtime::Millis;

type Lines = (String, String);

/// Blank columns scrolled past the end of a long line before it restarts
const SCROLL_PADDING: usize = 8;

#[derive(Debug, Clone)]
struct Overlay {
    lines: Lines,
    until: Millis,
}

/// Display state of the keyboard's two text lines
///
/// The main page stays until replaced. Overlays (hints, navigation pages)
/// cover it until their expiry time, after which the main page shows again
/// on the next refresh. Lines wider than the display scroll one character
/// per [`PagedDisplay::scroll`] call. The display never schedules anything
/// itself; the controller schedules refreshes and scroll steps.
#[derive(Debug, Clone)]
pub struct PagedDisplay {
    width: usize,
    hint_all_caps: bool,
    main: Lines,
    overlay: Option<Overlay>,
    offsets: (usize, usize),
    last_pushed: Option<Lines>,
}

impl PagedDisplay {
    pub fn new(width: usize, hint_all_caps: bool) -> Self {
        Self {
            width,
            hint_all_caps,
            main: (String::new(), String::new()),
            overlay: None,
            offsets: (0, 0),
            last_pushed: None,
        }
    }

    /// Replaces the main page
    pub fn set_main(&mut self, line1: &str, line2: &str) {
        self.main = (line1.to_string(), line2.to_string());
        self.offsets = (0, 0);
    }

    /// Shows an overlay until `until`
    pub fn show_page(&mut self, line1: &str, line2: &str, until: Millis) {
        self.overlay = Some(Overlay {
            lines: (line1.to_string(), line2.to_string()),
            until,
        });
        self.offsets = (0, 0);
    }

    /// Shows a hint overlay, upper-cased when configured
    pub fn show_hint(&mut self, line1: &str, line2: &str, until: Millis) {
        if self.hint_all_caps {
            self.show_page(&line1.to_uppercase(), &line2.to_uppercase(), until);
        } else {
            self.show_page(line1, line2, until);
        }
    }

    /// Expiry of the current overlay, if one is showing
    pub fn overlay_until(&self) -> Option<Millis> {
        self.overlay.as_ref().map(|overlay| overlay.until)
    }

    fn source(&self, now: Millis) -> &Lines {
        match &self.overlay {
            Some(overlay) if now < overlay.until => &overlay.lines,
            _ => &self.main,
        }
    }

    /// Lines that should be visible at `now`
    pub fn render(&self, now: Millis) -> Lines {
        let (line1, line2) = self.source(now);
        (
            window(line1, self.offsets.0, self.width),
            window(line2, self.offsets.1, self.width),
        )
    }

    /// Whether either visible line is wider than the display
    pub fn overflows(&self, now: Millis) -> bool {
        let (line1, line2) = self.source(now);
        line1.chars().count() > self.width || line2.chars().count() > self.width
    }

    /// Moves long lines one character on, wrapping after a short gap
    pub fn scroll(&mut self, now: Millis) {
        let (line1, line2) = self.source(now);
        let offsets = (
            next_offset(self.offsets.0, line1, self.width),
            next_offset(self.offsets.1, line2, self.width),
        );
        self.offsets = offsets;
    }

    /// Pushes the visible lines to `sink` if they changed
    ///
    /// Returns whether anything was written.
    pub fn refresh(&mut self, now: Millis, sink: &mut dyn Feedback) -> bool {
        if self.overlay.as_ref().is_some_and(|overlay| now >= overlay.until) {
            self.overlay = None;
            self.offsets = (0, 0);
        }

        let lines = self.render(now);
        if self.last_pushed.as_ref() == Some(&lines) {
            return false;
        }
        sink.show_lines(&lines.0, &lines.1);
        self.last_pushed = Some(lines);
        true
    }
}

/// `width` characters of `line` starting at `offset`
fn window(line: &str, offset: usize, width: usize) -> String {
    line.chars().skip(offset).take(width).collect()
}

fn next_offset(offset: usize, line: &str, width: usize) -> usize {
    let len = line.chars().count();
    if len <= width || offset + width >= len + SCROLL_PADDING {
        0
    } else {
        offset + 1
    }
}
