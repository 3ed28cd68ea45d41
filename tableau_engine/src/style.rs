//! Styling helpers for console output.
//!
//! The [`GameStyle`] trait applies ANSI styling via the `colored` crate.
//! It is implemented for `&str` and `String` so literals can be styled directly.

use colored::{ColoredString, Colorize};

/// Convenience trait for applying color and style to text output.
pub trait GameStyle {
    fn actor_style(&self) -> ColoredString;
    fn scene_style(&self) -> ColoredString;
    fn verb_style(&self) -> ColoredString;
    fn description_style(&self) -> ColoredString;
    fn speech_style(&self) -> ColoredString;
    fn event_style(&self) -> ColoredString;
    fn dialog_style(&self) -> ColoredString;
    fn prompt_style(&self) -> ColoredString;
    fn subheading_style(&self) -> ColoredString;
    fn error_style(&self) -> ColoredString;
    fn dimmed_style(&self) -> ColoredString;
}

impl GameStyle for &str {
    fn actor_style(&self) -> ColoredString {
        self.truecolor(13, 130, 60).underline()
    }
    fn scene_style(&self) -> ColoredString {
        self.truecolor(223, 77, 10).underline()
    }
    fn verb_style(&self) -> ColoredString {
        self.truecolor(220, 180, 40)
    }
    fn description_style(&self) -> ColoredString {
        self.italic().truecolor(102, 208, 250)
    }
    fn speech_style(&self) -> ColoredString {
        self.truecolor(230, 230, 30)
    }
    fn event_style(&self) -> ColoredString {
        self.truecolor(150, 230, 30).dimmed()
    }
    fn dialog_style(&self) -> ColoredString {
        self.italic().truecolor(75, 180, 255)
    }
    fn prompt_style(&self) -> ColoredString {
        self.truecolor(75, 80, 75)
    }
    fn subheading_style(&self) -> ColoredString {
        self.underline()
    }
    fn error_style(&self) -> ColoredString {
        self.truecolor(230, 30, 30)
    }
    fn dimmed_style(&self) -> ColoredString {
        self.dimmed()
    }
}

impl GameStyle for String {
    fn actor_style(&self) -> ColoredString {
        self.as_str().actor_style()
    }
    fn scene_style(&self) -> ColoredString {
        self.as_str().scene_style()
    }
    fn verb_style(&self) -> ColoredString {
        self.as_str().verb_style()
    }
    fn description_style(&self) -> ColoredString {
        self.as_str().description_style()
    }
    fn speech_style(&self) -> ColoredString {
        self.as_str().speech_style()
    }
    fn event_style(&self) -> ColoredString {
        self.as_str().event_style()
    }
    fn dialog_style(&self) -> ColoredString {
        self.as_str().dialog_style()
    }
    fn prompt_style(&self) -> ColoredString {
        self.as_str().prompt_style()
    }
    fn subheading_style(&self) -> ColoredString {
        self.as_str().subheading_style()
    }
    fn error_style(&self) -> ColoredString {
        self.as_str().error_style()
    }
    fn dimmed_style(&self) -> ColoredString {
        self.as_str().dimmed_style()
    }
}
