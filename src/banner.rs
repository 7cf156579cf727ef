//! License banner stamped at the top of every bundle.

use std::fmt;
use chrono::{Datelike, Local, NaiveDateTime, Timelike};

/// Pattern used for the banner's `Date:` line
pub const BANNER_DATE_PATTERN: &str = "yyyy-MM-dd hh:mm";

/// Comment block naming the library and the build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    library_name: String,
    date: String,
}

impl Banner {
    pub fn new(library_name: impl Into<String>, at: &NaiveDateTime) -> Self {
        Self {
            library_name: library_name.into(),
            date: format_timestamp(at, BANNER_DATE_PATTERN),
        }
    }

    /// Banner stamped with the local time
    pub fn now(library_name: impl Into<String>) -> Self {
        Self::new(library_name, &Local::now().naive_local())
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/*!\n * {}\n * Date: {}\n */\n", self.library_name, self.date)
    }
}

/// Format `at` with a date pattern.
///
/// Runs of `y` take the trailing digits of the year (`yy` → `24`). Runs of
/// `M`, `d`, `h` (24-hour), `m`, `s` and `q` (quarter) print the value as is
/// when the run is one letter long and zero-padded to two digits otherwise.
/// `S` is milliseconds. Every other character is copied through.
pub fn format_timestamp(at: &NaiveDateTime, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        let mut run = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }

        let value = match c {
            'y' => {
                let year = at.year().to_string();
                let skip = year.len().saturating_sub(run);
                out.push_str(&year[skip..]);
                continue;
            }
            'M' => at.month(),
            'd' => at.day(),
            'h' => at.hour(),
            'm' => at.minute(),
            's' => at.second(),
            'q' => (at.month() - 1) / 3 + 1,
            'S' => {
                out.push_str(&(at.nanosecond() / 1_000_000 % 1000).to_string());
                continue;
            }
            _ => {
                out.extend(std::iter::repeat_n(c, run));
                continue;
            }
        };

        if run == 1 {
            out.push_str(&value.to_string());
        } else {
            out.push_str(&format!("{value:02}"));
        }
    }

    out
}
