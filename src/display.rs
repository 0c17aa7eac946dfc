//! Console view.
//!
//! The engine hands over a [`DisplayState`] and a renderer turns it into
//! terminal output. The console renderer redraws the whole screen once per
//! cycle and rewrites the progress line in place on every tick.

use std::io::Write;

use crate::config::Config;
use crate::fetch::PriceReading;

const BAR_WIDTH: usize = 30;
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Everything the view needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub reading: PriceReading,
    pub updated_at: String,
    pub seconds_remaining: u32,
    pub total: u32,
}

pub trait Renderer: Send + Sync {
    /// Full redraw after a fetch.
    fn render(&self, state: &DisplayState);
    /// Countdown update.
    fn progress(&self, state: &DisplayState);
    /// Final message on shutdown.
    fn farewell(&self);
}

pub struct ConsoleRenderer {
    asset: String,
    currency: String,
}

impl ConsoleRenderer {
    pub fn new(config: &Config) -> Self {
        Self {
            asset: capitalize(&config.coin),
            currency: config.currency.clone(),
        }
    }

    pub fn headline(&self, reading: &PriceReading) -> String {
        match reading.value() {
            Some(price) => format!("{} price: {}", self.asset, format_price(price, &self.currency)),
            None => "Unable to retrieve price.".to_string(),
        }
    }
}

impl Renderer for ConsoleRenderer {
    fn render(&self, state: &DisplayState) {
        let mut out = std::io::stdout().lock();
        let _ = write!(
            out,
            "{}{}\nUpdated {}\n\nType q + Enter or press Ctrl-C to quit.\n\n",
            CLEAR_SCREEN,
            self.headline(&state.reading),
            state.updated_at,
        );
        let _ = out.flush();
    }

    fn progress(&self, state: &DisplayState) {
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\r{}", progress_line(state.seconds_remaining, state.total));
        let _ = out.flush();
    }

    fn farewell(&self) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "\n\nStopped. Goodbye!");
        let _ = out.flush();
    }
}

/// `$67012.50` for USD, `61000.00 EUR` otherwise.
pub fn format_price(price: f64, currency: &str) -> String {
    if currency.eq_ignore_ascii_case("usd") {
        format!("${:.2}", price)
    } else {
        format!("{:.2} {}", price, currency.to_uppercase())
    }
}

/// `Next update in  42s [########......................]`
pub fn progress_line(seconds_remaining: u32, total: u32) -> String {
    let done = total.saturating_sub(seconds_remaining);
    let filled = if total == 0 {
        BAR_WIDTH
    } else {
        (done as usize * BAR_WIDTH) / total as usize
    };
    format!(
        "Next update in {:>3}s [{}{}]",
        seconds_remaining,
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headline() {
        let renderer = ConsoleRenderer::new(&Config::default());
        assert_eq!(
            renderer.headline(&PriceReading::valid(67012.5)),
            "Bitcoin price: $67012.50"
        );
        assert_eq!(
            renderer.headline(&PriceReading::invalid()),
            "Unable to retrieve price."
        );
    }

    #[test]
    fn test_format_price_other_currency() {
        assert_eq!(format_price(61000.0, "eur"), "61000.00 EUR");
        assert_eq!(format_price(0.1234, "USD"), "$0.12");
    }

    #[test]
    fn test_progress_line() {
        assert_eq!(
            progress_line(60, 60),
            format!("Next update in  60s [{}]", ".".repeat(BAR_WIDTH))
        );
        assert_eq!(
            progress_line(30, 60),
            format!("Next update in  30s [{}{}]", "#".repeat(15), ".".repeat(15))
        );
        assert!(progress_line(1, 60).contains("  1s"));
    }

    #[test]
    fn test_progress_line_zero_total() {
        assert_eq!(
            progress_line(0, 0),
            format!("Next update in   0s [{}]", "#".repeat(BAR_WIDTH))
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("bitcoin"), "Bitcoin");
        assert_eq!(capitalize(""), "");
    }
}
