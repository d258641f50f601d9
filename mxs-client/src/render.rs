//! Terminal output: banner, progress bar and result panel
//!
//! Everything here returns strings; the binary decides where they go.

use mxs_common::{BenchmarkResult, ProgressUpdate};
use std::time::Duration;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";
pub const GRAY: &str = "\x1b[90m";

/// Cells in the progress bar
pub const BAR_WIDTH: usize = 40;

const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";

const LOGO: &str = r#"
   __  __       _        _
  |  \/  | __ _| |_ _ __(_)_  __
  | |\/| |/ _` | __| '__| \ \/ /
  | |  | | (_| | |_| |  | |>  <
  |_|  |_|\__,_|\__|_|  |_/_/\_\
      CONCURRENCY BENCHMARK
"#;

pub fn banner() -> String {
    format!("{}{}{}{}{}", CLEAR_SCREEN, CYAN, BOLD, LOGO, RESET)
}

/// Fraction of rows done, in `[0, 1]`; an empty job counts as done
pub fn fraction_complete(update: &ProgressUpdate) -> f64 {
    if update.total_rows == 0 {
        return 1.0;
    }
    (update.rows_processed as f64 / update.total_rows as f64).clamp(0.0, 1.0)
}

/// Rows per second since the client started waiting
pub fn rows_per_second(rows: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        rows as f64 / secs
    } else {
        0.0
    }
}

/// One redraw of the progress line, starting with `\r`
pub fn progress_line(update: &ProgressUpdate, elapsed: Duration) -> String {
    let fraction = fraction_complete(update);
    let filled = ((fraction * BAR_WIDTH as f64) as usize).min(BAR_WIDTH);
    let color = if update.rows_processed >= update.total_rows {
        GREEN
    } else {
        YELLOW
    };

    format!(
        "\r{}[{}{}] {:3.0}% {}| {}/{} | {:.0} rows/s   ",
        color,
        "█".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        fraction * 100.0,
        RESET,
        update.rows_processed,
        update.total_rows,
        rows_per_second(update.rows_processed, elapsed)
    )
}

/// Boxed summary of a finished benchmark
pub fn result_panel(result: &BenchmarkResult) -> String {
    let rule = |left: &str, right: &str| {
        format!("{}{}{}{}{}\n", GRAY, left, "─".repeat(42), right, RESET)
    };

    let mut panel = String::from("\n\n");
    panel.push_str(&rule("┌", "┐"));
    panel.push_str(&format!(
        "{}│           BENCHMARK RESULTS              │{}\n",
        BOLD, RESET
    ));
    panel.push_str(&rule("├", "┤"));
    panel.push_str(&format!(
        "│ Sequential Time : {}{:8.4} s{}             │\n",
        RED, result.seq_time, RESET
    ));
    panel.push_str(&format!(
        "│ Concurrent Time : {}{:8.4} s{}             │\n",
        GREEN, result.conc_time, RESET
    ));
    panel.push_str(&rule("├", "┤"));
    panel.push_str(&format!(
        "│ Speedup Factor  : {}{}{:8.2} x{}             │\n",
        CYAN, BOLD, result.speedup, RESET
    ));
    panel.push_str(&format!(
        "│ Integrity Check : {}{:>9}{}              │\n",
        YELLOW,
        format_scientific(result.checksum, 2),
        RESET
    ));
    panel.push_str(&rule("└", "┘"));
    panel
}

/// Scientific notation with a signed, two-digit exponent (`1.17e+01`)
pub fn format_scientific(value: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, value);
    let Some((mantissa, exponent)) = raw.split_once('e') else {
        return raw;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return raw;
    };

    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exponent.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(rows_processed: usize, total_rows: usize) -> ProgressUpdate {
        ProgressUpdate {
            rows_processed,
            total_rows,
        }
    }

    #[test]
    fn test_format_scientific() {
        assert_eq!(format_scientific(11.734019051799699, 2), "1.17e+01");
        assert_eq!(format_scientific(0.000123, 2), "1.23e-04");
        assert_eq!(format_scientific(0.0, 2), "0.00e+00");
        assert_eq!(format_scientific(-2.5e120, 1), "-2.5e+120");
    }

    #[test]
    fn test_progress_line_half_done_is_yellow() {
        let line = progress_line(&update(50, 100), Duration::from_secs(2));
        assert!(line.starts_with('\r'));
        assert!(line.contains(YELLOW));
        assert_eq!(line.matches('█').count(), 20);
        assert_eq!(line.matches('-').count(), 20);
        assert!(line.contains(" 50%"));
        assert!(line.contains("50/100"));
        assert!(line.contains("25 rows/s"));
    }

    #[test]
    fn test_progress_line_complete_is_green() {
        let line = progress_line(&update(100, 100), Duration::from_secs(1));
        assert!(line.contains(GREEN));
        assert_eq!(line.matches('█').count(), BAR_WIDTH);
        assert!(line.contains("100%"));
    }

    #[test]
    fn test_rate_with_zero_elapsed() {
        assert_eq!(rows_per_second(10, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_fraction_for_empty_job() {
        assert_eq!(fraction_complete(&update(0, 0)), 1.0);
    }

    #[test]
    fn test_result_panel_fields() {
        let result = BenchmarkResult {
            rows_processed: 4,
            total_rows: 4,
            seq_time: 1.5,
            conc_time: 0.5,
            speedup: 3.0,
            checksum: 11.734019051799699,
        };
        let panel = result_panel(&result);
        assert!(panel.contains("BENCHMARK RESULTS"));
        assert!(panel.contains("  1.5000 s"));
        assert!(panel.contains("  0.5000 s"));
        assert!(panel.contains("    3.00 x"));
        assert!(panel.contains(" 1.17e+01"));
    }

    #[test]
    fn test_banner_clears_screen() {
        assert!(banner().starts_with(CLEAR_SCREEN));
    }
}
