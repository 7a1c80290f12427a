//! Interactive entry of weekly unavailability.

use std::io::{BufRead, Write};

use anyhow::{bail, Result};
use coach_engine::{parse_time_ranges, TimeRange};

pub const FORMAT_HINT: &str = "8:15AM-12:30PM, 1:00PM-3:00PM";

/// Ask for one day's unavailable times, re-prompting until the line parses.
///
/// A blank line means the day has no unavailable time. Running out of input is
/// an error.
pub fn read_time_ranges<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    day: &str,
) -> Result<Vec<TimeRange>> {
    writeln!(output, "Enter unavailable times for {}: ", day)?;
    output.flush()?;

    loop {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("input ended before unavailable times for {} were entered", day);
        }

        match parse_time_ranges(line.trim()) {
            Ok(ranges) => return Ok(ranges),
            Err(err) => {
                tracing::debug!(day, error = %err, "rejected unavailable times");
                writeln!(
                    output,
                    "Incorrect format. Please enter the times in the correct format (e.g., {}).",
                    FORMAT_HINT
                )?;
                writeln!(output, "Enter unavailable times: ")?;
                output.flush()?;
            }
        }
    }
}
