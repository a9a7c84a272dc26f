//! Interactive gate in front of very large downloads.

use std::io::{self, BufRead, Write};

use crate::PlanEstimate;

/// Format an integer with `,` thousands separators
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Print the size of a large download and ask whether to continue.
///
/// Only an answer of `y` (any case, surrounding whitespace ignored)
/// confirms. End of input counts as "no".
pub fn confirm_large_region<R, W>(
    estimate: &PlanEstimate,
    min_zoom: u8,
    max_zoom: u8,
    mut reader: R,
    mut writer: W,
) -> io::Result<bool>
where
    R: BufRead,
    W: Write,
{
    writeln!(
        writer,
        "WARNING: This is a large region. At zoom levels {}-{} this may download:",
        min_zoom, max_zoom
    )?;
    writeln!(
        writer,
        "  Estimated tiles: {}",
        format_count(estimate.tiles)
    )?;
    writeln!(writer, "  Estimated size: {:.1} MB", estimate.megabytes)?;
    write!(writer, "Continue? (y/N): ")?;
    writer.flush()?;

    let mut answer = String::new();
    reader.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
