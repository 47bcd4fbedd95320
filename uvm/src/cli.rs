use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "uvm",
    about = "UVM Interpreter - Run UVM binary programs",
    version
)]
pub struct Cli {
    /// Binary file to execute
    pub binary_file: PathBuf,

    /// Memory size in cells
    #[arg(short = 'm', long, default_value = "65536")]
    pub memory: usize,

    /// Memory range to dump after the run, as START:END (half-open)
    #[arg(short = 'd', long)]
    pub dump: Option<String>,

    /// Dump output file (defaults to stdout)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Dump format (csv, json)
    #[arg(long, default_value = "csv")]
    pub dump_format: String,
}

/// Parse a half-open `START:END` address range; both ends accept
/// decimal or `0x` hex.
pub fn parse_range(s: &str) -> Result<(usize, usize), String> {
    let (start, end) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid range `{s}`: expected START:END"))?;
    Ok((parse_address(start)?, parse_address(end)?))
}

fn parse_address(text: &str) -> Result<usize, String> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).map_err(|_| format!("invalid hex address: {text}"))
    } else {
        text.parse()
            .map_err(|_| format!("invalid address: {text}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_decimal() {
        assert_eq!(parse_range("1000:1010"), Ok((1000, 1010)));
        assert_eq!(parse_range("0:65536"), Ok((0, 65536)));
    }

    #[test]
    fn test_parse_range_hex() {
        assert_eq!(parse_range("0x3E8:0x3F2"), Ok((1000, 1010)));
        assert_eq!(parse_range("0:0xFFFF"), Ok((0, 0xFFFF)));
    }

    #[test]
    fn test_parse_range_invalid() {
        assert!(parse_range("1000").is_err());
        assert!(parse_range("a:b").is_err());
        assert!(parse_range("10:-5").is_err());
    }
}
