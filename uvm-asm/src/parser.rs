use crate::types::ParsedLine;

pub struct LineParser {
    case_insensitive: bool,
}

impl LineParser {
    pub fn new(case_insensitive: bool) -> Self {
        Self { case_insensitive }
    }

    /// Normalize the source into label and instruction lines. Blank
    /// lines and comment-only lines are dropped here; mnemonics are
    /// not validated (that is pass 2's job).
    pub fn parse_source(&self, source: &str) -> Vec<ParsedLine> {
        let mut parsed = Vec::new();

        for (i, line) in source.lines().enumerate() {
            if let Some(parsed_line) = self.parse_line(line, i + 1) {
                parsed.push(parsed_line);
            }
        }

        parsed
    }

    fn parse_line(&self, line: &str, line_number: usize) -> Option<ParsedLine> {
        // Truncate at the comment delimiter, then strip
        let line = match line.find(';') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let line = line.trim();

        if line.is_empty() {
            return None;
        }

        // A line ending in `:` defines a label at the current address
        if let Some(name) = line.strip_suffix(':') {
            return Some(ParsedLine {
                label: Some(name.trim().to_string()),
                mnemonic: None,
                operands: Vec::new(),
                line_number,
            });
        }

        let mut tokens = line.split_whitespace();
        let mnemonic = tokens.next()?;
        let mnemonic = if self.case_insensitive {
            mnemonic.to_uppercase()
        } else {
            mnemonic.to_string()
        };

        Some(ParsedLine {
            label: None,
            mnemonic: Some(mnemonic),
            operands: tokens.map(str::to_string).collect(),
            line_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_instruction() {
        let parser = LineParser::new(true);
        let lines = parser.parse_source("STORE 1000");

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].mnemonic.as_deref(), Some("STORE"));
        assert_eq!(lines[0].operands, vec!["1000"]);
    }

    #[test]
    fn test_parse_label_line() {
        let parser = LineParser::new(true);
        let lines = parser.parse_source("result:\nLOAD #1");

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].label.as_deref(), Some("result"));
        assert!(lines[0].mnemonic.is_none());
        assert_eq!(lines[1].mnemonic.as_deref(), Some("LOAD"));
    }

    #[test]
    fn test_ignore_comments_and_blanks() {
        let parser = LineParser::new(true);
        let lines = parser.parse_source("; full line comment\n\n  ADD ; trailing\n   \n");

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].mnemonic.as_deref(), Some("ADD"));
        assert!(lines[0].operands.is_empty());
        assert_eq!(lines[0].line_number, 3);
    }

    #[test]
    fn test_case_insensitive_mnemonics() {
        let parser = LineParser::new(true);
        let lines = parser.parse_source("load #5");
        assert_eq!(lines[0].mnemonic.as_deref(), Some("LOAD"));

        let parser = LineParser::new(false);
        let lines = parser.parse_source("load #5");
        assert_eq!(lines[0].mnemonic.as_deref(), Some("load"));
    }

    #[test]
    fn test_comment_only_line_becomes_nothing() {
        let parser = LineParser::new(true);
        let lines = parser.parse_source("   ; nothing here");
        assert!(lines.is_empty());
    }
}
