//! Word tokens from Tesseract TSV output.

use crate::types::{BoundingBox, Token};

/// TSV row level for individual words.
pub const TSV_WORD_LEVEL: u32 = 5;
pub const TSV_MIN_FIELDS: usize = 12;

/// Parses Tesseract TSV (`level page_num block_num par_num line_num word_num left top
/// width height conf text`) into word tokens.
///
/// The header row, non-word levels, rows below `min_confidence`, empty words and
/// malformed rows are skipped.
pub fn parse_tsv_tokens(tsv_data: &str, min_confidence: f64) -> Vec<Token> {
    let mut tokens = Vec::new();

    for (line_num, line) in tsv_data.lines().enumerate() {
        if line_num == 0 {
            continue;
        }

        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < TSV_MIN_FIELDS {
            continue;
        }

        let level = fields[0].trim().parse::<u32>().unwrap_or(0);
        if level != TSV_WORD_LEVEL {
            continue;
        }

        let confidence = fields[10].trim().parse::<f64>().unwrap_or(-1.0);
        if confidence < min_confidence {
            continue;
        }

        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        tokens.push(Token {
            text: text.to_string(),
            bbox: BoundingBox {
                left: fields[6].trim().parse().unwrap_or(0),
                top: fields[7].trim().parse().unwrap_or(0),
                width: fields[8].trim().parse().unwrap_or(0),
                height: fields[9].trim().parse().unwrap_or(0),
            },
            confidence,
        });
    }

    tokens
}

/// Mean confidence over tokens, 0 when there are none.
pub fn mean_confidence(tokens: &[Token]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    tokens.iter().map(|t| t.confidence).sum::<f64>() / tokens.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn test_parse_basic_words() {
        let tsv = format!(
            "{HEADER}\n5\t1\t0\t0\t0\t0\t100\t50\t80\t30\t95.5\tD.L.\n5\t1\t0\t0\t0\t1\t190\t50\t140\t30\t92.3\t03-066-041605"
        );

        let tokens = parse_tsv_tokens(&tsv, 0.0);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "D.L.");
        assert_eq!(tokens[0].bbox.left, 100);
        assert_eq!(tokens[0].bbox.width, 80);
        assert_eq!(tokens[1].text, "03-066-041605");
        assert_eq!(tokens[1].confidence, 92.3);
    }

    #[test]
    fn test_parse_filters_levels_and_confidence() {
        let tsv = format!(
            "{HEADER}\n3\t1\t0\t0\t0\t0\t100\t50\t80\t30\t95.5\tParagraph\n5\t1\t0\t0\t0\t0\t100\t50\t80\t30\t40.0\tनाम\n5\t1\t0\t0\t0\t1\t190\t50\t70\t30\t88.0\tराम"
        );

        let tokens = parse_tsv_tokens(&tsv, 50.0);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "राम");
    }

    #[test]
    fn test_parse_skips_malformed_and_empty() {
        let tsv = format!(
            "{HEADER}\ninvalid line\n5\t1\t0\t0\t0\t0\t100\t50\t80\t30\t95.5\t\n5\t1\t0\t0\t0\t1\t190\t50\t70\t30\t-1\tWorld"
        );

        let tokens = parse_tsv_tokens(&tsv, 0.0);
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_mean_confidence() {
        assert_eq!(mean_confidence(&[]), 0.0);
        let tokens = vec![
            Token {
                text: "a".into(),
                bbox: BoundingBox::default(),
                confidence: 80.0,
            },
            Token {
                text: "b".into(),
                bbox: BoundingBox::default(),
                confidence: 60.0,
            },
        ];
        assert_eq!(mean_confidence(&tokens), 70.0);
    }
}
