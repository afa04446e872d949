//! Program image formats.
//!
//! Two formats are understood:
//! - Hex text: 16-bit words in hex, separated by whitespace or commas.
//!   An optional `0x` prefix is allowed. `;` starts a comment.
//! - Binary (`.bin`): big-endian 16-bit words.

use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// The DCPU-16 1.1 reference program.
///
/// Exercises every addressing form, a counted loop, a subroutine call and
/// ends spinning on `:crash SET PC, crash` at 0x1a with X = 0x40.
#[rustfmt::skip]
pub const SAMPLE_PROGRAM: [u16; 28] = [
    0x7c01, 0x0030,         // SET A, 0x30
    0x7de1, 0x1000, 0x0020, // SET [0x1000], 0x20
    0x7803, 0x1000,         // SUB A, [0x1000]
    0xc00d,                 // IFN A, 0x10
    0x7dc1, 0x001a,         //    SET PC, crash
    0xa861,                 // SET I, 10
    0x7c01, 0x2000,         // SET A, 0x2000
    0x2161, 0x2000,         // :loop SET [0x2000+I], [A]
    0x8463,                 // SUB I, 1
    0x806d,                 // IFN I, 0
    0x7dc1, 0x000d,         //    SET PC, loop
    0x9031,                 // SET X, 0x4
    0x7c10, 0x0018,         // JSR testsub
    0x7dc1, 0x001a,         // SET PC, crash
    0x9037,                 // :testsub SHL X, 4
    0x61c1,                 // SET PC, POP
    0x7dc1, 0x001a,         // :crash SET PC, crash
];

/// Load a program image from disk, choosing the format by extension.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Vec<u16>, ImageError> {
    let path = path.as_ref();
    let is_binary = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("bin"))
        .unwrap_or(false);

    if is_binary {
        let bytes = std::fs::read(path).map_err(|e| ImageError::IoError(e.to_string()))?;
        parse_bin(&bytes)
    } else {
        let text = std::fs::read_to_string(path).map_err(|e| ImageError::IoError(e.to_string()))?;
        parse_hex(&text)
    }
}

/// Parse the hex text format.
pub fn parse_hex(text: &str) -> Result<Vec<u16>, ImageError> {
    let mut words = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        let code = match line.find(';') {
            Some(pos) => &line[..pos],
            None => line,
        };

        for token in code.split(|c: char| c.is_whitespace() || c == ',') {
            if token.is_empty() {
                continue;
            }

            let digits = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);

            let word = u16::from_str_radix(digits, 16).map_err(|_| ImageError::ParseError {
                line: line_num + 1,
                message: format!("invalid word '{}'", token),
            })?;
            words.push(word);
        }
    }

    Ok(words)
}

/// Parse the big-endian binary format.
pub fn parse_bin(bytes: &[u8]) -> Result<Vec<u16>, ImageError> {
    if bytes.len() % 2 != 0 {
        return Err(ImageError::OddLength(bytes.len()));
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

/// Save words in the hex text format, eight words per line.
pub fn save_hex<P: AsRef<Path>>(path: P, words: &[u16]) -> Result<(), ImageError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| ImageError::IoError(e.to_string()))?;

    writeln!(file, "; DCPU-16 image, {} words", words.len())
        .map_err(|e| ImageError::IoError(e.to_string()))?;

    for (i, chunk) in words.chunks(8).enumerate() {
        let line: Vec<String> = chunk.iter().map(|w| format!("{:04x}", w)).collect();
        writeln!(file, "{} ; {:04x}", line.join(" "), i * 8)
            .map_err(|e| ImageError::IoError(e.to_string()))?;
    }

    Ok(())
}

/// Errors that can occur while loading or saving images.
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("binary image has odd length {0}")]
    OddLength(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        let text = "\
            ; SET A, 0x30\n\
            7c01 0x0030\n\
            \n\
            7de1,1000 , 0020 ; SET [0x1000], 0x20\n";

        assert_eq!(
            parse_hex(text).unwrap(),
            vec![0x7C01, 0x0030, 0x7DE1, 0x1000, 0x0020]
        );
    }

    #[test]
    fn test_parse_hex_error_line() {
        match parse_hex("7c01\nzzzz\n") {
            Err(ImageError::ParseError { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(parse_hex("12345").is_err());
    }

    #[test]
    fn test_parse_bin() {
        assert_eq!(parse_bin(&[0x7C, 0x01, 0x00, 0x05]).unwrap(), vec![0x7C01, 0x0005]);
        assert!(matches!(parse_bin(&[0x7C]), Err(ImageError::OddLength(1))));
    }

    #[test]
    fn test_save_and_load_hex() {
        let path = std::env::temp_dir().join(format!("dcpu16-image-{}.hex", std::process::id()));
        let words: Vec<u16> = (0..20).map(|i| i * 0x0101).collect();

        save_hex(&path, &words).unwrap();
        let loaded = load_image(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, words);
    }
}
