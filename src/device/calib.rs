//! Calibration blob codec
//!
//! The device keeps its sensor calibration as a window of 4-byte words at
//! 0x8010..0x8044: 12 words of linear coefficients (3x3 matrix plus bias
//! per sensor pair) optionally followed by nonlinear correction terms.
//! Erased flash reads 0xFF, so an extended blob whose tail is all 0xFF
//! carries no nonlinear data and is written as a plain linear blob to
//! spare the flash.
//!
//! Input for a load can be raw binary or the whitespace-separated hex-byte
//! text emitted by the tlx_calib fitting tool (first token starts with
//! `0x`).

use super::constants::{ADDR_CAL_DATA, CAL_LINEAR_LEN, CAL_MAX_LEN};
use crate::error::{Error, Result};

/// Raw binary sizes a calibration file normally comes in: the linear
/// window, or the linear window plus 3 or 4 nonlinear bytes.
const EXPECTED_RAW_SIZES: [usize; 3] = [48, 51, 52];

/// tlx_calib text: 48 hex-byte tokens ("0x12 0x34 ...") span 244 bytes;
/// a file with nonlinear coefficients has its 49th token at offset 246
/// and spans 260 bytes.
const TEXT_LINEAR_END: usize = 244;
const TEXT_EXTENDED_END: usize = 260;
const TEXT_EXTENDED_PROBE: usize = 246;

/// A calibration blob normalized for writing: 4-byte aligned, at most
/// [`CAL_MAX_LEN`] bytes, sentinel tail stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationBlob {
    data: Vec<u8>,
}

impl CalibrationBlob {
    /// Parse loadcal input, accepting raw binary or tlx_calib hex text
    pub fn parse(input: &[u8]) -> Result<Self> {
        let mut data = if input.starts_with(b"0x") {
            log::info!("Interpreting input as tlx_calib hex text");
            parse_hex_text(input)?
        } else {
            if !EXPECTED_RAW_SIZES.contains(&input.len()) {
                log::warn!(
                    "Raw calibration is {} bytes, expected one of {:?}",
                    input.len(),
                    EXPECTED_RAW_SIZES
                );
            }
            input.to_vec()
        };

        // Pad with 0xFF to 32-bit alignment; memory writes are whole words
        while data.len() % 4 != 0 {
            data.push(0xFF);
        }

        if data.len() > CAL_LINEAR_LEN {
            // Guard against oversized input
            data.truncate(CAL_MAX_LEN);
            if data[CAL_LINEAR_LEN..CAL_MAX_LEN - 1]
                .iter()
                .all(|&b| b == 0xFF)
            {
                // Erased tail: actually a linear blob, skip the
                // unchanged words to save flash wear
                data.truncate(CAL_LINEAR_LEN);
            }
        }

        Ok(CalibrationBlob { data })
    }

    /// Blob carries nonlinear correction terms beyond the linear window
    pub fn is_extended(&self) -> bool {
        self.data.len() > CAL_LINEAR_LEN
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Iterate the blob as (device address, word) pairs for writing
    pub fn words(&self) -> impl Iterator<Item = (u16, [u8; 4])> + '_ {
        self.data.chunks_exact(4).enumerate().map(|(i, chunk)| {
            let mut word = [0u8; 4];
            word.copy_from_slice(chunk);
            (ADDR_CAL_DATA + (i as u16) * 4, word)
        })
    }
}

/// Parse tlx_calib output: whitespace-separated `0x??` byte tokens
fn parse_hex_text(input: &[u8]) -> Result<Vec<u8>> {
    let end = if input.len() >= TEXT_EXTENDED_PROBE + 2
        && &input[TEXT_EXTENDED_PROBE..TEXT_EXTENDED_PROBE + 2] == b"0x"
    {
        TEXT_EXTENDED_END
    } else {
        TEXT_LINEAR_END
    };
    let text = std::str::from_utf8(&input[..input.len().min(end)])
        .map_err(|_| Error::UnsupportedCalibration("calibration text is not UTF-8".to_string()))?;

    text.split_whitespace()
        .map(|token| {
            let hex = token.strip_prefix("0x").unwrap_or(token);
            u8::from_str_radix(hex, 16).map_err(|_| {
                Error::UnsupportedCalibration(format!("bad hex byte '{}'", token))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_blob_parses_unchanged() {
        let raw = vec![0u8; CAL_LINEAR_LEN];
        let blob = CalibrationBlob::parse(&raw).unwrap();
        assert_eq!(blob.as_bytes(), &raw[..]);
        assert!(!blob.is_extended());
    }

    #[test]
    fn sentinel_tail_demotes_to_linear() {
        let mut raw = vec![0u8; CAL_MAX_LEN];
        for b in &mut raw[CAL_LINEAR_LEN..] {
            *b = 0xFF;
        }
        let blob = CalibrationBlob::parse(&raw).unwrap();
        assert_eq!(blob.len(), CAL_LINEAR_LEN);
        assert!(!blob.is_extended());
    }

    #[test]
    fn nonlinear_tail_is_kept() {
        let mut raw = vec![0u8; CAL_MAX_LEN];
        raw[CAL_LINEAR_LEN] = 0x7B;
        let blob = CalibrationBlob::parse(&raw).unwrap();
        assert_eq!(blob.len(), CAL_MAX_LEN);
        assert!(blob.is_extended());
    }

    #[test]
    fn short_extended_blob_is_padded_to_words() {
        // 51 bytes: linear + 3 nonlinear, padded to 52 with 0xFF
        let mut raw = vec![0u8; 51];
        raw[CAL_LINEAR_LEN] = 0x01;
        let blob = CalibrationBlob::parse(&raw).unwrap();
        assert_eq!(blob.len(), CAL_MAX_LEN);
        assert_eq!(blob.as_bytes()[51], 0xFF);
    }

    #[test]
    fn oversized_input_is_truncated() {
        let mut raw = vec![0u8; 200];
        raw[CAL_LINEAR_LEN] = 0x01;
        let blob = CalibrationBlob::parse(&raw).unwrap();
        assert_eq!(blob.len(), CAL_MAX_LEN);
    }

    #[test]
    fn hex_text_parses_to_bytes() {
        let mut text = String::new();
        for i in 0..CAL_LINEAR_LEN {
            text.push_str(&format!("0x{:02x} ", i));
        }
        let blob = CalibrationBlob::parse(text.as_bytes()).unwrap();
        assert_eq!(blob.len(), CAL_LINEAR_LEN);
        assert_eq!(blob.as_bytes()[0], 0x00);
        assert_eq!(blob.as_bytes()[47], 0x2f);
    }

    /// 48 linear byte tokens, "0x01 " each: 240 bytes of text
    fn linear_hex_tokens() -> String {
        "0x01 ".repeat(CAL_LINEAR_LEN)
    }

    #[test]
    fn hex_text_with_nonlinear_tokens_parses_extended() {
        // tlx_calib's nonlinear variant puts its 49th token at offset
        // 246; everything past offset 260 is ignored
        let mut text = linear_hex_tokens();
        text.push_str("     \n"); // offsets 240..246
        text.push_str("0x12 0x34 0x56"); // offsets 246..260
        text.push_str(" 0x78 trailing junk past the window");
        assert_eq!(&text.as_bytes()[246..248], b"0x");

        let blob = CalibrationBlob::parse(text.as_bytes()).unwrap();
        assert!(blob.is_extended());
        assert_eq!(blob.len(), CAL_MAX_LEN);
        // 51 parsed bytes padded to the word boundary with 0xFF
        assert_eq!(
            &blob.as_bytes()[CAL_LINEAR_LEN..],
            &[0x12, 0x34, 0x56, 0xFF]
        );
    }

    #[test]
    fn hex_text_without_probe_token_stays_linear() {
        // No "0x" at offset 246: only the first 244 bytes are read, so
        // the tail never reaches the parser
        let mut text = linear_hex_tokens();
        text.push_str("      not-hex-tokens");
        assert_ne!(&text.as_bytes()[246..248], b"0x");

        let blob = CalibrationBlob::parse(text.as_bytes()).unwrap();
        assert!(!blob.is_extended());
        assert_eq!(blob.len(), CAL_LINEAR_LEN);
    }

    #[test]
    fn bad_hex_token_is_rejected() {
        let text = b"0xzz 0x01";
        assert!(matches!(
            CalibrationBlob::parse(text),
            Err(Error::UnsupportedCalibration(_))
        ));
    }

    #[test]
    fn words_map_to_calibration_window() {
        let raw = vec![0xAB; CAL_LINEAR_LEN];
        let blob = CalibrationBlob::parse(&raw).unwrap();
        let words: Vec<_> = blob.words().collect();
        assert_eq!(words.len(), 12);
        assert_eq!(words[0].0, ADDR_CAL_DATA);
        assert_eq!(words[11].0, ADDR_CAL_DATA + 44);
        assert_eq!(words[0].1, [0xAB; 4]);
    }
}
