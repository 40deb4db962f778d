use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::types::PkceToken;

pub fn generate_code_verifier() -> String {
    random_string(128)
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

pub fn generate_state() -> String {
    random_string(16)
}

pub fn new_pkce() -> PkceToken {
    let code_verifier = generate_code_verifier();
    let code_challenge = generate_code_challenge(&code_verifier);
    PkceToken {
        code_verifier,
        code_challenge,
        state: generate_state(),
    }
}

fn random_string(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Formats milliseconds as `MM:SS`.
///
/// Hours are folded into the minutes instead of being dropped, so a position
/// 1h15m03s into a long mix reads `75:03` and not `15:03`. A clock-style
/// display that wraps at 60 minutes would show the same text for two different
/// positions in anything longer than an hour.
///
/// # Examples
///
/// ```
/// use minify::utils::format_time;
///
/// assert_eq!(format_time(65_000), "01:05");
/// assert_eq!(format_time(4_503_000), "75:03");
/// ```
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Clamps a gesture ratio to `[0, 1]`. NaN counts as the start.
pub fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        return 0.0;
    }
    ratio.clamp(0.0, 1.0)
}

/// Seek target for a drag released at `ratio` of the progress bar.
pub fn seek_target_ms(duration_ms: u64, ratio: f64) -> u64 {
    let target = (duration_ms as f64 * clamp_ratio(ratio)).round() as u64;
    target.min(duration_ms)
}

/// Volume for a drag released at `ratio` of the volume slider.
pub fn volume_from_ratio(ratio: f64) -> u8 {
    (100.0 * clamp_ratio(ratio)).round() as u8
}

/// Parses a CLI position argument: a ratio (`0.5`), a percentage (`50%`) or a
/// timestamp (`01:30`) relative to `duration_ms`. Returns a ratio.
pub fn parse_position(input: &str, duration_ms: u64) -> Result<f64, String> {
    let input = input.trim();

    if let Some(pct) = input.strip_suffix('%') {
        let pct: f64 = pct
            .trim()
            .parse()
            .map_err(|_| format!("Invalid percentage: {}", input))?;
        return Ok(clamp_ratio(pct / 100.0));
    }

    if let Some((min, sec)) = input.split_once(':') {
        let min: u64 = min
            .parse()
            .map_err(|_| format!("Invalid timestamp: {}", input))?;
        let sec: u64 = sec
            .parse()
            .map_err(|_| format!("Invalid timestamp: {}", input))?;
        if sec >= 60 {
            return Err(format!("Invalid timestamp: {}", input));
        }
        if duration_ms == 0 {
            return Err("Nothing is playing, cannot seek to a timestamp".to_string());
        }
        let ms = (min * 60 + sec) * 1000;
        return Ok(clamp_ratio(ms as f64 / duration_ms as f64));
    }

    input
        .parse::<f64>()
        .map(clamp_ratio)
        .map_err(|_| format!("Invalid position: {}", input))
}
