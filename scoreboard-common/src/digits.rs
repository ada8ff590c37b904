//! Splitting times and scores into the digit slots of a display, and the image
//! resources each digit maps to.

use crate::drawing_support::{MAX_SCORE, MAX_STRINGABLE_SECS};
use std::fmt::Display;

pub const DEFAULT_DIGITS_DIR: &str = "digits";

pub fn digit_location(dir: &str, val: impl Display) -> String {
    format!("{dir}/{val}.svg")
}

/// Converts a relayed time in seconds to whole seconds that fit the four digit slots
pub fn whole_secs(secs: f64) -> u32 {
    if secs.is_nan() || secs <= 0.0 {
        0
    } else {
        (secs.floor() as u32).min(MAX_STRINGABLE_SECS.into())
    }
}

/// `[tens of minutes, minutes, tens of seconds, seconds]`
pub fn split_time(secs: u32) -> [u8; 4] {
    let secs = secs.min(MAX_STRINGABLE_SECS.into());
    let minutes = secs / 60;
    let seconds = secs % 60;
    [
        (minutes / 10) as u8,
        (minutes % 10) as u8,
        (seconds / 10) as u8,
        (seconds % 10) as u8,
    ]
}

pub fn join_time(digits: [u8; 4]) -> u32 {
    let [min_tens, min_ones, sec_tens, sec_ones] = digits.map(u32::from);
    (min_tens * 10 + min_ones) * 60 + sec_tens * 10 + sec_ones
}

pub fn split_score(score: u8) -> [u8; 2] {
    let score = score.min(MAX_SCORE);
    [score / 10, score % 10]
}

pub fn format_time(secs: u32) -> String {
    let [a, b, c, d] = split_time(secs);
    format!("{a}{b}:{c}{d}")
}

pub fn format_score(score: u8) -> String {
    let [a, b] = split_score(score);
    format!("{a}{b}")
}
