use log::debug;

use crate::error::{validation_error, Result};
use crate::transcript::Word;

/// Fade length used on both edges of a mute region
pub const FADE_MILLIS: u32 = 5;

/// Round a time value to millisecond precision. All synthesized times are
/// compared and emitted at 3 decimal places.
pub fn round_ms(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// A `[start, end]` span targeted for suppression, `end >= start` always
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Result<Self> {
        if end < start {
            return Err(validation_error(format!(
                "Interval end {:.3} precedes start {:.3}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Padding added around each detected word before suppression, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PadSpec {
    pub pre: f64,
    pub post: f64,
}

impl PadSpec {
    pub fn from_millis(pre_ms: u64, post_ms: u64) -> Self {
        Self {
            pre: pre_ms as f64 / 1000.0,
            post: post_ms as f64 / 1000.0,
        }
    }
}

/// Sine tone overlaid on a silenced region in beep mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: u32,
    pub duration: f64,
}

/// Start offset for a tone, applied identically to both channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelaySpec {
    pub offset_millis: i64,
}

/// A silenced span plus the boundary up to which its fade-in is enabled.
/// The fade-in boundary is the next region's padded start, or a synthetic
/// peek one second past the final region's end; the synthetic boundary
/// only bounds the fade window and never produces audio of its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuteRegion {
    pub interval: Interval,
    pub fade_in_until: f64,
}

/// Everything needed to render a beep-mode filter graph
#[derive(Debug, Clone, PartialEq)]
pub struct BeepPlan {
    pub regions: Vec<Interval>,
    pub tones: Vec<ToneSpec>,
    pub delays: Vec<DelaySpec>,
}

/// Pad each naughty word and merge padded spans that overlap or abut.
/// Words must arrive in chronological order (transcript validation runs
/// upstream). A padded span with zero-or-less duration is an error, never
/// silently clamped.
pub fn pad_and_merge(naughty: &[Word], pads: PadSpec) -> Result<Vec<Interval>> {
    let mut merged: Vec<Interval> = Vec::new();

    for word in naughty {
        let padded_start = round_ms((word.start - pads.pre).max(0.0));
        let padded_end = round_ms(word.end + pads.post);
        if padded_end - padded_start <= 0.0 {
            return Err(validation_error(format!(
                "Word '{}' yields a zero-or-less suppression span [{:.3}, {:.3}]",
                word.word, padded_start, padded_end
            )));
        }

        match merged.last_mut() {
            Some(last) if padded_start <= last.end => {
                last.end = last.end.max(padded_end);
            }
            _ => merged.push(Interval::new(padded_start, padded_end)?),
        }
    }

    debug!("Merged {} naughty words into {} suppression spans", naughty.len(), merged.len());
    Ok(merged)
}

/// Synthesize mute-mode regions: merged silence spans with fade-in windows
/// reaching to the next span's padded start.
pub fn synthesize_mute(naughty: &[Word], pads: PadSpec) -> Result<Vec<MuteRegion>> {
    let merged = pad_and_merge(naughty, pads)?;
    let mut regions = Vec::with_capacity(merged.len());

    for (i, interval) in merged.iter().enumerate() {
        let fade_in_until = match merged.get(i + 1) {
            Some(next) => next.start,
            // peek boundary one second past the final word
            None => round_ms((interval.end + 1.0 - pads.pre).max(interval.end)),
        };
        regions.push(MuteRegion {
            interval: *interval,
            fade_in_until,
        });
    }

    Ok(regions)
}

/// Synthesize beep-mode regions: merged silence spans, one tone per span
/// with duration matching the span, delayed to the span's start on both
/// channels.
pub fn synthesize_beep(naughty: &[Word], pads: PadSpec, frequency_hz: u32) -> Result<BeepPlan> {
    let regions = pad_and_merge(naughty, pads)?;
    let mut tones = Vec::with_capacity(regions.len());
    let mut delays = Vec::with_capacity(regions.len());

    for region in &regions {
        tones.push(ToneSpec {
            frequency_hz,
            duration: round_ms(region.duration()),
        });
        delays.push(DelaySpec {
            offset_millis: (region.start * 1000.0).round() as i64,
        });
    }

    Ok(BeepPlan {
        regions,
        tones,
        delays,
    })
}
