//! Caption track selection.
//!
//! Picks one track deterministically when the caller has no usable language
//! preference, or when the preference matches nothing.

use super::CaptionTrack;
use crate::error::{LecternError, Result};
use serde::Serialize;
use tracing::info;

/// Preference entries that mean "no preference".
const SENTINELS: &[&str] = &["auto", "any", "default", "string", "*"];

/// Which rule produced a selection, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionTier {
    /// Matched the caller's language list.
    Preferred,
    HumanEnglish,
    HumanCommon,
    AutoEnglish,
    AutoCommon,
    /// First track the source listed.
    FirstAvailable,
}

impl std::fmt::Display for SelectionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SelectionTier::Preferred => "preferred",
            SelectionTier::HumanEnglish => "human_english",
            SelectionTier::HumanCommon => "human_common",
            SelectionTier::AutoEnglish => "auto_english",
            SelectionTier::AutoCommon => "auto_common",
            SelectionTier::FirstAvailable => "first_available",
        };
        write!(f, "{}", name)
    }
}

/// A chosen track and the tier that chose it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    pub track: &'a CaptionTrack,
    pub tier: SelectionTier,
}

/// Track selector with a configurable common-language list.
#[derive(Debug, Clone)]
pub struct TrackSelector {
    common_languages: Vec<String>,
}

impl TrackSelector {
    pub fn new(common_languages: Vec<String>) -> Self {
        Self { common_languages }
    }

    /// Select one track.
    ///
    /// `preferred` is tried first, in order, human before auto for each code.
    /// After that: human English, human common languages in list order, auto
    /// English, auto common languages, then the first listed track.
    pub fn select<'a>(
        &self,
        tracks: &'a [CaptionTrack],
        preferred: &[String],
    ) -> Result<Selection<'a>> {
        if tracks.is_empty() {
            return Err(LecternError::NoTranscriptAvailable(
                "the video has no caption tracks".to_string(),
            ));
        }

        for code in usable_preferences(preferred) {
            for auto in [false, true] {
                if let Some(track) = best_match(tracks, code, auto) {
                    return Ok(report(track, SelectionTier::Preferred));
                }
            }
        }

        if let Some(track) = best_match(tracks, "en", false) {
            return Ok(report(track, SelectionTier::HumanEnglish));
        }
        if let Some(track) = self.first_common(tracks, false) {
            return Ok(report(track, SelectionTier::HumanCommon));
        }
        if let Some(track) = best_match(tracks, "en", true) {
            return Ok(report(track, SelectionTier::AutoEnglish));
        }
        if let Some(track) = self.first_common(tracks, true) {
            return Ok(report(track, SelectionTier::AutoCommon));
        }

        Ok(report(&tracks[0], SelectionTier::FirstAvailable))
    }

    fn first_common<'a>(&self, tracks: &'a [CaptionTrack], auto: bool) -> Option<&'a CaptionTrack> {
        self.common_languages
            .iter()
            .find_map(|code| best_match(tracks, code, auto))
    }
}

impl Default for TrackSelector {
    fn default() -> Self {
        Self::new(crate::config::TranscriptSettings::default().common_languages)
    }
}

/// Select with the default common-language list.
pub fn select_track<'a>(tracks: &'a [CaptionTrack], preferred: &[String]) -> Result<Selection<'a>> {
    TrackSelector::default().select(tracks, preferred)
}

fn report(track: &CaptionTrack, tier: SelectionTier) -> Selection<'_> {
    info!(
        language = %track.language_code,
        auto_generated = track.is_auto_generated,
        tier = %tier,
        "Selected caption track"
    );
    Selection { track, tier }
}

fn usable_preferences(preferred: &[String]) -> impl Iterator<Item = &str> {
    preferred.iter().map(|s| s.trim()).filter(|s| {
        !s.is_empty() && !SENTINELS.iter().any(|sentinel| s.eq_ignore_ascii_case(sentinel))
    })
}

/// How well a track's code matches a wanted code: 0 exact, 1 regional variant.
fn match_rank(code: &str, wanted: &str) -> Option<u8> {
    if code.eq_ignore_ascii_case(wanted) {
        return Some(0);
    }
    let base = code.split('-').next().unwrap_or(code);
    if !wanted.contains('-') && base.eq_ignore_ascii_case(wanted) {
        Some(1)
    } else {
        None
    }
}

/// Best track for `wanted` among tracks of the given origin.
///
/// Exact code beats regional variant, then the smallest code wins, so the
/// result does not depend on input order.
fn best_match<'a>(tracks: &'a [CaptionTrack], wanted: &str, auto: bool) -> Option<&'a CaptionTrack> {
    tracks
        .iter()
        .filter(|t| t.is_auto_generated == auto)
        .filter_map(|t| match_rank(&t.language_code, wanted).map(|rank| (rank, t)))
        .min_by(|(ra, a), (rb, b)| {
            ra.cmp(rb)
                .then_with(|| a.language_code.to_lowercase().cmp(&b.language_code.to_lowercase()))
                .then_with(|| a.language_name.cmp(&b.language_name))
        })
        .map(|(_, t)| t)
}
