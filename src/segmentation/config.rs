use serde::{Deserialize, Serialize};

/// Configuration for the interaction segmenters with tunable thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SegmentationConfig {
    /// Two same-button clicks whose presses are at most this far apart form a double click
    pub double_click_window_secs: f64,

    /// Key presses at most this far apart belong to the same typing run
    pub typing_gap_secs: f64,

    /// Carry presses still waiting for their release into the next batch instead of dropping them
    pub carry_unmatched_presses: bool,

    /// Carried presses older than this (relative to the newest event in the
    /// next batch) are given up on
    pub max_carry_age_secs: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            double_click_window_secs: 0.5,
            typing_gap_secs: 1.5,
            carry_unmatched_presses: true,
            max_carry_age_secs: 30.0,
        }
    }
}
