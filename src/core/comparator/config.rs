//! Comparator configuration.

use crate::core::features::SiftConfig;
use crate::core::normalize::DEFAULT_BOUNDING_BOX;
use crate::error::CompareError;
use serde::{Deserialize, Serialize};

/// Configuration builder for the scene comparator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparatorConfig {
    /// Lowe ratio, strictly between 0 and 1 (lower = stricter)
    pub match_ratio: f32,
    /// Good matches needed for a stable verdict
    pub min_good_matches: usize,
    /// Both images are fitted into this box before extraction
    pub bounding_box: (u32, u32),
    /// Feature detector tunables
    pub sift: SiftConfig,
    /// Draw the side-by-side match image
    pub render_diagnostic: bool,
}

impl ComparatorConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            match_ratio: 0.6,
            min_good_matches: 10,
            bounding_box: DEFAULT_BOUNDING_BOX,
            sift: SiftConfig::default(),
            render_diagnostic: true,
        }
    }

    /// Set the ratio-test threshold
    ///
    /// - 0.4: strict, only very distinctive matches survive
    /// - 0.6: default
    /// - 0.8: permissive
    pub fn match_ratio(mut self, ratio: f32) -> Self {
        self.match_ratio = ratio;
        self
    }

    /// Set the minimum number of good matches for a stable scene
    pub fn min_good_matches(mut self, count: usize) -> Self {
        self.min_good_matches = count;
        self
    }

    /// Set the normalization bounding box
    pub fn bounding_box(mut self, width: u32, height: u32) -> Self {
        self.bounding_box = (width, height);
        self
    }

    /// Set the feature detector configuration
    pub fn sift(mut self, sift: SiftConfig) -> Self {
        self.sift = sift;
        self
    }

    /// Enable or disable the diagnostic image
    pub fn render_diagnostic(mut self, render: bool) -> Self {
        self.render_diagnostic = render;
        self
    }

    /// Check that the configuration can be used for a comparison
    pub fn validate(&self) -> Result<(), CompareError> {
        if !(self.match_ratio > 0.0 && self.match_ratio < 1.0) {
            return Err(CompareError::InvalidConfig(format!(
                "match ratio must be strictly between 0 and 1, got {}",
                self.match_ratio
            )));
        }
        if self.bounding_box.0 == 0 || self.bounding_box.1 == 0 {
            return Err(CompareError::InvalidConfig(format!(
                "bounding box must have a positive area, got {}x{}",
                self.bounding_box.0, self.bounding_box.1
            )));
        }
        Ok(())
    }
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ComparatorConfig::new();
        assert_eq!(config.match_ratio, 0.6);
        assert_eq!(config.min_good_matches, 10);
        assert_eq!(config.bounding_box, (960, 540));
        assert!(config.render_diagnostic);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_works() {
        let config = ComparatorConfig::new()
            .match_ratio(0.75)
            .min_good_matches(4)
            .bounding_box(320, 180)
            .render_diagnostic(false);

        assert_eq!(config.match_ratio, 0.75);
        assert_eq!(config.min_good_matches, 4);
        assert_eq!(config.bounding_box, (320, 180));
        assert!(!config.render_diagnostic);
    }

    #[test]
    fn ratio_outside_open_interval_is_rejected() {
        for ratio in [0.0, 1.0, -0.5, 1.5, f32::NAN] {
            let result = ComparatorConfig::new().match_ratio(ratio).validate();
            assert!(
                matches!(result, Err(CompareError::InvalidConfig(_))),
                "ratio {} accepted",
                ratio
            );
        }
    }

    #[test]
    fn empty_bounding_box_is_rejected() {
        let result = ComparatorConfig::new().bounding_box(960, 0).validate();
        assert!(matches!(result, Err(CompareError::InvalidConfig(_))));
    }
}
