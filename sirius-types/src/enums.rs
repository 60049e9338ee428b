use serde::{Deserialize, Serialize};

/// Target aspect ratio for media cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    /// 16:9, capped at 1280px wide
    #[default]
    Wide,
    /// 1:1, capped at 1080px wide
    Square,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Wide => "16:9",
            AspectRatio::Square => "1:1",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "16:9" | "wide" => Some(AspectRatio::Wide),
            "1:1" | "square" => Some(AspectRatio::Square),
            _ => None,
        }
    }

    /// Width / height of the target crop.
    pub fn ratio(&self) -> f64 {
        match self {
            AspectRatio::Wide => 16.0 / 9.0,
            AspectRatio::Square => 1.0,
        }
    }

    /// Maximum output width in pixels; output is never scaled up.
    pub fn max_output_width(&self) -> u32 {
        match self {
            AspectRatio::Wide => 1280,
            AspectRatio::Square => 1080,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_parse() {
        assert_eq!(AspectRatio::parse("16:9"), Some(AspectRatio::Wide));
        assert_eq!(AspectRatio::parse("1:1"), Some(AspectRatio::Square));
        assert_eq!(AspectRatio::parse("square"), Some(AspectRatio::Square));
        assert_eq!(AspectRatio::parse("4:3"), None);
    }

    #[test]
    fn test_aspect_ratio_limits() {
        assert_eq!(AspectRatio::Square.max_output_width(), 1080);
        assert_eq!(AspectRatio::Wide.max_output_width(), 1280);
        assert!((AspectRatio::Square.ratio() - 1.0).abs() < f64::EPSILON);
    }
}
