//! Target body hit zones and hit classification

use serde::{Deserialize, Serialize};

use super::geometry::{point_in_polygon, Vec2};

/// Target sprite width in world units
pub const TARGET_WIDTH: f64 = 100.0;
/// Target sprite height in world units
pub const TARGET_HEIGHT: f64 = 150.0;
/// Where the target stands unless a room says otherwise
pub const DEFAULT_TARGET_ANCHOR: Vec2 = Vec2::new(425.0, 350.0);

/// Segment of the target's body, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyPart {
    Head,
    UpperBody,
    LowerBody,
}

impl BodyPart {
    pub const PRIORITY: [BodyPart; 3] = [BodyPart::Head, BodyPart::UpperBody, BodyPart::LowerBody];

    pub fn as_str(&self) -> &'static str {
        match self {
            BodyPart::Head => "head",
            BodyPart::UpperBody => "upperBody",
            BodyPart::LowerBody => "lowerBody",
        }
    }

    /// Vertex offsets as (width fraction, height fraction) pairs
    fn outline(&self) -> [(f64, f64); 6] {
        match self {
            BodyPart::Head => [
                (-0.3, -0.5),
                (0.3, -0.5),
                (0.4, -0.3),
                (0.35, -0.1),
                (-0.35, -0.1),
                (-0.4, -0.3),
            ],
            BodyPart::UpperBody => [
                (-0.35, -0.1),
                (0.35, -0.1),
                (0.4, 0.2),
                (0.3, 0.25),
                (-0.3, 0.25),
                (-0.4, 0.2),
            ],
            BodyPart::LowerBody => [
                (-0.3, 0.25),
                (0.3, 0.25),
                (0.35, 0.5),
                (0.25, 0.5),
                (-0.25, 0.5),
                (-0.35, 0.5),
            ],
        }
    }
}

impl std::fmt::Display for BodyPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collidable polygons of one target, built from its anchor
#[derive(Debug, Clone, PartialEq)]
pub struct HitZones {
    head: Vec<Vec2>,
    upper_body: Vec<Vec2>,
    lower_body: Vec<Vec2>,
}

impl HitZones {
    pub fn around(anchor: Vec2) -> Self {
        let build = |part: BodyPart| {
            part.outline()
                .iter()
                .map(|&(fx, fy)| anchor + Vec2::new(fx * TARGET_WIDTH, fy * TARGET_HEIGHT))
                .collect::<Vec<_>>()
        };

        Self {
            head: build(BodyPart::Head),
            upper_body: build(BodyPart::UpperBody),
            lower_body: build(BodyPart::LowerBody),
        }
    }

    pub fn polygon(&self, part: BodyPart) -> &[Vec2] {
        match part {
            BodyPart::Head => &self.head,
            BodyPart::UpperBody => &self.upper_body,
            BodyPart::LowerBody => &self.lower_body,
        }
    }

    /// First zone containing `point`, tested head → upper body → lower body
    pub fn classify(&self, point: Vec2) -> Option<BodyPart> {
        BodyPart::PRIORITY
            .into_iter()
            .find(|&part| point_in_polygon(point, self.polygon(part)))
    }
}

impl Default for HitZones {
    fn default() -> Self {
        Self::around(DEFAULT_TARGET_ANCHOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_vertices_match_outline() {
        let zones = HitZones::default();
        let head = zones.polygon(BodyPart::Head);
        assert_eq!(head.len(), 6);
        assert_eq!(head[0], Vec2::new(425.0 - 30.0, 350.0 - 75.0));
        assert_eq!(head[2], Vec2::new(425.0 + 40.0, 350.0 - 45.0));
        assert_eq!(head[4], Vec2::new(425.0 - 35.0, 350.0 - 15.0));
    }

    #[test]
    fn lower_body_vertices_match_outline() {
        let zones = HitZones::around(Vec2::ZERO);
        let lower = zones.polygon(BodyPart::LowerBody);
        assert_eq!(lower[1], Vec2::new(30.0, 37.5));
        assert_eq!(lower[5], Vec2::new(-35.0, 75.0));
    }

    #[test]
    fn forty_percent_above_anchor_is_head() {
        let zones = HitZones::default();
        let point = Vec2::new(425.0, 350.0 - 0.4 * TARGET_HEIGHT);
        assert_eq!(zones.classify(point), Some(BodyPart::Head));
    }

    #[test]
    fn anchor_is_upper_body() {
        let zones = HitZones::default();
        assert_eq!(zones.classify(Vec2::new(425.0, 350.0)), Some(BodyPart::UpperBody));
    }

    #[test]
    fn legs_are_lower_body() {
        let zones = HitZones::default();
        assert_eq!(zones.classify(Vec2::new(425.0, 410.0)), Some(BodyPart::LowerBody));
    }

    #[test]
    fn outside_target_is_a_miss() {
        let zones = HitZones::default();
        assert_eq!(zones.classify(Vec2::new(300.0, 350.0)), None);
        assert_eq!(zones.classify(Vec2::new(425.0, 200.0)), None);
        assert_eq!(zones.classify(Vec2::new(425.0, 430.0)), None);
    }

    #[test]
    fn zones_follow_anchor() {
        let zones = HitZones::around(Vec2::new(100.0, 100.0));
        assert_eq!(zones.classify(Vec2::new(100.0, 100.0)), Some(BodyPart::UpperBody));
        assert_eq!(zones.classify(Vec2::new(425.0, 350.0)), None);
    }

    #[test]
    fn body_part_wire_names() {
        assert_eq!(serde_json::to_string(&BodyPart::Head).unwrap(), "\"head\"");
        assert_eq!(serde_json::to_string(&BodyPart::UpperBody).unwrap(), "\"upperBody\"");
        assert_eq!(serde_json::to_string(&BodyPart::LowerBody).unwrap(), "\"lowerBody\"");
        assert_eq!(BodyPart::LowerBody.to_string(), "lowerBody");
    }
}
