//! # Nutrition Result Model
//!
//! The structured answer of the analysis service and the presentation-only
//! values derived from it.
//!
//! The wire format is camelCase JSON:
//!
//! ```json
//! { "foodName": "Apple", "calories": 95, "protein": 0.5, "carbs": 25,
//!   "fats": 0.3, "fiber": 4, "healthScore": 88,
//!   "breakdown": [{ "name": "Carbs", "value": 25, "unit": "g", "color": "#f59e0b" }] }
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{SnapError, SnapResult};

/// Grams at which a breakdown bar is drawn full.
pub const BAR_FULL_SCALE: f64 = 50.0;

/// Nutrition facts for one analyzed photo.
///
/// Immutable once parsed; the session owns it for as long as the result
/// screen is shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionResult {
    pub food_name: String,
    #[serde(deserialize_with = "rounded_u32")]
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fiber: f64,
    /// Nominally 0–100. Out-of-range values are kept as sent.
    #[serde(deserialize_with = "rounded_i32")]
    pub health_score: i32,
    pub breakdown: Vec<Nutrient>,
}

/// One row of the nutritional breakdown, in presentation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrient {
    pub name: String,
    pub value: f64,
    pub unit: String,
    /// Color token chosen by the service, e.g. `#10b981`.
    pub color: String,
}

impl Nutrient {
    /// Percentage of the progress bar to fill, in `0.0..=100.0`.
    pub fn bar_fill_percent(&self) -> f64 {
        if !self.value.is_finite() {
            return 0.0;
        }
        (self.value / BAR_FULL_SCALE * 100.0).clamp(0.0, 100.0)
    }
}

impl NutritionResult {
    /// Parse and validate a response body.
    pub fn from_json(body: &[u8]) -> SnapResult<Self> {
        let result: Self = serde_json::from_slice(body)?;
        result.validate()?;
        Ok(result)
    }

    /// Check the invariants the wire format cannot express.
    pub fn validate(&self) -> SnapResult<()> {
        if self.food_name.trim().is_empty() {
            return Err(SnapError::parse("foodName must not be empty"));
        }
        let grams = [
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fats", self.fats),
            ("fiber", self.fiber),
        ];
        for (field, value) in grams {
            if !value.is_finite() || value < 0.0 {
                return Err(SnapError::parse(format!(
                    "{} must be a non-negative number, got {}",
                    field, value
                )));
            }
        }
        Ok(())
    }

    /// Qualitative tier of [`Self::health_score`].
    pub fn health_tier(&self) -> HealthTier {
        HealthTier::from_score(self.health_score)
    }
}

/// Three-bucket label derived from the health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthTier {
    /// score ≥ 80
    Excellent,
    /// 60 ≤ score < 80
    Good,
    /// score < 60
    ConsiderAlternatives,
}

impl HealthTier {
    /// Total over all integers; boundaries are inclusive on the lower edge.
    pub fn from_score(score: i32) -> Self {
        if score >= 80 {
            HealthTier::Excellent
        } else if score >= 60 {
            HealthTier::Good
        } else {
            HealthTier::ConsiderAlternatives
        }
    }

    /// Short machine-friendly name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthTier::Excellent => "excellent",
            HealthTier::Good => "good",
            HealthTier::ConsiderAlternatives => "consider alternatives",
        }
    }

    /// Caption shown under the score.
    pub fn label(&self) -> &'static str {
        match self {
            HealthTier::Excellent => "Excellent choice!",
            HealthTier::Good => "Good choice",
            HealthTier::ConsiderAlternatives => "Consider healthier alternatives",
        }
    }

    /// Accent color token for the score ring.
    pub fn color(&self) -> &'static str {
        match self {
            HealthTier::Excellent => "#10b981",
            HealthTier::Good => "#f59e0b",
            HealthTier::ConsiderAlternatives => "#ef4444",
        }
    }
}

impl std::fmt::Display for HealthTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn rounded_u32<'de, D: Deserializer<'de>>(de: D) -> Result<u32, D::Error> {
    let raw = f64::deserialize(de)?;
    if !raw.is_finite() || raw < 0.0 || raw > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative number, got {}",
            raw
        )));
    }
    Ok(raw.round() as u32)
}

fn rounded_i32<'de, D: Deserializer<'de>>(de: D) -> Result<i32, D::Error> {
    let raw = f64::deserialize(de)?;
    if !raw.is_finite() || raw < i32::MIN as f64 || raw > i32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected an integer score, got {}",
            raw
        )));
    }
    Ok(raw.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const APPLE: &str = r##"{
        "foodName": "Apple", "calories": 95, "protein": 0.5, "carbs": 25,
        "fats": 0.3, "fiber": 4, "healthScore": 88,
        "breakdown": [
            {"name": "Protein", "value": 0.5, "unit": "g", "color": "#3b82f6"},
            {"name": "Carbs", "value": 25, "unit": "g", "color": "#f59e0b"},
            {"name": "Fiber", "value": 4, "unit": "g", "color": "#10b981"}
        ]
    }"##;

    #[test]
    fn test_parse_apple() {
        let result = NutritionResult::from_json(APPLE.as_bytes()).unwrap();
        assert_eq!(result.food_name, "Apple");
        assert_eq!(result.calories, 95);
        assert_eq!(result.health_score, 88);
        assert_eq!(result.health_tier(), HealthTier::Excellent);
        let names: Vec<_> = result.breakdown.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["Protein", "Carbs", "Fiber"]);
    }

    #[test]
    fn test_fractional_numbers_are_rounded() {
        let body = APPLE
            .replace("\"calories\": 95", "\"calories\": 94.6")
            .replace("\"healthScore\": 88", "\"healthScore\": 79.5");
        let result = NutritionResult::from_json(body.as_bytes()).unwrap();
        assert_eq!(result.calories, 95);
        assert_eq!(result.health_score, 80);
    }

    #[test]
    fn test_rejects_bad_bodies() {
        let negative = APPLE.replace("\"calories\": 95", "\"calories\": -1");
        let blank = APPLE.replace("\"Apple\"", "\"  \"");
        let neg_grams = APPLE.replace("\"fats\": 0.3", "\"fats\": -0.3");
        let missing = r#"{"foodName": "Apple"}"#.to_string();
        for body in [negative, blank, neg_grams, missing] {
            let err = NutritionResult::from_json(body.as_bytes()).unwrap_err();
            assert_eq!(err.category(), "parse", "{}", body);
        }
    }

    #[test]
    fn test_score_outside_range_is_kept() {
        let body = APPLE.replace("\"healthScore\": 88", "\"healthScore\": 140");
        let result = NutritionResult::from_json(body.as_bytes()).unwrap();
        assert_eq!(result.health_score, 140);
        assert_eq!(result.health_tier(), HealthTier::Excellent);
    }

    #[test]
    fn test_health_tier_boundaries() {
        assert_eq!(HealthTier::from_score(85), HealthTier::Excellent);
        assert_eq!(HealthTier::from_score(80), HealthTier::Excellent);
        assert_eq!(HealthTier::from_score(79), HealthTier::Good);
        assert_eq!(HealthTier::from_score(60), HealthTier::Good);
        assert_eq!(HealthTier::from_score(59), HealthTier::ConsiderAlternatives);
        assert_eq!(HealthTier::from_score(-5), HealthTier::ConsiderAlternatives);
        assert_eq!(HealthTier::Good.to_string(), "good");
        assert_eq!(HealthTier::ConsiderAlternatives.label(), "Consider healthier alternatives");
    }

    #[test]
    fn test_bar_fill() {
        let row = |value| Nutrient {
            name: "x".into(),
            value,
            unit: "g".into(),
            color: "#000".into(),
        };
        assert_eq!(row(25.0).bar_fill_percent(), 50.0);
        assert_eq!(row(80.0).bar_fill_percent(), 100.0);
        assert_eq!(row(-3.0).bar_fill_percent(), 0.0);
        assert_eq!(row(f64::NAN).bar_fill_percent(), 0.0);
    }
}
