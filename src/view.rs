//! Presentation view model.
//!
//! A [`Screen`] is computed from a [`SessionState`] every time something is
//! rendered and never stored. The `Display` impl is the text rendering used by
//! the terminal front end.

use std::fmt;

use crate::nutrition::{HealthTier, NutritionResult};
use crate::session::SessionState;
use crate::source::ImageRef;

/// Width of a rendered nutrient bar, in cells.
const BAR_WIDTH: usize = 20;

/// One of the three screens.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Capture,
    Analyzing { preview: ImageRef },
    Results(ResultsView),
}

impl Screen {
    pub fn from_state(state: &SessionState) -> Self {
        match state {
            SessionState::Idle => Screen::Capture,
            SessionState::Analyzing { image } => Screen::Analyzing {
                preview: image.clone(),
            },
            SessionState::Result { image, result } => {
                Screen::Results(ResultsView::new(image.clone(), result))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Screen::Capture => "capture",
            Screen::Analyzing { .. } => "analyzing",
            Screen::Results(_) => "results",
        }
    }
}

impl From<&SessionState> for Screen {
    fn from(state: &SessionState) -> Self {
        Self::from_state(state)
    }
}

/// Headline macro shown in the summary grid.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroCell {
    pub label: &'static str,
    pub grams: f64,
}

/// One breakdown row with its progress bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRow {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub color: String,
    pub fill_percent: f64,
}

impl BarRow {
    /// Filled cells out of [`BAR_WIDTH`].
    pub fn filled_cells(&self) -> usize {
        ((self.fill_percent / 100.0) * BAR_WIDTH as f64).round() as usize
    }
}

/// Everything the results screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub preview: ImageRef,
    pub food_name: String,
    pub calories: u32,
    pub health_score: i32,
    pub tier: HealthTier,
    pub macros: [MacroCell; 4],
    pub bars: Vec<BarRow>,
}

impl ResultsView {
    pub fn new(preview: ImageRef, result: &NutritionResult) -> Self {
        Self {
            preview,
            food_name: result.food_name.clone(),
            calories: result.calories,
            health_score: result.health_score,
            tier: result.health_tier(),
            macros: [
                MacroCell {
                    label: "Protein",
                    grams: result.protein,
                },
                MacroCell {
                    label: "Carbs",
                    grams: result.carbs,
                },
                MacroCell {
                    label: "Fats",
                    grams: result.fats,
                },
                MacroCell {
                    label: "Fiber",
                    grams: result.fiber,
                },
            ],
            bars: result
                .breakdown
                .iter()
                .map(|n| BarRow {
                    name: n.name.clone(),
                    value: n.value,
                    unit: n.unit.clone(),
                    color: n.color.clone(),
                    fill_percent: n.bar_fill_percent(),
                })
                .collect(),
        }
    }

    pub fn tier_label(&self) -> &'static str {
        self.tier.label()
    }

    pub fn tier_color(&self) -> &'static str {
        self.tier.color()
    }

    /// Score clamped to 0..=100. The stored value is left alone.
    pub fn display_score(&self) -> i32 {
        self.health_score.clamp(0, 100)
    }
}

fn amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Capture => {
                writeln!(f, "NutriSnap")?;
                writeln!(f, "Snap a photo of your meal to get instant nutrition facts.")?;
                writeln!(f)?;
                writeln!(f, "  [c] Take photo")?;
                writeln!(f, "  [g] Upload from gallery")?;
                writeln!(f, "  [q] Quit")
            }
            Screen::Analyzing { preview } => {
                writeln!(f, "Analyzing your food...")?;
                writeln!(f, "  {}", preview)?;
                writeln!(f)?;
                writeln!(f, "  [b] Back")
            }
            Screen::Results(view) => view.fmt(f),
        }
    }
}

impl fmt::Display for ResultsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.food_name)?;
        writeln!(f, "  {} calories", self.calories)?;
        writeln!(
            f,
            "  Health score {}/100 ({})",
            self.display_score(),
            self.tier_label()
        )?;
        writeln!(f)?;

        let grid: Vec<String> = self
            .macros
            .iter()
            .map(|m| format!("{} {}g", m.label, amount(m.grams)))
            .collect();
        writeln!(f, "  {}", grid.join("   "))?;

        if !self.bars.is_empty() {
            writeln!(f)?;
            writeln!(f, "  Nutritional breakdown")?;
            let name_width = self.bars.iter().map(|b| b.name.len()).max().unwrap_or(0);
            for bar in &self.bars {
                let filled = bar.filled_cells().min(BAR_WIDTH);
                writeln!(
                    f,
                    "  {:<width$}  {}{}  {}{}",
                    bar.name,
                    "#".repeat(filled),
                    ".".repeat(BAR_WIDTH - filled),
                    amount(bar.value),
                    bar.unit,
                    width = name_width
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "  [b] Analyze another meal")
    }
}
