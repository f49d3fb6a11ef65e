//! Round-robin question category selection.
//!
//! The category of question `n` depends only on `n` and the configured cycle,
//! never on anything the model said.

use std::str::FromStr;

use crate::models::interview::Category;

const ALTERNATING: &[Category] = &[Category::Technical, Category::Behavioral];
const WITH_INDUSTRY: &[Category] = &[
    Category::Technical,
    Category::Behavioral,
    Category::Industry,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryCycle {
    /// technical, behavioral, technical, behavioral, technical
    #[default]
    Alternating,
    /// technical, behavioral, industry, technical, behavioral
    WithIndustry,
}

impl CategoryCycle {
    pub fn categories(&self) -> &'static [Category] {
        match self {
            CategoryCycle::Alternating => ALTERNATING,
            CategoryCycle::WithIndustry => WITH_INDUSTRY,
        }
    }
}

impl FromStr for CategoryCycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alternating" => Ok(CategoryCycle::Alternating),
            "with_industry" | "with-industry" => Ok(CategoryCycle::WithIndustry),
            other => Err(format!("unknown category cycle '{other}'")),
        }
    }
}

/// Category for the 1-based question `index`. Index 0 is treated as 1.
pub fn category_for(index: u32, cycle: CategoryCycle) -> Category {
    let categories = cycle.categories();
    let slot = index.saturating_sub(1) as usize % categories.len();
    categories[slot]
}
