//! Colours for cash-flow kinds and main categories

use std::collections::HashMap;

/// Cash-flow kind -> colour
pub const CASH_FLOW_COLORS: [(&str, &str); 5] = [
    ("Revenue", "#4DAB9A"),
    ("Expense", "#FF7369"),
    ("Transfer to Savings", "#FFDC49"),
    ("Bank Transfer Out", "#FFA344"),
    ("Bank Transfer In", "#529CCA"),
];

/// Handed out in order to main categories without a configured colour
pub const CATEGORY_PALETTE: [&str; 9] = [
    "#529CCA", "#4DAB9A", "#FFA344", "#9A6DD7", "#E255A1", "#FF7369", "#FFDC49", "#937264",
    "#979A9B",
];

const FALLBACK: &str = "#979A9B";

pub fn cash_flow_color(kind: &str) -> &'static str {
    CASH_FLOW_COLORS
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, color)| *color)
        .unwrap_or(FALLBACK)
}

/// Assigns a stable colour to each main category of one chart.
///
/// Configured colours win; the rest cycle through [`CATEGORY_PALETTE`] in
/// first-seen order.
#[derive(Debug)]
pub struct CategoryColors<'a> {
    configured: &'a HashMap<String, String>,
    assigned: HashMap<String, String>,
    next: usize,
}

impl<'a> CategoryColors<'a> {
    pub fn new(configured: &'a HashMap<String, String>) -> Self {
        Self {
            configured,
            assigned: HashMap::new(),
            next: 0,
        }
    }

    pub fn color_for(&mut self, main_category: &str) -> String {
        if let Some(color) = self.configured.get(main_category) {
            return color.clone();
        }
        if let Some(color) = self.assigned.get(main_category) {
            return color.clone();
        }
        let color = CATEGORY_PALETTE[self.next % CATEGORY_PALETTE.len()].to_string();
        self.next += 1;
        self.assigned.insert(main_category.to_string(), color.clone());
        color
    }
}
