use std::cmp::Ordering;

/// Fade out, then in, around each reordering of `#charts`.
pub const SWAP_FADE_MS: u32 = 300;

/// Which ordering the chart list is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Percentile,
    Savings,
}

impl SortOrder {
    /// Map a sort button's `data-orderby` value.
    pub fn from_button(orderby: Option<&str>) -> Self {
        match orderby {
            Some("savings") => Self::Savings,
            _ => Self::Percentile,
        }
    }

    pub const fn hides_non_cost_saving(self) -> bool {
        matches!(self, Self::Savings)
    }
}

/// An entry in an ordering: an existing chart element by DOM index, or the
/// "no cost saving" warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Slot {
    Chart(usize),
    Placeholder,
}

/// Both orderings of the chart list, computed once from the initial DOM order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrderings {
    pub by_percentile: Vec<Slot>,
    pub by_savings: Vec<Slot>,
    pub non_cost_saving: Vec<usize>,
}

impl SortOrderings {
    /// `savings[i]` is chart `i`'s parsed `data-costsaving` value.
    pub fn from_savings(savings: &[Option<f64>]) -> Self {
        let by_percentile: Vec<Slot> = (0..savings.len()).map(Slot::Chart).collect();
        let non_cost_saving: Vec<usize> = savings
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i)
            .collect();

        let mut indices: Vec<usize> = (0..savings.len()).collect();
        indices.sort_by(|&a, &b| match (savings[a], savings[b]) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        let mut by_savings: Vec<Slot> = indices.into_iter().map(Slot::Chart).collect();
        // Only when nothing at all can be saved; partial data gets no warning.
        if non_cost_saving.len() == savings.len() {
            by_savings.push(Slot::Placeholder);
        }

        Self {
            by_percentile,
            by_savings,
            non_cost_saving,
        }
    }

    pub fn slots(&self, order: SortOrder) -> &[Slot] {
        match order {
            SortOrder::Percentile => &self.by_percentile,
            SortOrder::Savings => &self.by_savings,
        }
    }
}

/// Parse a `data-costsaving` attribute. Missing, non-numeric and zero values
/// mark the chart as non-cost-saving.
pub fn parse_cost_saving(attr: Option<&str>) -> Option<f64> {
    attr.and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value != 0.0)
}

/// `?sortBySavings` anywhere in the query string selects the savings order on load.
pub fn sort_by_savings_requested(search: &str) -> bool {
    search.contains("sortBySavings")
}
