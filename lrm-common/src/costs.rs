//! Cost aggregation
//!
//! Per-license totals and roll-ups across licenses. Variance is
//! `estimated - actual`: positive means the license came in under budget.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{CostCategory, License};
use crate::money::Money;

/// Cost totals for one license
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LicenseTotals {
    pub initial_estimated: Money,
    pub actual_spent: Money,
    /// Renewal plus continuing-ed cost per renewal period
    pub recurring_cost: Money,
    pub variance: Money,
}

impl LicenseTotals {
    pub fn for_license(license: &License) -> Self {
        let initial_estimated = license.estimated_costs.total();
        let actual_spent: Money = license.actual_costs.iter().map(|c| c.amount).sum();
        let recurring_cost = license.recurring.renewal_fee + license.recurring.continuing_ed_fee;

        Self {
            initial_estimated,
            actual_spent,
            recurring_cost,
            variance: initial_estimated - actual_spent,
        }
    }
}

/// Recurring cost normalized to one year
pub fn annual_recurring(license: &License) -> Money {
    LicenseTotals::for_license(license)
        .recurring_cost
        .divide(license.recurring.renewal_period_years)
}

/// Roll-up across a set of licenses
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostSummary {
    pub total_estimated: Money,
    pub total_actual: Money,
    pub total_variance: Money,
    /// Sum of annualized recurring costs
    pub total_recurring: Money,
}

impl CostSummary {
    pub fn over<'a, I>(licenses: I) -> Self
    where
        I: IntoIterator<Item = &'a License>,
    {
        licenses
            .into_iter()
            .fold(CostSummary::default(), |mut acc, license| {
                let totals = LicenseTotals::for_license(license);
                acc.total_estimated += totals.initial_estimated;
                acc.total_actual += totals.actual_spent;
                acc.total_variance += totals.variance;
                acc.total_recurring += annual_recurring(license);
                acc
            })
    }
}

/// Actual spend for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: CostCategory,
    pub label: &'static str,
    pub amount: Money,
}

/// Actual costs summed per category, largest first
pub fn category_breakdown<'a, I>(licenses: I) -> Vec<CategoryTotal>
where
    I: IntoIterator<Item = &'a License>,
{
    let mut sums: HashMap<CostCategory, Money> = HashMap::new();
    for license in licenses {
        for cost in &license.actual_costs {
            *sums.entry(cost.category).or_default() += cost.amount;
        }
    }

    let mut totals: Vec<CategoryTotal> = sums
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            category,
            label: category.label(),
            amount,
        })
        .collect();
    totals.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CostEntry, EstimatedCosts};

    fn cost(category: CostCategory, dollars: i64) -> CostEntry {
        CostEntry {
            date: None,
            category,
            amount: Money::from_dollars(dollars),
            vendor: None,
            notes: None,
            recurring: category.is_recurring(),
        }
    }

    fn sample_license() -> License {
        let mut lic = License::new("tx-1", "TX", "Master Plumber");
        lic.estimated_costs = EstimatedCosts {
            application_fee: Money::from_dollars(200),
            test_fee: Money::from_dollars(150),
            travel: Money::from_dollars(100),
            ..Default::default()
        };
        lic.actual_costs = vec![
            cost(CostCategory::ApplicationFee, 200),
            cost(CostCategory::TestFee, 175),
        ];
        lic.recurring.renewal_fee = Money::from_dollars(300);
        lic.recurring.continuing_ed_fee = Money::from_dollars(100);
        lic.recurring.renewal_period_years = 2;
        lic
    }

    #[test]
    fn test_license_totals() {
        let totals = LicenseTotals::for_license(&sample_license());
        assert_eq!(totals.initial_estimated, Money::from_dollars(450));
        assert_eq!(totals.actual_spent, Money::from_dollars(375));
        assert_eq!(totals.recurring_cost, Money::from_dollars(400));
        assert_eq!(totals.variance, Money::from_dollars(75));
    }

    #[test]
    fn test_over_budget_variance_is_negative() {
        let mut lic = sample_license();
        lic.actual_costs.push(cost(CostCategory::Travel, 500));
        assert_eq!(
            LicenseTotals::for_license(&lic).variance,
            Money::from_dollars(-425)
        );
    }

    #[test]
    fn test_annual_recurring_divides_by_period() {
        let mut lic = sample_license();
        assert_eq!(annual_recurring(&lic), Money::from_dollars(200));
        lic.recurring.renewal_period_years = 0;
        assert_eq!(annual_recurring(&lic), Money::ZERO);
    }

    #[test]
    fn test_summary_over_licenses() {
        let a = sample_license();
        let mut b = License::new("nm-1", "NM", "Journeyman");
        b.actual_costs = vec![cost(CostCategory::Shipping, 25)];
        b.recurring.renewal_fee = Money::from_dollars(90);
        b.recurring.renewal_period_years = 3;

        let summary = CostSummary::over([&a, &b]);
        assert_eq!(summary.total_estimated, Money::from_dollars(450));
        assert_eq!(summary.total_actual, Money::from_dollars(400));
        assert_eq!(summary.total_variance, Money::from_dollars(50));
        assert_eq!(summary.total_recurring, Money::from_dollars(230));
    }

    #[test]
    fn test_summary_of_nothing_is_zero() {
        let empty: Vec<License> = Vec::new();
        assert_eq!(CostSummary::over(&empty), CostSummary::default());
    }

    #[test]
    fn test_category_breakdown_sorted_descending() {
        let a = sample_license();
        let mut b = License::new("nm-1", "NM", "Journeyman");
        b.actual_costs = vec![
            cost(CostCategory::TestFee, 50),
            cost(CostCategory::Travel, 80),
        ];

        let breakdown = category_breakdown([&a, &b]);
        let flat: Vec<(CostCategory, Money)> =
            breakdown.iter().map(|c| (c.category, c.amount)).collect();
        assert_eq!(
            flat,
            vec![
                (CostCategory::TestFee, Money::from_dollars(225)),
                (CostCategory::ApplicationFee, Money::from_dollars(200)),
                (CostCategory::Travel, Money::from_dollars(80)),
            ]
        );
        assert_eq!(breakdown[0].label, "Test Fee");
    }
}
