use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{PlanError, Result};
use crate::types::{InstallmentStatus, LoanTerms};

/// one scheduled payment period of a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub total_payment: Money,
    pub remaining_debt_after: Money,
    pub status: InstallmentStatus,
}

/// full payment plan for a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub terms: LoanTerms,
    pub installments: Vec<Installment>,
    pub total_interest: Money,
    pub total_scheduled: Money,
}

impl PaymentPlan {
    /// generate the full installment schedule in one forward pass
    ///
    /// Due dates advance by whole calendar months from the origination date,
    /// clamping to the target month's last day when the start day does not
    /// exist there (Jan 31 -> Feb 28). When the monthly payment does not
    /// cover the accrued interest, the principal portion floors at zero and
    /// the balance carries forward unchanged; whatever balance survives to
    /// the final period is folded into the last installment so the plan
    /// always retires the debt exactly.
    pub fn generate(terms: &LoanTerms) -> Result<Self> {
        terms.validate()?;

        let monthly_rate = terms.annual_rate.monthly_rate().as_decimal();
        let mut remaining = terms.principal;
        let mut installments = Vec::with_capacity(terms.installment_count as usize);

        for i in 1..=terms.installment_count {
            let due_date = add_months(terms.start_date, i)?;

            let interest_portion = Money::from_decimal(remaining.as_decimal() * monthly_rate);
            // shortfall months pay interest only; the balance never grows
            let mut principal_portion = (terms.monthly_payment - interest_portion)
                .max(Money::ZERO)
                .min(remaining);
            let projected = (remaining - principal_portion).max(Money::ZERO);

            let is_last = i == terms.installment_count;
            let (total_payment, ending) = if is_last && projected > Money::ZERO {
                // fold the leftover balance into the final installment
                principal_portion += projected;
                (interest_portion + principal_portion, Money::ZERO)
            } else {
                (terms.monthly_payment, projected)
            };

            installments.push(Installment {
                installment_number: i,
                due_date,
                principal_portion,
                interest_portion,
                total_payment,
                remaining_debt_after: ending,
                status: InstallmentStatus::Pending,
            });

            remaining = ending;
        }

        let total_interest = installments
            .iter()
            .map(|p| p.interest_portion)
            .fold(Money::ZERO, |acc, x| acc + x);

        let total_scheduled = installments
            .iter()
            .map(|p| p.total_payment)
            .fold(Money::ZERO, |acc, x| acc + x);

        Ok(Self {
            terms: terms.clone(),
            installments,
            total_interest,
            total_scheduled,
        })
    }

    /// get installment for a specific period
    pub fn installment(&self, installment_number: u32) -> Option<&Installment> {
        self.installments.get((installment_number - 1) as usize)
    }

    /// remaining balance after a given installment
    pub fn balance_after(&self, installment_number: u32) -> Money {
        self.installment(installment_number)
            .map(|p| p.remaining_debt_after)
            .unwrap_or(self.terms.principal)
    }
}

/// advance a date by whole calendar months, clamping to month end
fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| {
            PlanError::invalid_terms(format!(
                "due date out of range: {} + {} months",
                date, months
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use rust_decimal_macros::dec;

    fn terms(
        principal: i64,
        payment: i64,
        rate_percent: i64,
        start: (i32, u32, u32),
        count: u32,
    ) -> LoanTerms {
        LoanTerms {
            principal: Money::from_major(principal),
            monthly_payment: Money::from_major(payment),
            annual_rate: Rate::from_percent(rust_decimal::Decimal::from(rate_percent)),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            installment_count: count,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_standard_loan_first_installment() {
        // 12,000 at 24%/year, 1,100/month over 12 months
        let plan = PaymentPlan::generate(&terms(12_000, 1_100, 24, (2025, 1, 15), 12)).unwrap();

        assert_eq!(plan.installments.len(), 12);

        let first = &plan.installments[0];
        assert_eq!(first.installment_number, 1);
        assert_eq!(first.due_date, date(2025, 2, 15));
        assert_eq!(first.interest_portion, Money::from_major(240));
        assert_eq!(first.principal_portion, Money::from_major(860));
        assert_eq!(first.total_payment, Money::from_major(1_100));
        assert_eq!(first.remaining_debt_after, Money::from_decimal(dec!(11140)));
        assert_eq!(first.status, InstallmentStatus::Pending);
    }

    #[test]
    fn test_full_amortization() {
        let plan = PaymentPlan::generate(&terms(12_000, 1_100, 24, (2025, 1, 15), 12)).unwrap();
        assert_eq!(
            plan.installments.last().unwrap().remaining_debt_after,
            Money::ZERO
        );
    }

    #[test]
    fn test_balance_monotonically_non_increasing() {
        let plan = PaymentPlan::generate(&terms(12_000, 1_100, 24, (2025, 1, 15), 12)).unwrap();
        let mut prev = plan.terms.principal;
        for p in &plan.installments {
            assert!(p.remaining_debt_after <= prev);
            prev = p.remaining_debt_after;
        }
    }

    #[test]
    fn test_due_dates_advance_one_calendar_month() {
        let plan = PaymentPlan::generate(&terms(12_000, 1_100, 24, (2025, 1, 15), 12)).unwrap();
        for (i, p) in plan.installments.iter().enumerate() {
            let expected = plan
                .terms
                .start_date
                .checked_add_months(Months::new(i as u32 + 1))
                .unwrap();
            assert_eq!(p.due_date, expected);
        }
    }

    #[test]
    fn test_sequence_integrity() {
        let plan = PaymentPlan::generate(&terms(5_000, 500, 18, (2025, 6, 1), 11)).unwrap();
        let numbers: Vec<u32> = plan
            .installments
            .iter()
            .map(|p| p.installment_number)
            .collect();
        assert_eq!(numbers, (1..=11).collect::<Vec<u32>>());
    }

    #[test]
    fn test_no_negative_amounts() {
        // payment far below interest due
        let plan = PaymentPlan::generate(&terms(10_000, 100, 24, (2025, 1, 1), 6)).unwrap();
        for p in &plan.installments {
            assert!(!p.principal_portion.is_negative());
            assert!(!p.interest_portion.is_negative());
            assert!(!p.total_payment.is_negative());
        }
    }

    #[test]
    fn test_single_installment_absorbs_principal() {
        // monthly payment is irrelevant when there is only one installment
        let plan = PaymentPlan::generate(&terms(1_000, 100, 0, (2025, 3, 10), 1)).unwrap();

        assert_eq!(plan.installments.len(), 1);
        let only = &plan.installments[0];
        assert_eq!(only.principal_portion, Money::from_major(1_000));
        assert_eq!(only.interest_portion, Money::ZERO);
        assert_eq!(only.total_payment, Money::from_major(1_000));
        assert_eq!(only.remaining_debt_after, Money::ZERO);
    }

    #[test]
    fn test_month_end_clamping() {
        let plan = PaymentPlan::generate(&terms(1_000, 1_000, 0, (2025, 1, 31), 1)).unwrap();
        assert_eq!(plan.installments[0].due_date, date(2025, 2, 28));
    }

    #[test]
    fn test_month_end_clamping_leap_year() {
        let plan = PaymentPlan::generate(&terms(1_000, 500, 0, (2024, 1, 31), 3)).unwrap();
        assert_eq!(plan.installments[0].due_date, date(2024, 2, 29));
        assert_eq!(plan.installments[1].due_date, date(2024, 3, 31));
        assert_eq!(plan.installments[2].due_date, date(2024, 4, 30));
    }

    #[test]
    fn test_zero_rate_is_pure_principal() {
        let plan = PaymentPlan::generate(&terms(1_200, 100, 0, (2025, 1, 1), 12)).unwrap();
        for p in &plan.installments {
            assert_eq!(p.interest_portion, Money::ZERO);
            assert_eq!(p.principal_portion, Money::from_major(100));
        }
        assert_eq!(plan.total_interest, Money::ZERO);
        assert_eq!(plan.installments.last().unwrap().remaining_debt_after, Money::ZERO);
    }

    #[test]
    fn test_negative_amortization_balloons_last_installment() {
        // 100/month cannot cover 200/month interest; the whole balance
        // survives to the final period and lands there
        let plan = PaymentPlan::generate(&terms(10_000, 100, 24, (2025, 1, 1), 6)).unwrap();

        for p in &plan.installments[..5] {
            assert_eq!(p.principal_portion, Money::ZERO);
            assert_eq!(p.interest_portion, Money::from_major(200));
            assert_eq!(p.remaining_debt_after, Money::from_major(10_000));
            assert_eq!(p.total_payment, Money::from_major(100));
        }

        let last = plan.installments.last().unwrap();
        assert_eq!(last.principal_portion, Money::from_major(10_000));
        assert_eq!(last.total_payment, Money::from_major(10_200));
        assert_eq!(last.remaining_debt_after, Money::ZERO);
    }

    #[test]
    fn test_principal_portions_sum_to_principal() {
        for (principal, payment, rate, count) in [
            (12_000, 1_100, 24, 12),
            (5_000, 450, 18, 12),
            (10_000, 100, 24, 6),
            (1_000, 100, 0, 1),
        ] {
            let plan =
                PaymentPlan::generate(&terms(principal, payment, rate, (2025, 1, 15), count))
                    .unwrap();
            let sum = plan
                .installments
                .iter()
                .map(|p| p.principal_portion)
                .fold(Money::ZERO, |acc, x| acc + x);
            assert_eq!(sum, Money::from_major(principal));
        }
    }

    #[test]
    fn test_early_payoff_leaves_trailing_zero_periods() {
        // 600/month retires 1,000 in two periods; the third pays nothing down
        let plan = PaymentPlan::generate(&terms(1_000, 600, 0, (2025, 1, 1), 3)).unwrap();

        assert_eq!(plan.installments[0].principal_portion, Money::from_major(600));
        assert_eq!(plan.installments[1].principal_portion, Money::from_major(400));
        assert_eq!(plan.installments[1].remaining_debt_after, Money::ZERO);
        assert_eq!(plan.installments[2].principal_portion, Money::ZERO);
        assert_eq!(plan.installments[2].remaining_debt_after, Money::ZERO);
    }

    #[test]
    fn test_invalid_terms_rejected_before_generation() {
        let mut bad = terms(12_000, 1_100, 24, (2025, 1, 15), 12);
        bad.installment_count = 0;
        assert!(matches!(
            PaymentPlan::generate(&bad),
            Err(PlanError::InvalidTerms { .. })
        ));
    }

    #[test]
    fn test_totals_aggregate_schedule() {
        let plan = PaymentPlan::generate(&terms(1_200, 100, 0, (2025, 1, 1), 12)).unwrap();
        assert_eq!(plan.total_scheduled, Money::from_major(1_200));
        assert_eq!(plan.total_interest, Money::ZERO);
        assert_eq!(plan.balance_after(6), Money::from_major(600));
    }

    #[test]
    fn test_plan_json_round_trip() {
        let plan = PaymentPlan::generate(&terms(12_000, 1_100, 24, (2025, 1, 15), 12)).unwrap();
        let json = serde_json::to_string(&plan).unwrap();
        let back: PaymentPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }
}
