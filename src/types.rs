use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{PlanError, Result};

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a stored installment
pub type InstallmentId = Uuid;

/// installment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    /// scheduled, not yet due or paid
    Pending,
    /// payment recorded
    Paid,
    /// due date passed without payment
    Overdue,
    /// removed from the active schedule without payment
    Cancelled,
}

/// terms driving schedule generation
///
/// `start_date` is the loan's origination date, not the first due date;
/// the first installment falls due one calendar month later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub monthly_payment: Money,
    pub annual_rate: Rate,
    pub start_date: NaiveDate,
    pub installment_count: u32,
}

impl LoanTerms {
    /// validate terms before any schedule arithmetic runs
    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(PlanError::invalid_terms(format!(
                "principal must be positive, got {}",
                self.principal
            )));
        }
        if !self.monthly_payment.is_positive() {
            return Err(PlanError::invalid_terms(format!(
                "monthly payment must be positive, got {}",
                self.monthly_payment
            )));
        }
        if self.annual_rate.is_negative() {
            return Err(PlanError::invalid_terms(format!(
                "annual rate must be non-negative, got {}",
                self.annual_rate
            )));
        }
        if self.installment_count == 0 {
            return Err(PlanError::invalid_terms(
                "installment count must be at least 1",
            ));
        }
        Ok(())
    }
}

/// partial update applied to one stored installment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallmentUpdate {
    pub status: Option<InstallmentStatus>,
    pub payment_date: Option<NaiveDate>,
}

impl InstallmentUpdate {
    /// mark as paid on the given date
    pub fn paid(on: NaiveDate) -> Self {
        Self {
            status: Some(InstallmentStatus::Paid),
            payment_date: Some(on),
        }
    }

    /// status-only transition
    pub fn status(status: InstallmentStatus) -> Self {
        Self {
            status: Some(status),
            payment_date: None,
        }
    }
}
