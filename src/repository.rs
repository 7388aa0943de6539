use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::errors::{PlanError, Result};
use crate::schedule::Installment;
use crate::types::{InstallmentId, InstallmentUpdate, LoanId};

/// installment row as persisted, with server-assigned fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredInstallment {
    pub id: InstallmentId,
    pub loan_id: LoanId,
    #[serde(flatten)]
    pub installment: Installment,
    pub payment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// row-store operations for payment plans
///
/// `persist` is all-or-nothing: either every installment of the batch is
/// written or the call fails and nothing is kept. No operation retries
/// internally; store failures surface to the caller unmodified.
pub trait PaymentPlanRepository: Send + Sync {
    fn persist(&self, loan_id: LoanId, installments: &[Installment])
        -> Result<Vec<StoredInstallment>>;

    /// all installments for a loan, ordered by installment number ascending;
    /// empty when the loan has no plan
    fn fetch(&self, loan_id: LoanId) -> Result<Vec<StoredInstallment>>;

    /// apply a partial update and stamp the modification timestamp
    fn update(
        &self,
        installment_id: InstallmentId,
        update: InstallmentUpdate,
    ) -> Result<StoredInstallment>;

    /// remove every installment of a loan; deleting an empty plan is a no-op
    fn delete_all_for_loan(&self, loan_id: LoanId) -> Result<usize>;
}

/// in-memory repository backing tests and single-process use
pub struct InMemoryPlanRepository {
    rows: Mutex<Vec<StoredInstallment>>,
    time: SafeTimeProvider,
}

impl InMemoryPlanRepository {
    pub fn new(time: SafeTimeProvider) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            time,
        }
    }

    fn rows(&self) -> Result<MutexGuard<'_, Vec<StoredInstallment>>> {
        self.rows
            .lock()
            .map_err(|_| PlanError::persistence("installment store lock poisoned"))
    }
}

impl PaymentPlanRepository for InMemoryPlanRepository {
    fn persist(
        &self,
        loan_id: LoanId,
        installments: &[Installment],
    ) -> Result<Vec<StoredInstallment>> {
        let now = self.time.now();
        let mut rows = self.rows()?;

        let inserted: Vec<StoredInstallment> = installments
            .iter()
            .map(|installment| StoredInstallment {
                id: Uuid::new_v4(),
                loan_id,
                installment: installment.clone(),
                payment_date: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        rows.extend(inserted.iter().cloned());
        debug!(
            "persisted {} installments for loan {}",
            inserted.len(),
            loan_id
        );

        Ok(inserted)
    }

    fn fetch(&self, loan_id: LoanId) -> Result<Vec<StoredInstallment>> {
        let rows = self.rows()?;
        let mut result: Vec<StoredInstallment> = rows
            .iter()
            .filter(|r| r.loan_id == loan_id)
            .cloned()
            .collect();
        result.sort_by_key(|r| r.installment.installment_number);
        Ok(result)
    }

    fn update(
        &self,
        installment_id: InstallmentId,
        update: InstallmentUpdate,
    ) -> Result<StoredInstallment> {
        let now = self.time.now();
        let mut rows = self.rows()?;

        let row = rows
            .iter_mut()
            .find(|r| r.id == installment_id)
            .ok_or(PlanError::InstallmentNotFound { id: installment_id })?;

        if let Some(status) = update.status {
            row.installment.status = status;
        }
        if let Some(payment_date) = update.payment_date {
            row.payment_date = Some(payment_date);
        }
        row.updated_at = now;

        Ok(row.clone())
    }

    fn delete_all_for_loan(&self, loan_id: LoanId) -> Result<usize> {
        let mut rows = self.rows()?;
        let before = rows.len();
        rows.retain(|r| r.loan_id != loan_id);
        let removed = before - rows.len();
        debug!("deleted {} installments for loan {}", removed, loan_id);
        Ok(removed)
    }
}
