use chrono::NaiveDate;
use log::{debug, warn};
use std::sync::Arc;

use crate::cache::PlanCache;
use crate::errors::Result;
use crate::repository::{PaymentPlanRepository, StoredInstallment};
use crate::schedule::PaymentPlan;
use crate::types::{InstallmentId, InstallmentStatus, InstallmentUpdate, LoanId, LoanTerms};

/// payment plan workflows: generation composed with persistence
///
/// Concurrent regeneration of the same loan's plan is not guarded here; the
/// last persist after a delete wins. Callers that allow concurrent term
/// edits must serialize them at a higher level.
pub struct PlanService<R: PaymentPlanRepository> {
    repo: Arc<R>,
    cache: Arc<PlanCache>,
}

impl<R: PaymentPlanRepository> PlanService<R> {
    pub fn new(repo: Arc<R>, cache: Arc<PlanCache>) -> Self {
        Self { repo, cache }
    }

    /// generate a schedule from loan terms and persist it as one batch
    pub fn create_plan(&self, loan_id: LoanId, terms: &LoanTerms) -> Result<Vec<StoredInstallment>> {
        let plan = PaymentPlan::generate(terms)?;
        let stored = self.repo.persist(loan_id, &plan.installments)?;
        self.cache.insert(loan_id, stored.clone());
        debug!(
            "created plan for loan {}: {} installments, total interest {}",
            loan_id,
            stored.len(),
            plan.total_interest
        );
        Ok(stored)
    }

    /// fetch a loan's plan, served from the cache when fresh
    pub fn get_plan(&self, loan_id: LoanId) -> Result<Vec<StoredInstallment>> {
        if let Some(cached) = self.cache.get(&loan_id) {
            return Ok((*cached).clone());
        }
        let fetched = self.repo.fetch(loan_id)?;
        self.cache.insert(loan_id, fetched.clone());
        Ok(fetched)
    }

    /// drop the existing plan and rebuild it from edited terms
    pub fn regenerate_plan(
        &self,
        loan_id: LoanId,
        terms: &LoanTerms,
    ) -> Result<Vec<StoredInstallment>> {
        let removed = self.repo.delete_all_for_loan(loan_id)?;
        debug!("regenerating plan for loan {}: dropped {} rows", loan_id, removed);
        self.cache.invalidate(&loan_id);
        self.create_plan(loan_id, terms)
    }

    /// record a payment against one installment
    pub fn record_payment(
        &self,
        installment_id: InstallmentId,
        paid_on: NaiveDate,
    ) -> Result<StoredInstallment> {
        let updated = self
            .repo
            .update(installment_id, InstallmentUpdate::paid(paid_on))?;
        self.cache.invalidate(&updated.loan_id);
        Ok(updated)
    }

    /// take one installment out of the active schedule without payment
    pub fn cancel_installment(&self, installment_id: InstallmentId) -> Result<StoredInstallment> {
        let updated = self
            .repo
            .update(installment_id, InstallmentUpdate::status(InstallmentStatus::Cancelled))?;
        self.cache.invalidate(&updated.loan_id);
        Ok(updated)
    }

    /// flip pending installments whose due date has passed to overdue;
    /// returns how many were flipped
    pub fn refresh_overdue(&self, loan_id: LoanId, today: NaiveDate) -> Result<usize> {
        let rows = self.repo.fetch(loan_id)?;
        let mut flipped = 0;

        for row in rows {
            if row.installment.status == InstallmentStatus::Pending
                && row.installment.due_date < today
            {
                self.repo
                    .update(row.id, InstallmentUpdate::status(InstallmentStatus::Overdue))?;
                flipped += 1;
            }
        }

        if flipped > 0 {
            warn!("loan {} has {} overdue installments", loan_id, flipped);
            self.cache.invalidate(&loan_id);
        }
        Ok(flipped)
    }

    /// remove a loan's entire plan
    pub fn delete_plan(&self, loan_id: LoanId) -> Result<usize> {
        let removed = self.repo.delete_all_for_loan(loan_id)?;
        self.cache.invalidate(&loan_id);
        Ok(removed)
    }
}
