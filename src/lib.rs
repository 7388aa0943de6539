pub mod cache;
pub mod decimal;
pub mod errors;
pub mod repository;
pub mod schedule;
pub mod service;
pub mod types;

// re-export key types
pub use cache::PlanCache;
pub use decimal::{Money, Rate};
pub use errors::{PlanError, Result};
pub use repository::{InMemoryPlanRepository, PaymentPlanRepository, StoredInstallment};
pub use schedule::{Installment, PaymentPlan};
pub use service::PlanService;
pub use types::{
    InstallmentId, InstallmentStatus, InstallmentUpdate, LoanId, LoanTerms,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
