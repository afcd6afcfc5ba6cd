pub mod amount;
pub mod dashboard;
pub mod lifecycle;
pub mod transitions;

pub use amount::compute_amount;
pub use dashboard::{build_dashboard, DashboardBucket};
pub use lifecycle::InvoiceLedger;
pub use transitions::{policy_for, ForwardOnlyTransitions, PermissiveTransitions, TransitionPolicy};
