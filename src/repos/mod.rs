mod budgets;
mod categories;
mod email;
mod expenses;
#[cfg(test)]
pub(crate) mod memory;
mod notifications;
mod password_resets;
mod users;

pub use budgets::{BudgetRepo, DynBudgetRepo};
pub use categories::{CategoryDeletionError, CategoryRepo, DynCategoryRepo};
pub use email::{DynEmailRepo, EmailRepo, EmailVerificationError};
pub use expenses::{DynExpenseRepo, ExpenseRepo};
pub use notifications::{DynNotificationRepo, NotificationRepo, NOTIFICATION_PAGE_SIZE};
pub use password_resets::{DynPasswordResetRepo, PasswordResetRepo};
pub use users::{DynUserRepo, UserPersistenceError, UserRepo};
