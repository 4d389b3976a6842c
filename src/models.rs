//! Rows as they are stored in the database, and their conversions into
//! domain types.

pub mod budgets;
pub mod categories;
pub mod expenses;
pub mod notifications;
pub mod users;

pub use budgets::BudgetModel;
pub use categories::CategoryModel;
pub use expenses::ExpenseModel;
pub use notifications::NotificationModel;
pub use users::{NewUserModel, UserCredentialsModel, UserModel};
