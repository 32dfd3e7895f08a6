pub use super::admin_activity_log::Entity as AdminActivityLog;
pub use super::admin_password_resets::Entity as AdminPasswordResets;
pub use super::admins::Entity as Admins;
pub use super::categories::Entity as Categories;
pub use super::order_items::Entity as OrderItems;
pub use super::orders::Entity as Orders;
pub use super::products::Entity as Products;
pub use super::user_activity_log::Entity as UserActivityLog;
pub use super::users::Entity as Users;
