pub mod audit_logs;
pub mod cart_items;
pub mod cart_sessions;
pub mod inventory;
pub mod orders;
pub mod skus;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use cart_sessions::Entity as CartSessions;
pub use inventory::Entity as Inventory;
pub use orders::Entity as Orders;
pub use skus::Entity as Skus;
