pub mod dashboard_repo;
pub mod document_repo;
pub mod inventory_repo;
pub mod stock_repo;
pub mod user_repo;

pub use dashboard_repo::DashboardRepository;
pub use document_repo::DocumentRepository;
pub use inventory_repo::{InventoryRepository, Lookup};
pub use stock_repo::StockRepository;
pub use user_repo::UserRepository;
