// src/services.rs

pub mod auth;
pub mod dashboard_service;
pub mod document_service;
pub mod import_service;
pub mod inventory_service;
pub mod pdf;
pub mod report_service;
pub mod stock_service;
pub mod user_service;
