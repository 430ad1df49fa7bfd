// Application layer - Use cases over the metrics API
pub mod dashboard_service;
pub mod metrics_repository;
