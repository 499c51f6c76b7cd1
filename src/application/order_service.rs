use std::sync::Arc;

use log::info;

use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, Order, OrderStatus};
use crate::domain::ports::OrderRepository;

/// Read access and fulfilment for back-office tooling.
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self { repo }
    }

    pub fn get_order(&self, transaction_id: &str) -> Result<Option<Order>, DomainError> {
        self.repo.find_by_transaction_id(transaction_id)
    }

    pub fn list_orders(&self, page: i64, limit: i64, status: Option<OrderStatus>) -> Result<ListResult, DomainError> {
        self.repo.list(page.max(1), limit.clamp(1, 100), status)
    }

    /// Marks a paid order as delivered. Repeating the call is harmless.
    pub fn complete_order(&self, transaction_id: &str) -> Result<Order, DomainError> {
        let order = self.repo.mark_completed(transaction_id)?;
        info!("Order {transaction_id} marked {}", order.status);
        Ok(order)
    }
}
