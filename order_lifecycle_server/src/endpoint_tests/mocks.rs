use std::sync::Arc;

use mockall::mock;
use order_lifecycle_engine::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, StatusChange},
    OrderManagement,
    OrderManagementError,
};

/// The storage calls the endpoint tests set expectations on.
#[allow(async_fn_in_trait)]
pub trait OrderStoreCalls {
    async fn create_order(&self, order: NewOrder) -> Result<Order, OrderManagementError>;
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderManagementError>;
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
        reason: &str,
    ) -> Result<(), OrderManagementError>;
    async fn update_payment_id(&self, order_id: &OrderId, payment_id: &str) -> Result<(), OrderManagementError>;
    async fn fetch_history(&self, order_id: &OrderId) -> Result<Vec<StatusChange>, OrderManagementError>;
}

mock! {
    pub OrderStore {}
    impl OrderStoreCalls for OrderStore {
        async fn create_order(&self, order: NewOrder) -> Result<Order, OrderManagementError>;
        async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderManagementError>;
        async fn update_order_status(&self, order_id: &OrderId, status: OrderStatusType, reason: &str) -> Result<(), OrderManagementError>;
        async fn update_payment_id(&self, order_id: &OrderId, payment_id: &str) -> Result<(), OrderManagementError>;
        async fn fetch_history(&self, order_id: &OrderId) -> Result<Vec<StatusChange>, OrderManagementError>;
    }
}

/// A [`MockOrderStore`] shared by every clone the server makes, so expectations are checked across all of them.
#[derive(Clone)]
pub struct SharedOrderStore(Arc<MockOrderStore>);

impl From<MockOrderStore> for SharedOrderStore {
    fn from(mock: MockOrderStore) -> Self {
        Self(Arc::new(mock))
    }
}

impl OrderManagement for SharedOrderStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order, OrderManagementError> {
        self.0.create_order(order).await
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderManagementError> {
        self.0.fetch_order(order_id).await
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
        reason: &str,
    ) -> Result<(), OrderManagementError> {
        self.0.update_order_status(order_id, status, reason).await
    }

    async fn update_payment_id(&self, order_id: &OrderId, payment_id: &str) -> Result<(), OrderManagementError> {
        self.0.update_payment_id(order_id, payment_id).await
    }

    async fn fetch_history(&self, order_id: &OrderId) -> Result<Vec<StatusChange>, OrderManagementError> {
        self.0.fetch_history(order_id).await
    }
}
