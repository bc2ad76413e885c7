//! Payment gateway seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{models::CustomerInfo, money::Money};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentRequest {
    pub order_id: Uuid,
    pub amount: Money,
    pub customer: CustomerInfo,
}

/// What the gateway hands back on a captured payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentReceipt {
    pub payment_id: String,
    pub method: String,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentFailure {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    Captured(PaymentReceipt),
    Failed(PaymentFailure),
    /// The customer closed the checkout sheet.
    Cancelled,
}

/// One call per checkout attempt; implementations must not retry internally.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn method(&self) -> &'static str;

    async fn initiate_payment(&self, request: PaymentRequest) -> PaymentOutcome;
}

/// Pay on delivery: always captured, nothing leaves the process.
#[derive(Debug, Clone, Default)]
pub struct CashOnDeliveryGateway;

#[async_trait]
impl PaymentGateway for CashOnDeliveryGateway {
    fn method(&self) -> &'static str {
        "cod"
    }

    async fn initiate_payment(&self, request: PaymentRequest) -> PaymentOutcome {
        let order = request.order_id.simple().to_string();
        tracing::info!(
            order_id = %request.order_id,
            amount = request.amount.paise(),
            "cash on delivery accepted"
        );
        PaymentOutcome::Captured(PaymentReceipt {
            payment_id: format!("COD-{}", &order[..12]),
            method: self.method().to_string(),
            signature: None,
        })
    }
}
