//! Modelo de Invoice
//!
//! Una factura por envío entregado, generada a lo sumo una vez
//! (idempotente), con vencimiento a 30 días desde la emisión.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::money::Money;

/// Días de plazo de pago desde la emisión
pub const INVOICE_DUE_DAYS: i64 = 30;

/// Tasa de GST aplicada al subtotal, en puntos básicos (18%)
pub const INVOICE_TAX_BPS: i64 = 1_800;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub shipment_id: Uuid,
    pub subtotal_minor: Money,
    pub tax_minor: Money,
    pub total_minor: Money,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Calcular impuesto en unidades menores sobre un subtotal
pub fn tax_for(subtotal: Money) -> Money {
    Money(subtotal.minor() * INVOICE_TAX_BPS / 10_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_calculation() {
        assert_eq!(tax_for(Money(10_000)), Money(1_800));
        assert_eq!(tax_for(Money(0)), Money(0));
    }
}
