//! Facturación idempotente de envíos entregados
//!
//! A lo sumo una factura por envío: la unicidad la garantiza la
//! constraint UNIQUE(shipment_id) y el INSERT tolera la carrera con
//! ON CONFLICT DO NOTHING seguido de relectura.

use chrono::{Duration, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::invoice::{tax_for, Invoice, INVOICE_DUE_DAYS};
use crate::models::shipment::Shipment;
use crate::utils::errors::{AppError, AppResult};

pub struct InvoicingService;

impl InvoicingService {
    /// Asegurar que existe la factura del envío, dentro de la
    /// transacción abierta del llamador. Si ya existe se devuelve tal
    /// cual, sin duplicar ni recalcular.
    pub async fn ensure_invoice(conn: &mut PgConnection, shipment: &Shipment) -> AppResult<Invoice> {
        if let Some(existing) = Self::find_by_shipment(conn, shipment.id).await? {
            log::debug!(
                "📄 Factura {} ya emitida para el envío {}",
                existing.invoice_number,
                shipment.reference_number
            );
            return Ok(existing);
        }

        let issued_at = Utc::now();
        let due_at = issued_at + Duration::days(INVOICE_DUE_DAYS);
        let subtotal = shipment.price_minor;
        let tax = tax_for(subtotal);
        let total = subtotal + tax;
        let invoice_number = format!("INV-{}", shipment.reference_number);

        sqlx::query(
            r#"
            INSERT INTO invoices (id, invoice_number, shipment_id, subtotal_minor, tax_minor, total_minor, issued_at, due_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (shipment_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&invoice_number)
        .bind(shipment.id)
        .bind(subtotal)
        .bind(tax)
        .bind(total)
        .bind(issued_at)
        .bind(due_at)
        .execute(&mut *conn)
        .await?;

        let invoice = Self::find_by_shipment(conn, shipment.id)
            .await?
            .ok_or_else(|| {
                AppError::Internal("Invoice missing right after insert".to_string())
            })?;

        log::info!(
            "🧾 Factura {} emitida para el envío {} (total: {})",
            invoice.invoice_number,
            shipment.reference_number,
            invoice.total_minor
        );

        Ok(invoice)
    }

    async fn find_by_shipment(
        conn: &mut PgConnection,
        shipment_id: Uuid,
    ) -> AppResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE shipment_id = $1",
        )
        .bind(shipment_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(invoice)
    }

    /// Consulta fuera de transacción, para el endpoint de lectura
    pub async fn get_for_shipment(pool: &PgPool, shipment_id: Uuid) -> AppResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE shipment_id = $1",
        )
        .bind(shipment_id)
        .fetch_optional(pool)
        .await?;
        Ok(invoice)
    }
}
