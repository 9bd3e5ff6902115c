//! PostgreSQL implementation of PaymentLedger.
//!
//! Mutations lock the row with `SELECT ... FOR UPDATE`, apply the
//! aggregate's rule in memory and write the result back in the same
//! transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::billing::{BilledEntity, SubscriptionType};
use crate::domain::foundation::{
    DomainError, ErrorCode, Money, PaymentId, PlanId, Timestamp, TransactionId,
};
use crate::domain::payment::{
    AcquirerResponse, CardDetails, GatewayRefs, Payment, PaymentAttempt, PaymentMethod,
    PaymentStatus, PaymentUpdate, PixDetails, StatusChange,
};
use crate::ports::{payment_not_found, PaymentLedger};

const PAYMENT_COLUMNS: &str = r#"
    id, transaction_id, subscription_type, customer_id, plan_id, amount_cents, currency,
    payment_method, status, charge_id, gateway_customer_id, pix_qr_code, pix_qr_code_url,
    pix_expires_at, card_brand, card_last_four, card_holder_name, card_id,
    acquirer_response_code, acquirer_message, fee_cents, gateway_metadata,
    created_at, updated_at, paid_at
"#;

const TRANSACTION_ID_INDEX: &str = "payments_transaction_id_key";

pub struct PostgresPaymentLedger {
    pool: PgPool,
}

impl PostgresPaymentLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn modify<F>(&self, id: PaymentId, apply: F) -> Result<PaymentUpdate, DomainError>
    where
        F: FnOnce(&mut Payment) -> Result<StatusChange, DomainError> + Send,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE id = $1 FOR UPDATE",
            PAYMENT_COLUMNS
        ))
        .bind(id.as_i64())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to lock payment", e))?
        .ok_or_else(|| payment_not_found(id))?;

        let mut payment = Payment::try_from(row)?;
        let change = apply(&mut payment)?;
        write_payment(&mut tx, &payment).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit payment update", e))?;

        Ok(PaymentUpdate { payment, change })
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    transaction_id: String,
    subscription_type: String,
    customer_id: i64,
    plan_id: i64,
    amount_cents: i64,
    currency: String,
    payment_method: String,
    status: String,
    charge_id: Option<String>,
    gateway_customer_id: Option<String>,
    pix_qr_code: Option<String>,
    pix_qr_code_url: Option<String>,
    pix_expires_at: Option<DateTime<Utc>>,
    card_brand: Option<String>,
    card_last_four: Option<String>,
    card_holder_name: Option<String>,
    card_id: Option<String>,
    acquirer_response_code: Option<String>,
    acquirer_message: Option<String>,
    fee_cents: Option<i64>,
    gateway_metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let kind: SubscriptionType = row.subscription_type.parse().map_err(corrupt)?;
        Ok(Payment {
            id: PaymentId::from_db(row.id),
            transaction_id: if row.transaction_id.is_empty() {
                TransactionId::unassigned()
            } else {
                TransactionId::new(row.transaction_id).map_err(corrupt)?
            },
            billed_entity: BilledEntity::from_parts(kind, row.customer_id).map_err(corrupt)?,
            plan_id: PlanId::from_db(row.plan_id),
            amount: Money::new(row.amount_cents, row.currency).map_err(corrupt)?,
            method: row.payment_method.parse::<PaymentMethod>().map_err(corrupt)?,
            status: row.status.parse::<PaymentStatus>().map_err(corrupt)?,
            charge_id: row.charge_id,
            gateway_customer_id: row.gateway_customer_id,
            pix: PixDetails {
                qr_code: row.pix_qr_code,
                qr_code_url: row.pix_qr_code_url,
                expires_at: row.pix_expires_at.map(Timestamp::from_datetime),
            },
            card: CardDetails {
                brand: row.card_brand,
                last_four: row.card_last_four,
                holder_name: row.card_holder_name,
                card_id: row.card_id,
            },
            acquirer: AcquirerResponse {
                code: row.acquirer_response_code,
                message: row.acquirer_message,
            },
            fee_cents: row.fee_cents,
            metadata: row.gateway_metadata,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            paid_at: row.paid_at.map(Timestamp::from_datetime),
        })
    }
}

fn corrupt(err: impl std::fmt::Display) -> DomainError {
    DomainError::database(format!("Invalid payment row: {}", err))
}

fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint() == Some(TRANSACTION_ID_INDEX) {
            return DomainError::new(
                ErrorCode::TransactionIdAlreadySet,
                "Transaction id already recorded on another payment",
            );
        }
    }
    DomainError::database(format!("{}: {}", context, err))
}

fn datetime(ts: &Option<Timestamp>) -> Option<DateTime<Utc>> {
    ts.map(|t| *t.as_datetime())
}

async fn write_payment(
    tx: &mut Transaction<'_, Postgres>,
    payment: &Payment,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        UPDATE payments SET
            transaction_id = $2,
            status = $3,
            charge_id = $4,
            gateway_customer_id = $5,
            pix_qr_code = $6,
            pix_qr_code_url = $7,
            pix_expires_at = $8,
            card_brand = $9,
            card_last_four = $10,
            card_holder_name = $11,
            card_id = $12,
            acquirer_response_code = $13,
            acquirer_message = $14,
            fee_cents = $15,
            gateway_metadata = $16,
            updated_at = $17,
            paid_at = $18
        WHERE id = $1
        "#,
    )
    .bind(payment.id.as_i64())
    .bind(payment.transaction_id.as_str())
    .bind(payment.status.as_str())
    .bind(&payment.charge_id)
    .bind(&payment.gateway_customer_id)
    .bind(&payment.pix.qr_code)
    .bind(&payment.pix.qr_code_url)
    .bind(datetime(&payment.pix.expires_at))
    .bind(&payment.card.brand)
    .bind(&payment.card.last_four)
    .bind(&payment.card.holder_name)
    .bind(&payment.card.card_id)
    .bind(&payment.acquirer.code)
    .bind(&payment.acquirer.message)
    .bind(payment.fee_cents)
    .bind(&payment.metadata)
    .bind(payment.updated_at.as_datetime())
    .bind(datetime(&payment.paid_at))
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to update payment", e))?;

    Ok(())
}

#[async_trait]
impl PaymentLedger for PostgresPaymentLedger {
    async fn create(&self, attempt: PaymentAttempt) -> Result<Payment, DomainError> {
        let now = Timestamp::now();
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            INSERT INTO payments (
                transaction_id, subscription_type, customer_id, plan_id, amount_cents,
                currency, payment_method, status, created_at, updated_at
            ) VALUES ('', $1, $2, $3, $4, $5, $6, 'pending', $7, $7)
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(attempt.billed_entity.kind().as_str())
        .bind(attempt.billed_entity.raw_id())
        .bind(attempt.plan_id.as_i64())
        .bind(attempt.amount.cents())
        .bind(attempt.amount.currency())
        .bind(attempt.method.as_str())
        .bind(now.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create payment", e))?;

        Payment::try_from(row)
    }

    async fn attach_gateway_refs(
        &self,
        id: PaymentId,
        refs: GatewayRefs,
    ) -> Result<PaymentUpdate, DomainError> {
        self.modify(id, move |payment| {
            payment.attach_gateway_refs(refs, Timestamp::now())
        })
        .await
    }

    async fn set_status(
        &self,
        id: PaymentId,
        status: PaymentStatus,
    ) -> Result<PaymentUpdate, DomainError> {
        self.modify(id, move |payment| Ok(payment.settle(status, Timestamp::now())))
            .await
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, DomainError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch payment", e))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Payment>, DomainError> {
        if transaction_id.is_unassigned() {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE transaction_id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(transaction_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch payment by transaction id", e))?;

        row.map(Payment::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> PaymentRow {
        let now = Utc::now();
        PaymentRow {
            id: 3,
            transaction_id: String::new(),
            subscription_type: "company".into(),
            customer_id: 12,
            plan_id: 1,
            amount_cents: 9990,
            currency: "BRL".into(),
            payment_method: "pix".into(),
            status: "pending".into(),
            charge_id: None,
            gateway_customer_id: None,
            pix_qr_code: Some("000201".into()),
            pix_qr_code_url: None,
            pix_expires_at: None,
            card_brand: None,
            card_last_four: None,
            card_holder_name: None,
            card_id: None,
            acquirer_response_code: None,
            acquirer_message: None,
            fee_cents: None,
            gateway_metadata: None,
            created_at: now,
            updated_at: now,
            paid_at: None,
        }
    }

    #[test]
    fn row_with_empty_transaction_id_is_unassigned() {
        let payment = Payment::try_from(row()).unwrap();
        assert!(payment.transaction_id.is_unassigned());
        assert_eq!(payment.pix.qr_code.as_deref(), Some("000201"));
    }

    #[test]
    fn subscription_type_selects_entity_kind() {
        let payment = Payment::try_from(row()).unwrap();
        assert_eq!(payment.billed_entity.company_id().map(|id| id.as_i64()), Some(12));
    }

    #[test]
    fn unknown_status_is_reported_as_database_error() {
        let mut bad = row();
        bad.status = "paid".into();
        let err = Payment::try_from(bad).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
