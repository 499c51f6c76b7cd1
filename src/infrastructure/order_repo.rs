use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types::{Jsonb, Nullable, Numeric, Text, Timestamptz};
use log::warn;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{AppliedWrite, ListResult, Order, OrderDraft, OrderStatus, OrderWrite, Reconciled};
use crate::domain::ports::OrderRepository;
use crate::schema::orders;

use super::models::{iso_currency, NewOrderRow, OrderRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

/// A concurrent first insert for the same transaction id makes the insert a no-op; the pass is
/// then replayed against the row the other writer committed.
const INSERT_ATTEMPTS: usize = 2;

/// Status may only move up: a paid row keeps its status whatever the draft says. Customer fields
/// are never blanked and amount/currency keep their first value.
const GUARDED_UPDATE: &str = r#"
UPDATE orders SET
    status              = CASE WHEN status IN ('ACTIVE', 'COMPLETED') THEN status ELSE $2 END,
    customer_name       = COALESCE($3, customer_name),
    customer_email      = COALESCE($4, customer_email),
    amount              = COALESCE(amount, $5),
    currency            = COALESCE(currency, $6),
    plan_description    = $7,
    computed_savings    = $8,
    expiry_date         = $9,
    raw_gateway_payload = $10,
    updated_at          = NOW()
WHERE external_transaction_id = $1
RETURNING *"#;

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn apply_draft(conn: &mut PgConnection, draft: &OrderDraft) -> QueryResult<OrderRow> {
    diesel::sql_query(GUARDED_UPDATE)
        .bind::<Text, _>(draft.external_transaction_id.clone())
        .bind::<Text, _>(draft.status.as_str())
        .bind::<Nullable<Text>, _>(draft.customer_name.clone())
        .bind::<Nullable<Text>, _>(draft.customer_email.clone())
        .bind::<Nullable<Numeric>, _>(draft.amount.clone())
        .bind::<Nullable<Text>, _>(iso_currency(draft.currency.as_deref()))
        .bind::<Text, _>(draft.plan_description.clone())
        .bind::<Nullable<Numeric>, _>(draft.computed_savings.clone())
        .bind::<Nullable<Timestamptz>, _>(draft.expiry_date)
        .bind::<Jsonb, _>(draft.raw_gateway_payload.clone())
        .get_result(conn)
}

impl OrderRepository for DieselOrderRepository {
    fn reconcile(
        &self,
        transaction_id: &str,
        plan: &dyn Fn(Option<&Order>) -> OrderWrite,
    ) -> Result<Reconciled, DomainError> {
        let mut conn = self.pool.get()?;

        for _ in 0..INSERT_ATTEMPTS {
            let outcome = conn.transaction::<_, DomainError, _>(|conn| {
                // 1. Lock the row (if any) so concurrent passes for this id serialize here
                let previous = orders::table
                    .filter(orders::external_transaction_id.eq(transaction_id))
                    .select(OrderRow::as_select())
                    .for_update()
                    .first::<OrderRow>(conn)
                    .optional()?
                    .map(Order::try_from)
                    .transpose()?;

                // 2. Decide and apply
                match (plan(previous.as_ref()), previous) {
                    (OrderWrite::TouchPayload(raw), Some(previous)) => {
                        let row = diesel::update(orders::table.filter(orders::id.eq(previous.id)))
                            .set((orders::raw_gateway_payload.eq(Some(raw)), orders::updated_at.eq(Utc::now())))
                            .returning(OrderRow::as_returning())
                            .get_result::<OrderRow>(conn)?;
                        Ok(Some(Reconciled {
                            previous: Some(previous),
                            current: row.try_into()?,
                            applied: AppliedWrite::PayloadRefreshed,
                        }))
                    },
                    (OrderWrite::TouchPayload(_), None) => {
                        Err(DomainError::Internal(format!("no order {transaction_id} to refresh")))
                    },
                    (OrderWrite::Upsert(draft), Some(previous)) => {
                        let row = apply_draft(conn, &draft)?;
                        Ok(Some(Reconciled {
                            previous: Some(previous),
                            current: row.try_into()?,
                            applied: AppliedWrite::Updated,
                        }))
                    },
                    (OrderWrite::Upsert(draft), None) => {
                        let inserted = diesel::insert_into(orders::table)
                            .values(NewOrderRow::from(&draft))
                            .on_conflict(orders::external_transaction_id)
                            .do_nothing()
                            .returning(OrderRow::as_returning())
                            .get_result::<OrderRow>(conn)
                            .optional()?;
                        match inserted {
                            Some(row) => Ok(Some(Reconciled {
                                previous: None,
                                current: row.try_into()?,
                                applied: AppliedWrite::Inserted,
                            })),
                            None => Ok(None),
                        }
                    },
                }
            })?;

            match outcome {
                Some(reconciled) => return Ok(reconciled),
                None => warn!("Order {transaction_id} was inserted concurrently. Replaying against the stored row."),
            }
        }

        Err(DomainError::Internal(format!("could not settle concurrent writes for order {transaction_id}")))
    }

    fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        orders::table
            .filter(orders::external_transaction_id.eq(transaction_id))
            .select(OrderRow::as_select())
            .first::<OrderRow>(&mut conn)
            .optional()?
            .map(Order::try_from)
            .transpose()
    }

    fn list(&self, page: i64, limit: i64, status: Option<OrderStatus>) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1) * limit;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = match status {
                Some(s) => orders::table.filter(orders::status.eq(s.as_str())).count().get_result(conn)?,
                None => orders::table.count().get_result(conn)?,
            };

            let mut query = orders::table
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .limit(limit)
                .offset(offset)
                .into_boxed();
            if let Some(s) = status {
                query = query.filter(orders::status.eq(s.as_str()));
            }
            let rows: Vec<OrderRow> = query.load(conn)?;

            Ok(ListResult {
                items: rows.into_iter().map(Order::try_from).collect::<Result<_, _>>()?,
                total,
            })
        })
    }

    fn mark_completed(&self, transaction_id: &str) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let updated = diesel::update(
                orders::table
                    .filter(orders::external_transaction_id.eq(transaction_id))
                    .filter(orders::status.eq_any([OrderStatus::Active.as_str(), OrderStatus::Completed.as_str()])),
            )
            .set((orders::status.eq(OrderStatus::Completed.as_str()), orders::updated_at.eq(Utc::now())))
            .returning(OrderRow::as_returning())
            .get_result::<OrderRow>(conn)
            .optional()?;

            if let Some(row) = updated {
                return Order::try_from(row);
            }
            let exists: bool = diesel::select(diesel::dsl::exists(
                orders::table.filter(orders::external_transaction_id.eq(transaction_id)),
            ))
            .get_result(conn)?;
            if exists {
                Err(DomainError::InvalidTransition(format!("order {transaction_id} has not been paid")))
            } else {
                Err(DomainError::NotFound)
            }
        })
    }
}
