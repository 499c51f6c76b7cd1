use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::WebhookEventLog;
use crate::domain::webhook_event::{NewWebhookEvent, WebhookEvent};
use crate::schema::webhook_events;

use super::models::{NewWebhookEventRow, WebhookEventRow};

/// Append-only audit log of every verified delivery. Redeliveries get their own row.
pub struct DieselWebhookEventLog {
    pool: DbPool,
}

impl DieselWebhookEventLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl WebhookEventLog for DieselWebhookEventLog {
    fn append(&self, event: NewWebhookEvent) -> Result<WebhookEvent, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::insert_into(webhook_events::table)
            .values(NewWebhookEventRow::from(event))
            .returning(WebhookEventRow::as_returning())
            .get_result::<WebhookEventRow>(&mut conn)?;
        Ok(row.into())
    }
}
