//! Best-effort probes over gateway JSON.
//!
//! The gateway schema is a large open union, so nothing here fails: every probe returns an
//! `Option` and callers take whatever they can get.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{order::OrderFields, webhook_event::NewWebhookEvent};

/// Metadata we attach to the gateway order at checkout and get echoed back in `custom_id`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "plan_id")]
    pub plan_id: Option<String>,
}

/// Parses the embedded custom-data JSON string. Anything unparseable yields no fields.
pub fn parse_custom_data(raw: &str) -> Option<CustomData> {
    serde_json::from_str::<CustomData>(raw).ok()
}

/// Non-blank string at a JSON pointer.
pub fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

fn string_at(value: &Value, pointer: &str) -> Option<String> {
    str_at(value, pointer).map(str::to_string)
}

/// First pointer that yields a value.
fn first_str(value: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|p| string_at(value, p))
}

/// Gateway amounts are decimal strings; plain JSON numbers are tolerated.
pub fn decimal_at(value: &Value, pointer: &str) -> Option<BigDecimal> {
    match value.pointer(pointer)? {
        Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

fn first_decimal(value: &Value, pointers: &[&str]) -> Option<BigDecimal> {
    pointers.iter().find_map(|p| decimal_at(value, p))
}

/// Customer name and email from the custom data, falling back to the `payer` object under `base`.
fn customer(value: &Value, custom: Option<&CustomData>, base: &str) -> (Option<String>, Option<String>) {
    let non_blank = |s: &Option<String>| s.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
    let name = custom.and_then(|c| non_blank(&c.name)).or_else(|| payer_name(value, base));
    let email = custom
        .and_then(|c| non_blank(&c.email))
        .or_else(|| string_at(value, &format!("{base}/payer/email_address")));
    (name, email)
}

fn payer_name(value: &Value, base: &str) -> Option<String> {
    let given = str_at(value, &format!("{base}/payer/name/given_name"));
    let surname = str_at(value, &format!("{base}/payer/name/surname"));
    match (given, surname) {
        (Some(g), Some(s)) => Some(format!("{g} {s}")),
        (Some(n), None) | (None, Some(n)) => Some(n.to_string()),
        (None, None) => string_at(value, &format!("{base}/payer/name/full_name")),
    }
}

fn custom_at(value: &Value, pointer: &str) -> Option<CustomData> {
    str_at(value, pointer).and_then(parse_custom_data)
}

/// Fields of an order-approved event. The resource is the gateway order itself.
pub fn approved_fields(envelope: &Value) -> Option<OrderFields> {
    let transaction_id = string_at(envelope, "/resource/id")?;
    let custom = custom_at(envelope, "/resource/purchase_units/0/custom_id");
    let (customer_name, customer_email) = customer(envelope, custom.as_ref(), "/resource");
    Some(OrderFields {
        transaction_id,
        customer_name,
        customer_email,
        amount: decimal_at(envelope, "/resource/purchase_units/0/amount/value"),
        currency: string_at(envelope, "/resource/purchase_units/0/amount/currency_code"),
        description: string_at(envelope, "/resource/purchase_units/0/description"),
        plan_id: custom.and_then(|c| c.plan_id),
    })
}

/// Fields of a payment-completed event.
///
/// A capture carries the order id under `supplementary_data`; a completed order carries its
/// purchase units directly. The supplementary shape is tried first.
pub fn completed_fields(envelope: &Value) -> Option<OrderFields> {
    supplementary_shape(envelope).or_else(|| purchase_units_shape(envelope))
}

fn supplementary_shape(envelope: &Value) -> Option<OrderFields> {
    let transaction_id = string_at(envelope, "/resource/supplementary_data/related_ids/order_id")?;
    let custom = custom_at(envelope, "/resource/custom_id");
    let (customer_name, customer_email) = customer(envelope, custom.as_ref(), "/resource");
    Some(OrderFields {
        transaction_id,
        customer_name,
        customer_email,
        amount: decimal_at(envelope, "/resource/amount/value"),
        currency: string_at(envelope, "/resource/amount/currency_code"),
        description: string_at(envelope, "/resource/description")
            .or_else(|| string_at(envelope, "/resource/soft_descriptor")),
        plan_id: custom.and_then(|c| c.plan_id),
    })
}

fn purchase_units_shape(envelope: &Value) -> Option<OrderFields> {
    let transaction_id = string_at(envelope, "/resource/id")?;
    let unit = "/resource/purchase_units/0";
    let custom = custom_at(envelope, &format!("{unit}/custom_id"));
    let (customer_name, customer_email) = customer(envelope, custom.as_ref(), "/resource");
    Some(OrderFields {
        transaction_id,
        customer_name,
        customer_email,
        amount: first_decimal(envelope, &[
            format!("{unit}/amount/value").as_str(),
            format!("{unit}/payments/captures/0/amount/value").as_str(),
        ]),
        currency: first_str(envelope, &[
            format!("{unit}/amount/currency_code").as_str(),
            format!("{unit}/payments/captures/0/amount/currency_code").as_str(),
        ]),
        description: string_at(envelope, &format!("{unit}/description")),
        plan_id: custom.and_then(|c| c.plan_id),
    })
}

/// Audit record for an event of any type, probing the known payload shapes in priority order.
pub fn audit_record(envelope: &Value, event_id: Option<String>, event_type: &str) -> NewWebhookEvent {
    let transaction_id = first_str(envelope, &[
        "/resource/supplementary_data/related_ids/order_id",
        "/resource/id",
    ]);
    let amount = first_decimal(envelope, &[
        "/resource/amount/value",
        "/resource/purchase_units/0/amount/value",
        "/resource/gross_amount/value",
    ]);
    let currency = first_str(envelope, &[
        "/resource/amount/currency_code",
        "/resource/purchase_units/0/amount/currency_code",
        "/resource/gross_amount/currency_code",
    ]);
    let custom = custom_at(envelope, "/resource/custom_id")
        .or_else(|| custom_at(envelope, "/resource/purchase_units/0/custom_id"));
    let (customer_name, customer_email) = customer(envelope, custom.as_ref(), "/resource");
    NewWebhookEvent {
        event_id,
        event_type: event_type.to_string(),
        external_transaction_id: transaction_id,
        amount,
        currency,
        customer_name,
        customer_email,
        raw_payload: envelope.clone(),
    }
}

/// Audit record for an order-bearing event, reusing the fields already extracted for the order.
pub fn audit_record_for_order(
    envelope: &Value,
    event_id: Option<String>,
    event_type: &str,
    fields: &OrderFields,
) -> NewWebhookEvent {
    NewWebhookEvent {
        event_id,
        event_type: event_type.to_string(),
        external_transaction_id: Some(fields.transaction_id.clone()),
        amount: fields.amount.clone(),
        currency: fields.currency.clone(),
        customer_name: fields.customer_name.clone(),
        customer_email: fields.customer_email.clone(),
        raw_payload: envelope.clone(),
    }
}
