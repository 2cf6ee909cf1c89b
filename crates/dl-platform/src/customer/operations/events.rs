//! Customer Domain Events

use serde::{Deserialize, Serialize};

use crate::customer::entity::Customer;
use crate::impl_domain_event;
use crate::usecase::{EventMetadata, ExecutionContext};

const DOMAIN: &str = "crm";
const AGGREGATE: &str = "customer";

fn metadata(ctx: &ExecutionContext, action: &str, customer_id: &str) -> EventMetadata {
    EventMetadata::for_aggregate(ctx, DOMAIN, AGGREGATE, action, customer_id)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub customer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl_domain_event!(CustomerCreated);

impl CustomerCreated {
    pub fn new(ctx: &ExecutionContext, customer: &Customer) -> Self {
        Self {
            metadata: metadata(ctx, "created", &customer.id),
            customer_id: customer.id.clone(),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdated {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub customer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_email: Option<String>,
}

impl_domain_event!(CustomerUpdated);

impl CustomerUpdated {
    pub fn new(ctx: &ExecutionContext, customer: &Customer, previous_email: Option<String>) -> Self {
        Self {
            metadata: metadata(ctx, "updated", &customer.id),
            customer_id: customer.id.clone(),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
            previous_email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerNoteAdded {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub customer_id: String,
    pub note_id: String,
    pub text: String,
}

impl_domain_event!(CustomerNoteAdded);

impl CustomerNoteAdded {
    pub fn new(ctx: &ExecutionContext, customer_id: &str, note_id: &str, text: &str) -> Self {
        Self {
            metadata: metadata(ctx, "note-added", customer_id),
            customer_id: customer_id.to_string(),
            note_id: note_id.to_string(),
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDeleted {
    #[serde(flatten)]
    pub metadata: EventMetadata,

    pub customer_id: String,
    pub email: String,
}

impl_domain_event!(CustomerDeleted);

impl CustomerDeleted {
    pub fn new(ctx: &ExecutionContext, customer: &Customer) -> Self {
        Self {
            metadata: metadata(ctx, "deleted", &customer.id),
            customer_id: customer.id.clone(),
            email: customer.email.clone(),
        }
    }
}
