//! Request bodies for create/update calls, validated before submission

use super::{DealStage, EntityId, SalesEntry, TaskStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Sign-in form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    /// Login email
    #[validate(email(message = "Enter a valid email"))]
    pub email: String,
    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Create/update body for a deal
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DealInput {
    /// Deal title
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    /// Customer company
    #[validate(length(min = 1, message = "Company is required"))]
    pub company: String,
    /// Expected value
    #[validate(range(min = 0.0, message = "Value cannot be negative"))]
    pub value: f64,
    /// Stage
    pub stage: DealStage,
    /// Product
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    /// Expected close date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_close_date: Option<NaiveDate>,
}

/// Admin page user form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    /// Display name
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    /// Login email
    #[validate(email(message = "Enter a valid email"))]
    pub email: String,
    /// Role
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
    /// New password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// Repeated password; never sent to the server
    #[serde(skip_serializing)]
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

/// Create/update body for a master-data row
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MasterRecordInput {
    /// Display name
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    /// Short code
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20, message = "Code is too long"))]
    pub code: Option<String>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether selectable
    pub is_active: bool,
}

/// Create/update body for a task
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    /// Title
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    /// Details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Due date
    #[validate(required(message = "Due date is required"))]
    pub due_date: Option<NaiveDate>,
    /// Priority
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Progress
    pub status: TaskStatus,
    /// Related deal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<EntityId>,
}

/// Create/update body for a ticket
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TicketInput {
    /// Subject line
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,
    /// Customer name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    /// Status label
    pub status: String,
    /// Priority label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

/// The "Sales Order" form that gates a move to Closed Won.
///
/// Submitted as the body of the sales entry tied to the deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_delivery_after_order"))]
pub struct SalesOrderForm {
    /// Deal this order fulfils
    pub deal_id: EntityId,
    /// Customer name
    #[validate(length(min = 1, message = "Customer is required"))]
    pub customer: String,
    /// Product sold
    #[validate(length(min = 1, message = "Product is required"))]
    pub product: String,
    /// Units
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u64,
    /// Order amount
    #[validate(range(exclusive_min = 0.0, message = "Amount must be greater than zero"))]
    pub amount: f64,
    /// Purchase order number
    #[validate(length(min = 1, message = "PO number is required"))]
    pub po_number: String,
    /// Order date
    #[validate(required(message = "Order date is required"))]
    pub order_date: Option<NaiveDate>,
    /// Promised delivery date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<NaiveDate>,
    /// Payment terms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
}

fn validate_delivery_after_order(form: &SalesOrderForm) -> Result<(), ValidationError> {
    match (form.order_date, form.delivery_date) {
        (Some(order), Some(delivery)) if delivery < order => {
            let mut error = ValidationError::new("delivery_before_order");
            error.message = Some("Delivery date cannot be before the order date".into());
            Err(error)
        }
        _ => Ok(()),
    }
}

impl SalesOrderForm {
    /// Pre-fill from an existing sales entry so an edit does not start blank
    #[must_use]
    pub fn from_entry(deal_id: EntityId, entry: &SalesEntry) -> Self {
        Self {
            deal_id,
            customer: entry.customer.clone(),
            product: entry.product.clone(),
            quantity: entry.quantity,
            amount: entry.amount,
            po_number: entry.po_number.clone().unwrap_or_default(),
            order_date: entry.order_date,
            delivery_date: entry.delivery_date,
            payment_terms: entry.payment_terms.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;
    use pretty_assertions::assert_eq;

    fn user_form(password: &str, confirm: &str) -> UserForm {
        UserForm {
            name: "Meera".to_string(),
            email: "meera@example.com".to_string(),
            role: "sales".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    fn order_form() -> SalesOrderForm {
        SalesOrderForm {
            deal_id: EntityId::from("d1"),
            customer: "Acme".to_string(),
            product: "Router".to_string(),
            quantity: 2,
            amount: 5000.0,
            po_number: "PO-77".to_string(),
            order_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            delivery_date: NaiveDate::from_ymd_opt(2024, 5, 20),
            payment_terms: None,
        }
    }

    #[test]
    fn test_user_form_valid() {
        assert!(user_form("s3cretpass", "s3cretpass").validate().is_ok());
    }

    #[test]
    fn test_user_form_short_password() {
        let err: Error = user_form("short", "short").validate().unwrap_err().into();
        assert_eq!(
            err.to_string(),
            "Validation error: password - Password must be at least 8 characters"
        );
    }

    #[test]
    fn test_user_form_mismatch() {
        let err: Error = user_form("s3cretpass", "s3cretpasz").validate().unwrap_err().into();
        assert_eq!(
            err.to_string(),
            "Validation error: confirm_password - Passwords do not match"
        );
    }

    #[test]
    fn test_user_form_never_serializes_confirmation() {
        let json = serde_json::to_value(user_form("s3cretpass", "s3cretpass")).unwrap();
        assert!(json.get("confirmPassword").is_none());
        assert_eq!(json["password"], "s3cretpass");
    }

    #[test]
    fn test_sales_order_requires_fields() {
        let mut form = order_form();
        form.po_number.clear();
        form.quantity = 0;

        let errors = form.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("po_number"));
        assert!(fields.contains_key("quantity"));
    }

    #[test]
    fn test_sales_order_delivery_before_order() {
        let mut form = order_form();
        form.delivery_date = NaiveDate::from_ymd_opt(2024, 4, 1);

        assert!(form.validate().is_err());
        assert!(order_form().validate().is_ok());
    }

    #[test]
    fn test_task_input_requires_due_date() {
        let input = TaskInput {
            title: "Follow up".to_string(),
            description: None,
            due_date: None,
            priority: None,
            status: TaskStatus::Pending,
            deal_id: None,
        };
        let err: Error = input.validate().unwrap_err().into();
        assert_eq!(err.to_string(), "Validation error: due_date - Due date is required");
    }
}
