//! Tool Definition
//!
//! Schema of the `create_payment_link` tool as advertised to agent clients,
//! and the response envelope a dispatch result is rendered into.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::provider::PaymentLinkResult;

/// Name of the only tool this server exposes
pub const CREATE_PAYMENT_LINK: &str = "create_payment_link";

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, integer, boolean)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl ParameterSchema {
    fn optional(name: &str, param_type: &str, description: &str) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: false,
            default: None,
            enum_values: None,
        }
    }

    fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Tool definition schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to the agent)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// JSON Schema object for the tool's arguments.
    ///
    /// Extra properties are allowed: unknown keys are forwarded to the provider.
    pub fn input_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for param in &self.parameters {
            let mut prop = json!({
                "type": param.param_type,
                "description": param.description,
            });
            if let Some(default) = &param.default {
                prop["default"] = default.clone();
            }
            if let Some(values) = &param.enum_values {
                prop["enum"] = Value::Array(values.clone());
            }
            properties.insert(param.name.clone(), prop);
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": true,
        })
    }

    /// Tool entry as listed by `tools/list`
    pub fn to_definition(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}

/// Schema for `create_payment_link`
pub fn create_payment_link_schema() -> ToolSchema {
    use ParameterSchema as P;

    let mut parameters = vec![ParameterSchema {
        name: "amount".into(),
        param_type: "number".into(),
        description: "Payment amount, greater than 0 with at most two decimals".into(),
        required: true,
        default: None,
        enum_values: None,
    }];

    parameters.extend([
        P::optional("other_trx_code", "string", "Your unique transaction code for reconciliation"),
        P::optional("full_name", "string", "Full name of the customer"),
        P::optional("gsm_number", "string", "Mobile number of the customer, digits only"),
        P::optional("email", "string", "Email address of the customer"),
        ParameterSchema {
            enum_values: Some(
                ["TL", "TRY", "USD", "EUR", "GBP"]
                    .into_iter()
                    .map(Value::from)
                    .collect(),
            ),
            ..P::optional("currency", "string", "Currency of the payment")
                .with_default(json!("TL"))
        },
        P::optional("installment_number", "integer", "Number of installments")
            .with_default(json!(0)),
        P::optional("is_pool_payment", "integer", "1 for a pool payment").with_default(json!(0)),
        P::optional("is_pre_auth", "integer", "1 for a pre-authorization").with_default(json!(0)),
        P::optional("is_tokenized", "integer", "1 to tokenize the card").with_default(json!(0)),
        P::optional("is_three_d", "integer", "1 to require 3D Secure").with_default(json!(1)),
        P::optional("redirect_url", "string", "URL to redirect to after payment"),
        P::optional("description", "string", "Description of the payment"),
        P::optional("customer_code", "string", "Customer code"),
        P::optional("first_name", "string", "First name of the customer"),
        P::optional("last_name", "string", "Last name of the customer"),
        P::optional("birth_date", "string", "Birth date of the customer"),
        P::optional("customer_gsm_number", "string", "Mobile number of the customer record"),
        P::optional("customer_email", "string", "Email address of the customer record"),
        P::optional("address", "string", "Address of the customer"),
        P::optional("set_installment_by", "integer", "Who chooses the installment count")
            .with_default(json!(1)),
        P::optional("commission_by_dealer", "string", "Commission borne by the dealer")
            .with_default(json!("0")),
        P::optional(
            "is_commission_diff_by_dealer",
            "integer",
            "1 if commission differs by dealer",
        )
        .with_default(json!(0)),
        P::optional("buyer_full_name", "string", "Full name of the buyer"),
        P::optional("buyer_email", "string", "Email address of the buyer"),
        P::optional("buyer_gsm_number", "string", "Mobile number of the buyer"),
        P::optional("buyer_address", "string", "Address of the buyer"),
    ]);

    ToolSchema {
        name: CREATE_PAYMENT_LINK.into(),
        description: "Create a payment link using the configured payment provider. \
            Only `amount` is required. On success the response carries `link_url` to share \
            with the payer; on failure it carries `error.kind` and `error.retriable`. \
            Turkish characters are fine in names and addresses."
            .into(),
        parameters,
    }
}

/// One content block of a tool response
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// Tool response envelope (MCP `CallToolResult`)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub content: Vec<ToolContent>,

    pub structured_content: Value,

    pub is_error: bool,
}

impl From<&PaymentLinkResult> for ToolResponse {
    fn from(result: &PaymentLinkResult) -> Self {
        let structured = serde_json::to_value(result).unwrap_or_else(|_| json!({"success": false}));
        Self {
            content: vec![ToolContent::Text {
                text: structured.to_string(),
            }],
            structured_content: structured,
            is_error: !result.is_success(),
        }
    }
}
