/// Tool registry
///
/// The six WHMCS read operations exposed over MCP, their advertised input
/// schemas and the typed parameter structs their arguments decode into.

use mcp_protocol::ToolDefinition;
use schemars::JsonSchema;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::ToolError;

/// Encoded form fields of one tool call, in declaration order
pub type FormArgs = Vec<(&'static str, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    GetClientDetails,
    GetClients,
    GetInvoices,
    GetOrders,
    GetProducts,
    GetTickets,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::GetClientDetails,
        Tool::GetClients,
        Tool::GetInvoices,
        Tool::GetOrders,
        Tool::GetProducts,
        Tool::GetTickets,
    ];

    /// Name advertised to MCP clients
    pub fn name(self) -> &'static str {
        match self {
            Tool::GetClientDetails => "get_client_details",
            Tool::GetClients => "get_clients",
            Tool::GetInvoices => "get_invoices",
            Tool::GetOrders => "get_orders",
            Tool::GetProducts => "get_products",
            Tool::GetTickets => "get_tickets",
        }
    }

    /// WHMCS API action the tool maps to
    pub fn action(self) -> &'static str {
        match self {
            Tool::GetClientDetails => "GetClientsDetails",
            Tool::GetClients => "GetClients",
            Tool::GetInvoices => "GetInvoices",
            Tool::GetOrders => "GetOrders",
            Tool::GetProducts => "GetProducts",
            Tool::GetTickets => "GetTickets",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Tool::GetClientDetails => "Get details for a specific client",
            Tool::GetClients => "Get a list of clients",
            Tool::GetInvoices => "Get a list of invoices",
            Tool::GetOrders => "Get a list of orders",
            Tool::GetProducts => "Get a list of products",
            Tool::GetTickets => "Get a list of support tickets",
        }
    }

    pub fn input_schema(self) -> Value {
        match self {
            Tool::GetClientDetails => object_schema(
                &[("clientid", string_prop("The client ID"))],
                self.required_fields(),
            ),
            Tool::GetClients => object_schema(
                &[
                    ("limitstart", number_prop("The offset for the returned client data")),
                    ("limitnum", number_prop("The number of records to return")),
                    ("search", string_prop("Search term to filter clients")),
                ],
                self.required_fields(),
            ),
            Tool::GetInvoices => object_schema(
                &[
                    ("limitstart", number_prop("The offset for the returned invoice data")),
                    ("limitnum", number_prop("The number of records to return")),
                    ("userid", string_prop("Find invoices for a specific client ID")),
                    ("status", string_prop("Find invoices for a specific status")),
                ],
                self.required_fields(),
            ),
            Tool::GetOrders => object_schema(
                &[
                    ("limitstart", number_prop("The offset for the returned order data")),
                    ("limitnum", number_prop("The number of records to return")),
                    ("userid", string_prop("Find orders for a specific client ID")),
                    ("status", string_prop("Find orders for a specific status")),
                ],
                self.required_fields(),
            ),
            Tool::GetProducts => object_schema(
                &[
                    ("pid", string_prop("Obtain a specific product ID")),
                    ("gid", string_prop("Retrieve products in a specific group ID")),
                ],
                self.required_fields(),
            ),
            Tool::GetTickets => object_schema(
                &[
                    ("limitstart", number_prop("The offset for the returned ticket data")),
                    ("limitnum", number_prop("The number of records to return")),
                    ("clientid", string_prop("Find tickets for a specific client ID")),
                    ("status", string_prop("Find tickets for a specific status")),
                ],
                self.required_fields(),
            ),
        }
    }

    /// Required argument names, read from the parameter type's derived schema
    pub fn required_fields(self) -> Vec<String> {
        match self {
            Tool::GetClientDetails => required_of::<ClientDetailsParams>(),
            Tool::GetClients => required_of::<ClientListParams>(),
            Tool::GetInvoices | Tool::GetOrders => required_of::<UserListParams>(),
            Tool::GetProducts => required_of::<ProductListParams>(),
            Tool::GetTickets => required_of::<TicketListParams>(),
        }
    }

    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }

    /// Decode a raw argument bundle into this tool's parameters and encode them
    /// as WHMCS form fields
    ///
    /// `null` counts as an empty object. Keys the tool does not declare are ignored.
    pub fn encode_arguments(self, arguments: Value) -> Result<FormArgs, ToolError> {
        match self {
            Tool::GetClientDetails => decode::<ClientDetailsParams>(self, arguments),
            Tool::GetClients => decode::<ClientListParams>(self, arguments),
            Tool::GetInvoices | Tool::GetOrders => decode::<UserListParams>(self, arguments),
            Tool::GetProducts => decode::<ProductListParams>(self, arguments),
            Tool::GetTickets => decode::<TicketListParams>(self, arguments),
        }
    }
}

/// All tool descriptors, in registry order
pub fn list_tools() -> Vec<ToolDefinition> {
    Tool::ALL.into_iter().map(Tool::definition).collect()
}

fn required_of<P: JsonSchema>() -> Vec<String> {
    schemars::schema_for!(P)
        .schema
        .object
        .map(|object| object.required.into_iter().collect())
        .unwrap_or_default()
}

fn object_schema(properties: &[(&str, Value)], required: Vec<String>) -> Value {
    let properties: Map<String, Value> = properties
        .iter()
        .map(|(name, schema)| (name.to_string(), schema.clone()))
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn string_prop(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn number_prop(description: &str) -> Value {
    json!({ "type": "number", "description": description })
}

/// Typed arguments of one tool
pub trait ToolParams: DeserializeOwned + JsonSchema {
    /// Checks serde cannot express
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    fn into_form(self) -> FormArgs;
}

fn decode<P: ToolParams>(tool: Tool, arguments: Value) -> Result<FormArgs, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        Value::Object(map) => Value::Object(map),
        other => {
            return Err(ToolError::invalid_arguments(
                tool.name(),
                format!("expected a JSON object, got {}", json_type(&other)),
            ))
        }
    };

    let params: P = serde_json::from_value(arguments)
        .map_err(|e| ToolError::invalid_arguments(tool.name(), e))?;
    params
        .validate()
        .map_err(|e| ToolError::invalid_arguments(tool.name(), e))?;

    Ok(params.into_form())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Appends `key=value` when the value is present
fn push_opt<T: ToString>(form: &mut FormArgs, key: &'static str, value: Option<T>) {
    if let Some(value) = value {
        form.push((key, value.to_string()));
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClientDetailsParams {
    /// The client ID
    #[serde(deserialize_with = "id_string")]
    pub clientid: String,
}

impl ToolParams for ClientDetailsParams {
    fn validate(&self) -> Result<(), String> {
        if self.clientid.trim().is_empty() {
            return Err("clientid must not be empty".to_string());
        }
        Ok(())
    }

    fn into_form(self) -> FormArgs {
        vec![("clientid", self.clientid)]
    }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ClientListParams {
    /// Offset of the first record
    #[serde(default, deserialize_with = "opt_count")]
    pub limitstart: Option<u32>,
    /// Number of records to return
    #[serde(default, deserialize_with = "opt_count")]
    pub limitnum: Option<u32>,
    #[serde(default)]
    pub search: Option<String>,
}

impl ToolParams for ClientListParams {
    fn into_form(self) -> FormArgs {
        let mut form = FormArgs::new();
        push_opt(&mut form, "limitstart", self.limitstart);
        push_opt(&mut form, "limitnum", self.limitnum);
        push_opt(&mut form, "search", self.search);
        form
    }
}

/// Shared by invoices and orders, which filter the same way
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct UserListParams {
    #[serde(default, deserialize_with = "opt_count")]
    pub limitstart: Option<u32>,
    #[serde(default, deserialize_with = "opt_count")]
    pub limitnum: Option<u32>,
    /// Client ID to filter by
    #[serde(default, deserialize_with = "opt_id_string")]
    pub userid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ToolParams for UserListParams {
    fn into_form(self) -> FormArgs {
        let mut form = FormArgs::new();
        push_opt(&mut form, "limitstart", self.limitstart);
        push_opt(&mut form, "limitnum", self.limitnum);
        push_opt(&mut form, "userid", self.userid);
        push_opt(&mut form, "status", self.status);
        form
    }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ProductListParams {
    /// Product ID
    #[serde(default, deserialize_with = "opt_id_string")]
    pub pid: Option<String>,
    /// Product group ID
    #[serde(default, deserialize_with = "opt_id_string")]
    pub gid: Option<String>,
}

impl ToolParams for ProductListParams {
    fn into_form(self) -> FormArgs {
        let mut form = FormArgs::new();
        push_opt(&mut form, "pid", self.pid);
        push_opt(&mut form, "gid", self.gid);
        form
    }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct TicketListParams {
    #[serde(default, deserialize_with = "opt_count")]
    pub limitstart: Option<u32>,
    #[serde(default, deserialize_with = "opt_count")]
    pub limitnum: Option<u32>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub clientid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ToolParams for TicketListParams {
    fn into_form(self) -> FormArgs {
        let mut form = FormArgs::new();
        push_opt(&mut form, "limitstart", self.limitstart);
        push_opt(&mut form, "limitnum", self.limitnum);
        push_opt(&mut form, "clientid", self.clientid);
        push_opt(&mut form, "status", self.status);
        form
    }
}

// IDs are strings on the wire but clients routinely send them as integers.
fn id_from_value<E: de::Error>(value: Value) -> Result<String, E> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) if n.is_u64() || n.is_i64() => Ok(n.to_string()),
        other => Err(E::custom(format!(
            "expected a string or integer ID, got {}",
            json_type(&other)
        ))),
    }
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    id_from_value(Value::deserialize(deserializer)?)
}

fn opt_id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => id_from_value(value).map(Some),
    }
}

// Paging values: non-negative whole numbers, given as JSON numbers (`10` or
// `10.0`) or numeric strings.
fn opt_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };

    let parsed = match &value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .or_else(|| whole_u32(n.as_f64()?)),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };

    parsed.map(Some).ok_or_else(|| {
        <D::Error as de::Error>::custom(format!("expected a non-negative integer, got {}", value))
    })
}

fn whole_u32(f: f64) -> Option<u32> {
    (f.is_finite() && f.fract() == 0.0 && f >= 0.0 && f <= u32::MAX as f64).then(|| f as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn keys(value: &Value) -> BTreeSet<String> {
        value
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn required(schema: &Value) -> BTreeSet<String> {
        schema["required"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default()
    }

    fn prop_types(tool: Tool) -> Vec<(String, String, bool)> {
        let schema = tool.input_schema();
        let required = required(&schema);
        schema["properties"]
            .as_object()
            .unwrap()
            .iter()
            .map(|(name, prop)| {
                (
                    name.clone(),
                    prop["type"].as_str().unwrap().to_string(),
                    required.contains(name),
                )
            })
            .collect()
    }

    fn expect(pairs: &[(&str, &str, bool)]) -> Vec<(String, String, bool)> {
        let mut v: Vec<_> = pairs
            .iter()
            .map(|(n, t, r)| (n.to_string(), t.to_string(), *r))
            .collect();
        v.sort();
        v
    }

    #[test]
    fn test_registry_lists_each_tool_once() {
        let tools = list_tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "get_client_details",
                "get_clients",
                "get_invoices",
                "get_orders",
                "get_products",
                "get_tickets",
            ]
        );
        assert!(tools.iter().all(|t| !t.description.is_empty()));
        assert!(tools.iter().all(|t| t.input_schema["type"] == "object"));
    }

    #[test]
    fn test_registry_schemas() {
        let mut cases = vec![
            (Tool::GetClientDetails, expect(&[("clientid", "string", true)])),
            (
                Tool::GetClients,
                expect(&[
                    ("limitstart", "number", false),
                    ("limitnum", "number", false),
                    ("search", "string", false),
                ]),
            ),
            (Tool::GetProducts, expect(&[("pid", "string", false), ("gid", "string", false)])),
            (
                Tool::GetTickets,
                expect(&[
                    ("limitstart", "number", false),
                    ("limitnum", "number", false),
                    ("clientid", "string", false),
                    ("status", "string", false),
                ]),
            ),
        ];
        for tool in [Tool::GetInvoices, Tool::GetOrders] {
            cases.push((
                tool,
                expect(&[
                    ("limitstart", "number", false),
                    ("limitnum", "number", false),
                    ("userid", "string", false),
                    ("status", "string", false),
                ]),
            ));
        }

        for (tool, expected) in cases {
            let mut actual = prop_types(tool);
            actual.sort();
            assert_eq!(actual, expected, "schema mismatch for {}", tool.name());
        }
    }

    fn assert_matches_params<P: ToolParams>(tool: Tool) {
        let derived = serde_json::to_value(schemars::schema_for!(P)).unwrap();
        let declared = tool.input_schema();

        assert_eq!(
            keys(&derived["properties"]),
            keys(&declared["properties"]),
            "properties of {}",
            tool.name()
        );
        assert_eq!(required(&derived), required(&declared), "required of {}", tool.name());
    }

    #[test]
    fn test_declared_schemas_agree_with_param_types() {
        assert_matches_params::<ClientDetailsParams>(Tool::GetClientDetails);
        assert_matches_params::<ClientListParams>(Tool::GetClients);
        assert_matches_params::<UserListParams>(Tool::GetInvoices);
        assert_matches_params::<UserListParams>(Tool::GetOrders);
        assert_matches_params::<ProductListParams>(Tool::GetProducts);
        assert_matches_params::<TicketListParams>(Tool::GetTickets);
    }

    #[test]
    fn test_required_fields_follow_param_types() {
        assert_eq!(Tool::GetClientDetails.required_fields(), vec!["clientid".to_string()]);
        for tool in Tool::ALL.into_iter().filter(|t| *t != Tool::GetClientDetails) {
            assert!(tool.required_fields().is_empty(), "{} has required fields", tool.name());
        }
    }

    #[test]
    fn test_actions_map_one_to_one() {
        let actions: BTreeSet<&str> = Tool::ALL.iter().map(|t| t.action()).collect();
        assert_eq!(actions.len(), Tool::ALL.len());
        assert_eq!(Tool::GetClientDetails.action(), "GetClientsDetails");
        assert_eq!(Tool::from_name("get_tickets"), Some(Tool::GetTickets));
        assert_eq!(Tool::from_name("GetTickets"), None);
        assert_eq!(Tool::from_name("delete_everything"), None);
    }

    #[test]
    fn test_client_details_requires_clientid() {
        let err = Tool::GetClientDetails.encode_arguments(json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
        assert!(err.to_string().contains("clientid"));

        let err = Tool::GetClientDetails
            .encode_arguments(json!({"clientid": "  "}))
            .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_integer_ids_are_accepted() {
        let form = Tool::GetClientDetails
            .encode_arguments(json!({"clientid": 42}))
            .unwrap();
        assert_eq!(form, vec![("clientid", "42".to_string())]);

        let form = Tool::GetProducts.encode_arguments(json!({"gid": 3})).unwrap();
        assert_eq!(form, vec![("gid", "3".to_string())]);
    }

    #[test]
    fn test_empty_arguments_encode_nothing() {
        for tool in Tool::ALL.into_iter().filter(|t| *t != Tool::GetClientDetails) {
            assert!(tool.encode_arguments(json!({})).unwrap().is_empty());
            assert!(tool.encode_arguments(Value::Null).unwrap().is_empty());
        }
    }

    #[test]
    fn test_paging_values() {
        let form = Tool::GetInvoices
            .encode_arguments(json!({"limitstart": 25, "limitnum": "10", "status": "Unpaid"}))
            .unwrap();
        assert_eq!(
            form,
            vec![
                ("limitstart", "25".to_string()),
                ("limitnum", "10".to_string()),
                ("status", "Unpaid".to_string()),
            ]
        );

        let form = Tool::GetClients
            .encode_arguments(json!({"limitstart": 0.0, "limitnum": 10.0}))
            .unwrap();
        assert_eq!(
            form,
            vec![("limitstart", "0".to_string()), ("limitnum", "10".to_string())]
        );

        // zero is forwarded; WHMCS decides what it means
        let form = Tool::GetTickets.encode_arguments(json!({"limitnum": 0})).unwrap();
        assert_eq!(form, vec![("limitnum", "0".to_string())]);

        for bad in [
            json!({"limitstart": -1}),
            json!({"limitstart": -1.0}),
            json!({"limitnum": 2.5}),
            json!({"limitnum": 1e12}),
            json!({"limitnum": true}),
        ] {
            let err = Tool::GetOrders.encode_arguments(bad.clone()).unwrap_err();
            assert!(
                matches!(err, ToolError::InvalidArguments { .. }),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_undeclared_keys_are_dropped() {
        let form = Tool::GetClients
            .encode_arguments(json!({"search": "acme", "secret": "override", "action": "DeleteClient"}))
            .unwrap();
        assert_eq!(form, vec![("search", "acme".to_string())]);
    }

    #[test]
    fn test_non_object_arguments_are_rejected() {
        let err = Tool::GetClients.encode_arguments(json!(["x"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid arguments for get_clients: expected a JSON object, got an array"
        );
    }
}
