use serde::{Deserialize, Serialize};

pub const STATUS_OK: &str = "OK";
pub const STATUS_ERROR: &str = "ERROR";
pub const TAG_PAY_REQUEST: &str = "payRequest";

/// Discovery response for a Lightning Address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LnurlPayResponse1 {
    pub status: String,
    pub callback: String,
    pub min_sendable: i64,
    pub max_sendable: i64,
    pub metadata: String,
    pub tag: String,
}

/// Invoice response returned from the callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LnurlPayResponse2 {
    pub status: String,
    pub pr: String,
    pub routes: Vec<Vec<RouteInfo>>,
    pub success_action: Option<SuccessAction>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disposable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    pub node_id: String,
    pub channel_update: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessAction {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SuccessAction {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            tag: "message".to_string(),
            message: Some(message.into()),
            description: None,
            url: None,
        }
    }
}

/// Protocol level error. Always sent with HTTP 200.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LnurlErrorResponse {
    pub status: String,
    pub reason: String,
}

impl LnurlErrorResponse {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            reason: reason.into(),
        }
    }
}

/// Whatever a single LNURL-pay request produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LnurlPayOutcome {
    Discovery(LnurlPayResponse1),
    Invoice(LnurlPayResponse2),
    Error(LnurlErrorResponse),
}
