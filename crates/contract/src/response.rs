use serde::{Deserialize, Serialize};

/// Outcome class of an invocation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Success,
    ClientError,
    Unauthorized,
    /// Commit-time rejection caused by a concurrent write; safe to resubmit.
    Conflict,
    ServerError,
}

impl StatusClass {
    /// Numeric status returned to the hosting runtime.
    pub fn code(&self) -> u16 {
        match self {
            StatusClass::Success => 200,
            StatusClass::ClientError => 400,
            StatusClass::Unauthorized => 401,
            StatusClass::Conflict => 409,
            StatusClass::ServerError => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusClass,
    pub message: String,
    pub payload: Option<Vec<u8>>,
}

impl Response {
    pub fn success() -> Self {
        Self {
            status: StatusClass::Success,
            message: String::new(),
            payload: None,
        }
    }

    pub fn success_with_payload(payload: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
            ..Self::success()
        }
    }

    pub fn error(status: StatusClass, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            payload: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StatusClass::Success
    }

    pub fn is_retryable(&self) -> bool {
        self.status == StatusClass::Conflict
    }

    /// JSON rendering for logs and the local runner.
    ///
    /// A JSON payload is embedded as-is; anything else is rendered as lossy
    /// UTF-8 text.
    pub fn to_json(&self) -> serde_json::Value {
        let payload = match &self.payload {
            Some(bytes) => serde_json::from_slice(bytes).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
            }),
            None => serde_json::Value::Null,
        };
        serde_json::json!({
            "status": self.status,
            "code": self.status.code(),
            "message": self.message,
            "payload": payload,
        })
    }
}
