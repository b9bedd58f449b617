use super::*;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Clone)]
#[serde(untagged)]
pub enum Id {
    Null,
    Number(u64),
    String(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Id::Null => write!(f, "null"),
            Id::Number(n) => write!(f, "{n}"),
            Id::String(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Message {
    Request {
        id: Id,
        method: String,
        params: Value,
    },
    Response {
        id: Id,
        result: Option<Value>,
        error: Option<JsonRpcError>,
        #[serde(skip_serializing_if = "Option::is_none", rename = "reject-reason")]
        reject_reason: Option<String>,
    },
    Notification {
        method: String,
        params: Value,
    },
}

fn field<'de, D, T>(object: &serde_json::Map<String, Value>, key: &str) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(object.get(key).cloned().unwrap_or(Value::Null))
        .map_err(de::Error::custom)
}

/// Inbound frames carry no tag, so they are classified by which keys are
/// present. A result, error, or reject-reason key makes the frame a
/// response; otherwise a method with a null (or missing) id is a server
/// notification, and a method with a real id is a server-originated
/// request, which this client only logs. Strict JSON-RPC would omit the id
/// on notifications, but pools write id:null, so both spellings parse.
impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        let Some(object) = value.as_object() else {
            return Err(de::Error::custom("stratum frame must be a JSON object"));
        };

        if ["result", "error", "reject-reason"]
            .iter()
            .any(|key| object.contains_key(*key))
        {
            return Ok(Message::Response {
                id: field::<D, Id>(object, "id")?,
                result: field::<D, Option<Value>>(object, "result")?,
                error: field::<D, Option<JsonRpcError>>(object, "error")?,
                reject_reason: field::<D, Option<String>>(object, "reject-reason")?,
            });
        }

        let Some(method) = object.get("method").and_then(Value::as_str) else {
            return Err(de::Error::custom(
                "frame is neither a response nor carries a method",
            ));
        };

        let params = object
            .get("params")
            .cloned()
            .ok_or_else(|| de::Error::missing_field("params"))?;

        match object.get("id") {
            None | Some(Value::Null) => Ok(Message::Notification {
                method: method.to_string(),
                params,
            }),
            Some(id) => Ok(Message::Request {
                id: serde_json::from_value(id.clone()).map_err(de::Error::custom)?,
                method: method.to_string(),
                params,
            }),
        }
    }
}
