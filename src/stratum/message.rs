use super::*;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Clone)]
#[serde(untagged)]
pub enum Id {
    Null,
    Number(u64),
    String(String),
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
        error: Option<Value>,
    },
    Notification {
        method: String,
        params: Value,
    },
}

/// Stratum servers send notifications with `id: null`, which is technically
/// wrong per JSON-RPC (the field should be absent). Both shapes deserialize
/// as a notification; an `error: null` on a response normalizes to `None` so
/// callers only see a payload when the server actually reported one.
impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        let is_response = value.get("result").is_some() || value.get("error").is_some();

        let is_notification = value.get("method").is_some()
            && (value.get("id") == Some(&Value::Null) || value.get("id").is_none());

        let is_request = value.get("method").is_some() && value.get("id").is_some();

        if is_response {
            let id = value
                .get("id")
                .cloned()
                .map(serde_json::from_value::<Id>)
                .transpose()
                .map_err(de::Error::custom)?
                .ok_or_else(|| de::Error::missing_field("id"))?;

            let result = value.get("result").cloned().filter(|v| !v.is_null());
            let error = value.get("error").cloned().filter(|v| !v.is_null());

            Ok(Message::Response { id, result, error })
        } else if is_notification {
            let method = value
                .get("method")
                .and_then(Value::as_str)
                .ok_or_else(|| de::Error::missing_field("method"))?
                .to_string();

            let params = value
                .get("params")
                .cloned()
                .ok_or_else(|| de::Error::missing_field("params"))?;

            Ok(Message::Notification { method, params })
        } else if is_request {
            #[derive(Deserialize)]
            struct Req {
                id: Id,
                method: String,
                params: Value,
            }

            let r: Req = serde_json::from_value(value).map_err(de::Error::custom)?;

            Ok(Message::Request {
                id: r.id,
                method: r.method,
                params: r.params,
            })
        } else {
            Err(de::Error::custom("unknown message format"))
        }
    }
}
