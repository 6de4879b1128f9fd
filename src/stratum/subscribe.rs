use super::*;

/// `mining.subscribe` parameters: user agent, previous session id (null on a
/// fresh connection), and the server's own host and port.
#[derive(Debug, PartialEq)]
pub struct Subscribe {
    pub user_agent: String,
    pub session_id: Option<String>,
    pub host: String,
    pub port: u16,
}

impl Serialize for Subscribe {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(4))?;
        seq.serialize_element(&self.user_agent)?;
        seq.serialize_element(&self.session_id)?;
        seq.serialize_element(&self.host)?;
        seq.serialize_element(&self.port)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Subscribe {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (user_agent, session_id, host, port) =
            <(String, Option<String>, String, u16)>::deserialize(deserializer)?;

        Ok(Subscribe {
            user_agent,
            session_id,
            host,
            port,
        })
    }
}

/// Subscribe result: session id followed by the hex session nonce prefix all
/// workers share for the lifetime of the connection.
#[derive(Debug, PartialEq, Clone)]
pub struct SubscribeResult {
    pub session_id: Option<String>,
    pub nonce1: NoncePart,
}

impl Serialize for SubscribeResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.session_id)?;
        seq.serialize_element(&self.nonce1)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for SubscribeResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (session_id, nonce1) = <(Option<String>, NoncePart)>::deserialize(deserializer)?;

        Ok(SubscribeResult { session_id, nonce1 })
    }
}
