use super::*;

/// The error member of a response, transmitted as the positional triple
/// `[code, message, traceback]`. The miner only ever reads these (a share
/// or handshake refusal); it never produces them.
#[derive(Debug, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub error_code: i32,
    pub message: String,
    pub traceback: Option<Value>,
}

impl Serialize for JsonRpcError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (&self.error_code, &self.message, &self.traceback).serialize(serializer)
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "pool error {}: {}", self.error_code, self.message)?;

        if let Some(traceback) = &self.traceback {
            write!(
                f,
                " (traceback: {})",
                serde_json::to_string(traceback).unwrap_or_else(|_| "<invalid traceback>".into())
            )?;
        }

        Ok(())
    }
}
