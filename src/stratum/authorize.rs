use super::*;

#[derive(Debug, PartialEq)]
pub struct Authorize {
    pub username: String,
    pub password: Option<String>,
}

impl Serialize for Authorize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = if self.password.is_some() { 2 } else { 1 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.username)?;
        if let Some(password) = &self.password {
            seq.serialize_element(password)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Authorize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let params: Vec<Value> = Deserialize::deserialize(deserializer)?;

        if params.is_empty() || params.len() > 2 {
            return Err(de::Error::custom(
                "mining.authorize takes one or two params",
            ));
        }

        let mut params = params.into_iter();

        let username = match params.next() {
            Some(Value::String(username)) => username,
            _ => return Err(de::Error::custom("username must be a string")),
        };

        // A null password is treated the same as an omitted one.
        let password = match params.next() {
            None | Some(Value::Null) => None,
            Some(Value::String(password)) => Some(password),
            Some(_) => return Err(de::Error::custom("password must be a string")),
        };

        Ok(Authorize { username, password })
    }
}
