/// The credentials a client presents to the API.
///
/// Sessions are passed explicitly to each [`ApiClient`](super::ApiClient)
/// rather than read from shared storage, so logging out is a matter of
/// dropping the client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}
