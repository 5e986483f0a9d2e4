use serde::Deserialize;

/// Body of `POST /scp`.
#[derive(Debug, Default, Deserialize)]
pub struct ScpRequest {
    pub input: Option<String>,
    pub setting: Option<String>,
}
