use serde::{Deserialize, Serialize};

pub mod send_email {
    use super::*;

    #[derive(Serialize, Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        #[serde(default)]
        pub email: String,
        #[serde(default)]
        pub subject: String,
        #[serde(default)]
        pub text: String,
    }

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub message: String,
    }
}
