use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Fixed name the worker reads its configuration from at startup.
pub const WORKER_SECRET_NAME: &str = "/cdk-7layer-constructs/twitter-config";

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

/// Everything the streaming worker needs: API credentials, stream filters
/// and the delivery stream to forward records to. Empty filters mean "no filter".
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct WorkerSecret {
    pub twitter: TwitterCredentials,
    pub topics: Vec<String>,
    pub languages: Vec<String>,
    pub kinesis_delivery: String,
}

impl WorkerSecret {
    pub fn assemble(
        twitter: TwitterCredentials,
        topics: Vec<String>,
        languages: Vec<String>,
        delivery_stream: impl Into<String>,
    ) -> Self {
        Self {
            twitter,
            topics,
            languages,
            kinesis_delivery: delivery_stream.into(),
        }
    }

    pub fn to_secret_string(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}
