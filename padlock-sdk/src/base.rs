use std::collections::HashMap;

use padlock_types::response::Envelope;
use reqwest::RequestBuilder;
use serde::Serialize;

/// Raw outcome of a side-call: the HTTP status, the response headers (the
/// authenticate subsystem answers through them), and the envelope.
#[derive(Debug)]
pub struct SideCall {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub envelope: Envelope,
}

pub(crate) struct BaseClient {
    api_url: String,
}

impl BaseClient {
    pub fn new(api_url: impl ToString) -> Self {
        Self {
            api_url: api_url.to_string(),
        }
    }

    pub async fn send<T: for<'de> serde::de::Deserialize<'de>>(
        rb: RequestBuilder,
    ) -> Result<T, String> {
        let envelope = rb
            .send()
            .await
            .map_err(|e| format!("{e:#?}"))?
            .json::<Envelope>()
            .await
            .map_err(|e| format!("{e:#?}"))?;

        if !envelope.success {
            return Err(envelope.error.map_or_else(
                || "Unexpected failure without error detail".to_string(),
                |err| format!("{} ({}): {}", err.message, err.code, err.detail),
            ));
        }
        match envelope.data {
            Some(data) => serde_json::from_value(data).map_err(|e| format!("{e:#?}")),
            None => Err("Unexpected empty response from server".into()),
        }
    }

    /// Issue a GET and hand back status, headers and envelope without
    /// interpreting the outcome.
    pub async fn side_call(
        &self,
        path: String,
        headers: &[(String, String)],
    ) -> Result<SideCall, String> {
        let client = reqwest::Client::new();
        let mut rb = client.get(format!("{}{}", self.api_url, path));
        for (name, value) in headers {
            rb = rb.header(name, value);
        }
        let resp = rb.send().await.map_err(|e| format!("{e:#?}"))?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let envelope = resp.json::<Envelope>().await.map_err(|e| format!("{e:#?}"))?;

        Ok(SideCall {
            status,
            headers,
            envelope,
        })
    }

    pub async fn get<T: for<'de> serde::de::Deserialize<'de>>(
        &self,
        path: String,
    ) -> Result<T, String> {
        let client = reqwest::Client::new();
        let request_builder = client.get(format!("{}{}", self.api_url, path));
        Self::send(request_builder).await
    }

    pub async fn delete<T: for<'de> serde::de::Deserialize<'de>>(
        &self,
        path: String,
    ) -> Result<T, String> {
        let client = reqwest::Client::new();
        let request_builder = client.delete(format!("{}{}", self.api_url, path));
        Self::send(request_builder).await
    }

    pub async fn put<T: Serialize, U: for<'de> serde::de::Deserialize<'de>>(
        &self,
        path: String,
        body: &T,
    ) -> Result<U, String> {
        let client = reqwest::Client::new();
        let request_builder = client.put(format!("{}{}", self.api_url, path)).json(body);
        Self::send(request_builder).await
    }

    pub async fn post<T: Serialize, U: for<'de> serde::de::Deserialize<'de>>(
        &self,
        path: String,
        body: &T,
    ) -> Result<U, String> {
        let client = reqwest::Client::new();
        let request_builder = client.post(format!("{}{}", self.api_url, path)).json(body);
        Self::send(request_builder).await
    }
}
