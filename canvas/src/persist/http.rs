//! REST implementation of [`PersistenceService`] for the browser.
//!
//! Every endpoint answers with the same envelope:
//! `{"status":"success"|"error","message":"...","data":...}`. Decoding of
//! that envelope is plain code so it is tested natively; only [`HttpStore`]
//! itself needs the `web` feature.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures map to [`PersistError::Transport`], non-2xx statuses
//! and `"error"` envelopes to [`PersistError::Rejected`], and 404 on an
//! item route to [`PersistError::NotFound`].

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ItemRecord, PersistError};
use crate::doc::{ItemId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ReplyStatus {
    Success,
    Error,
}

#[derive(Debug, Deserialize)]
struct Reply<T> {
    status: ReplyStatus,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

fn user_items_endpoint(base: &str, user: UserId) -> String {
    format!("{base}/users/{user}/garden-items")
}

fn item_endpoint(base: &str, item: ItemId) -> String {
    format!("{base}/garden-items/{item}")
}

fn inventory_endpoint(base: &str, user: UserId) -> String {
    format!("{base}/users/{user}/inventory")
}

fn currency_endpoint(base: &str, user: UserId) -> String {
    format!("{base}/users/{user}/currency")
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Decode a reply that must carry `data`.
fn decode_data<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, PersistError> {
    let reply = decode_envelope::<T>(status, body)?;
    reply.data.ok_or_else(|| PersistError::Decode("reply has no data".into()))
}

/// Decode a reply whose `data`, if any, is ignored.
fn decode_ack(status: u16, body: &str) -> Result<(), PersistError> {
    decode_envelope::<serde_json::Value>(status, body).map(|_| ())
}

fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<Reply<T>, PersistError> {
    let parsed = serde_json::from_str::<Reply<T>>(body);
    if !is_success(status) {
        let message = match parsed {
            Ok(reply) if !reply.message.is_empty() => reply.message,
            _ => body.trim().to_owned(),
        };
        return Err(PersistError::Rejected { status, message });
    }
    let reply = parsed.map_err(|e| PersistError::Decode(e.to_string()))?;
    if reply.status == ReplyStatus::Error {
        return Err(PersistError::Rejected { status, message: reply.message });
    }
    Ok(reply)
}

/// Map a 404 on an item route to [`PersistError::NotFound`].
fn item_error(item: ItemId, err: PersistError) -> PersistError {
    match err {
        PersistError::Rejected { status: 404, .. } => PersistError::NotFound(item),
        other => other,
    }
}

#[cfg(feature = "web")]
pub use web::HttpStore;

#[cfg(feature = "web")]
mod web {
    use async_trait::async_trait;
    use gloo_net::http::{Request, RequestBuilder, Response};
    use serde::Serialize;

    use super::*;
    use crate::doc::InventoryEntry;
    use crate::persist::PersistenceService;

    #[derive(Debug, Serialize)]
    struct CreateItemBody<'a> {
        kind: &'a str,
        x: i32,
        y: i32,
    }

    #[derive(Debug, Serialize)]
    struct PositionBody {
        x: i32,
        y: i32,
    }

    #[derive(Debug, Serialize)]
    struct QuantityBody<'a> {
        kind: &'a str,
        quantity: u32,
    }

    #[derive(Debug, Serialize)]
    struct CurrencyBody {
        amount: u64,
    }

    /// [`PersistenceService`] over REST, rooted at `base` (e.g. `/api`).
    #[derive(Debug, Clone)]
    pub struct HttpStore {
        base: String,
    }

    impl HttpStore {
        #[must_use]
        pub fn new(base: impl Into<String>) -> Self {
            let base: String = base.into();
            Self { base: base.trim_end_matches('/').to_owned() }
        }
    }

    fn transport(err: gloo_net::Error) -> PersistError {
        PersistError::Transport(err.to_string())
    }

    async fn read(resp: Response) -> Result<(u16, String), PersistError> {
        let status = resp.status();
        let body = resp.text().await.map_err(transport)?;
        Ok((status, body))
    }

    async fn send_json<B: Serialize>(builder: RequestBuilder, body: &B) -> Result<(u16, String), PersistError> {
        let resp = builder.json(body).map_err(transport)?.send().await.map_err(transport)?;
        read(resp).await
    }

    async fn send_empty(builder: RequestBuilder) -> Result<(u16, String), PersistError> {
        let resp = builder.send().await.map_err(transport)?;
        read(resp).await
    }

    #[async_trait(?Send)]
    impl PersistenceService for HttpStore {
        async fn create_placed_item(&self, user: UserId, kind: &str, x: i32, y: i32) -> Result<ItemRecord, PersistError> {
            let url = user_items_endpoint(&self.base, user);
            let (status, body) = send_json(Request::post(&url), &CreateItemBody { kind, x, y }).await?;
            decode_data(status, &body)
        }

        async fn update_placed_item_position(&self, item: ItemId, x: i32, y: i32) -> Result<ItemRecord, PersistError> {
            let url = item_endpoint(&self.base, item);
            let (status, body) = send_json(Request::patch(&url), &PositionBody { x, y }).await?;
            decode_data(status, &body).map_err(|e| item_error(item, e))
        }

        async fn delete_placed_item(&self, item: ItemId) -> Result<(), PersistError> {
            let url = item_endpoint(&self.base, item);
            let (status, body) = send_empty(Request::delete(&url)).await?;
            decode_ack(status, &body).map_err(|e| item_error(item, e))
        }

        async fn list_placed_items(&self, user: UserId) -> Result<Vec<ItemRecord>, PersistError> {
            let url = user_items_endpoint(&self.base, user);
            let (status, body) = send_empty(Request::get(&url)).await?;
            decode_data(status, &body)
        }

        async fn adjust_inventory_quantity(
            &self,
            user: UserId,
            kind: &str,
            quantity: u32,
        ) -> Result<InventoryEntry, PersistError> {
            let url = inventory_endpoint(&self.base, user);
            let (status, body) = send_json(Request::put(&url), &QuantityBody { kind, quantity }).await?;
            decode_data(status, &body)
        }

        async fn list_inventory(&self, user: UserId) -> Result<Vec<InventoryEntry>, PersistError> {
            let url = inventory_endpoint(&self.base, user);
            let (status, body) = send_empty(Request::get(&url)).await?;
            decode_data(status, &body)
        }

        async fn adjust_user_currency(&self, user: UserId, amount: u64) -> Result<(), PersistError> {
            let url = currency_endpoint(&self.base, user);
            let (status, body) = send_json(Request::put(&url), &CurrencyBody { amount }).await?;
            decode_ack(status, &body)
        }
    }
}
