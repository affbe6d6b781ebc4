use std::convert::Infallible;

use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
    routing::get,
};
use futures::{Stream, stream};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    events::StoreEvent,
    middleware::auth::{decode_token, ensure_admin},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/events", get(events))
}

/// `EventSource` cannot set headers, so the token may come as a query
/// parameter instead.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct EventsQuery {
    pub token: Option<String>,
}

fn request_token<'a>(headers: &'a HeaderMap, query: &'a EventsQuery) -> Option<&'a str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .or(query.token.as_deref())
        .map(str::trim)
}

fn to_sse(event: &StoreEvent) -> Event {
    Event::default()
        .event(event.kind.as_str())
        .json_data(event)
        .unwrap_or_else(|_| Event::default().comment("unserializable event"))
}

#[utoipa::path(
    get,
    path = "/api/admin/events",
    params(("token" = Option<String>, Query, description = "Admin token when no Authorization header can be sent")),
    responses(
        (status = 200, description = "Server-sent stream of order, cart and SKU changes", content_type = "text/event-stream"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<EventsQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let token = request_token(&headers, &query).ok_or(AppError::Unauthorized)?;
    let user = decode_token(token, &state.config.jwt_secret)?;
    ensure_admin(&user)?;

    let rx = state.events.subscribe();
    tracing::debug!(subject = %user.subject, "event stream opened");

    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((Ok(to_sse(&event)), rx)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event stream lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn header_token_wins_over_query() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        let query = EventsQuery {
            token: Some("xyz".into()),
        };
        assert_eq!(request_token(&headers, &query), Some("abc"));
        assert_eq!(request_token(&HeaderMap::new(), &query), Some("xyz"));
        assert_eq!(request_token(&HeaderMap::new(), &EventsQuery::default()), None);
    }
}
