//! Server-sent events stream for the live visit counter.

use std::convert::Infallible;
use std::time::Duration;

use actix_web::{HttpResponse, get, web};
use futures_util::stream::{self, StreamExt};
use sea_orm::DatabaseConnection;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::warn;

use crate::db;
use crate::models::VisitCountEvent;
use crate::services::EventBroadcaster;

/// Idle connections are closed after this long without an event.
const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Configure SSE routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(visit_events);
}

fn sse_frame(event: &str, payload: &VisitCountEvent) -> web::Bytes {
    web::Bytes::from(format!(
        "event: {}\ndata: {}\n\n",
        event, payload.total_visits
    ))
}

/// Stream visit-count updates.
///
/// Opens with a `connected` event carrying the current total, then emits a
/// `visitCountUpdate` event every time a login bumps the counter.
#[utoipa::path(
    get,
    path = "/api/v1/events/visit-count",
    tag = "Events",
    responses(
        (status = 200, description = "SSE stream of visit-count events")
    )
)]
#[get("/events/visit-count")]
pub async fn visit_events(
    db: web::Data<DatabaseConnection>,
    broadcaster: web::Data<EventBroadcaster>,
) -> HttpResponse {
    let total = match db::visits::count(db.get_ref()).await {
        Ok(total) => total,
        Err(e) => {
            warn!("Visit count query failed on SSE connect: {}", e);
            0
        }
    };

    let hello = stream::once(async move {
        Ok::<_, Infallible>(sse_frame("connected", &VisitCountEvent::new(total)))
    });

    let rx = broadcaster.subscribe();
    let updates = stream::unfold(rx, |mut rx| async move {
        loop {
            match timeout(IDLE_TIMEOUT, rx.recv()).await {
                Ok(Ok(event)) => {
                    return Some((
                        Ok::<_, Infallible>(sse_frame("visitCountUpdate", &event)),
                        rx,
                    ));
                }
                // dropped events only matter as a gap; the next event
                // carries the full total anyway
                Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
                Ok(Err(broadcast::error::RecvError::Closed)) => return None,
                Err(_) => return None,
            }
        }
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(hello.chain(updates))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_format() {
        let frame = sse_frame("connected", &VisitCountEvent::new(12));
        assert_eq!(
            std::str::from_utf8(&frame).unwrap(),
            "event: connected\ndata: 12\n\n"
        );
    }
}
