use actix_web::error::ErrorInternalServerError;
use actix_web::{web, HttpResponse};
use serde::Serialize;

use system::EntityKind;

use crate::actix_web::Responder;
use crate::persistence::PersistenceGateway;

pub fn configure_status_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/status").route(web::get().to(get)));
}

#[derive(Serialize)]
struct Status {
    cards: usize,
    sessions: usize,
}

/// Health probe reporting stored record counts per collection.
async fn get(
    gateway: web::Data<PersistenceGateway>,
) -> Result<impl Responder, actix_web::error::Error> {
    let cards = gateway
        .collection_len(EntityKind::Cards)
        .await
        .map_err(ErrorInternalServerError)?;
    let sessions = gateway
        .collection_len(EntityKind::Sessions)
        .await
        .map_err(ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(Status { cards, sessions }))
}
