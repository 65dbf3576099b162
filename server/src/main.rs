use actix_cors::Cors;
use actix_web::{App, HttpServer};

use server::config::ServerConfig;
use server::handlers;
use server::persistence::PersistenceGateway;
use server::server::spawn_server;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = ServerConfig::from_env();
    let gateway = PersistenceGateway::open(config.data_dir.clone())
        .await
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;

    let srv_tx = spawn_server(gateway.clone());

    log::info!("listening on {}", config.bind_addr());
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .data(srv_tx.clone())
            .data(gateway.clone())
            .configure(handlers::root)
    })
    .bind(config.bind_addr())?
    .run()
    .await
}
