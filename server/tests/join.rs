use actix_web::{test, App};
use actix_web_actors::ws;
use futures::{SinkExt, StreamExt};

use server::handlers;
use server::persistence::PersistenceGateway;
use server::server::spawn_server;
use system::serde_json;
use system::uuid::Uuid;

#[actix_rt::test]
async fn it_should_boot_a_join_sent_right_after_the_upgrade() {
    let dir = std::env::temp_dir().join(format!("card-sync-test-{}", Uuid::new_v4()));
    let gateway = PersistenceGateway::open(dir.clone()).await.expect("open");
    let srv_tx = spawn_server(gateway.clone());

    let mut srv = test::start(move || {
        App::new()
            .data(srv_tx.clone())
            .data(gateway.clone())
            .configure(handlers::root)
    });

    let mut framed = srv.ws_at("/ws/").await.expect("connect");

    // sent before the internal handshake has assigned a connection id;
    // the frame must be held back, not lost
    framed
        .send(ws::Message::Text(
            r#"{"event":"session:join","data":{"session":"room-1"}}"#.to_string(),
        ))
        .await
        .expect("send");

    match framed.next().await {
        Some(Ok(ws::Frame::Text(bytes))) => {
            let frame: serde_json::Value = serde_json::from_slice(&bytes).expect("must parse");
            assert_eq!(frame["event"], "session:boot");
        }
        other => panic!("expected a boot frame, got {:?}", other),
    }

    let _ = std::fs::remove_dir_all(dir);
}
