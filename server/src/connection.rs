use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use actix_web_actors::ws::{CloseCode, CloseReason};

use system::serde_json;
use system::{ClientEvent, ConnectionId, ServerEvent};

use crate::connection_tx_storage::ConnectionTx;
use crate::server::ServerTx;

#[derive(Debug)]
pub enum ConnectionCommand {
    Connect {
        tx: ConnectionTx,
    },
    Disconnect {
        from: ConnectionId,
    },
    ClientEvent {
        from: ConnectionId,
        event: ClientEvent,
    },
}

#[derive(Debug)]
pub enum ConnectionEvent {
    Connected { connection_id: ConnectionId },
    Egress(ServerEvent),
}

#[derive(Message)]
#[rtype(result = "()")]
struct ConnectionActorMessage(ConnectionEvent);

enum ConnectionState {
    /// Connected to the socket but not yet registered with the dispatch
    /// loop. Frames arriving this early are held back until the loop has
    /// assigned a connection id.
    Idle { pending: Vec<ClientEvent> },
    Connected(ConnectionId),
}

struct ConnectionActor {
    state: ConnectionState,
    srv_tx: ServerTx,
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<ConnectionEvent>(32);

        self.srv_tx
            .try_send(ConnectionCommand::Connect { tx })
            .expect("server must still be running");

        let addr = ctx.address().recipient();

        tokio::spawn(async move {
            let addr = addr;
            log::debug!("connection egress task - started");
            while let Some(msg) = rx.recv().await {
                addr.try_send(ConnectionActorMessage(msg))
                    .expect("should have enough buffer")
            }
            log::debug!("connection egress task - terminated");
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if let ConnectionState::Connected(id) = self.state {
            self.srv_tx
                .try_send(ConnectionCommand::Disconnect { from: id })
                .expect("should have enough buffer");
        }

        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => match &mut self.state {
                    ConnectionState::Connected(from) => {
                        let from = *from;
                        log::debug!("ingress from {}: {:?}", from, event);
                        self.srv_tx
                            .try_send(ConnectionCommand::ClientEvent { from, event })
                            .expect("should have enough buffer");
                    }
                    ConnectionState::Idle { pending } => {
                        log::debug!("holding frame until handshake completes: {:?}", event);
                        pending.push(event);
                    }
                },
                Err(err) => {
                    log::warn!("undecodable frame: {}", err);
                    ctx.close(Some(CloseReason {
                        code: CloseCode::Invalid,
                        description: None,
                    }));
                }
            },
            Ok(ws::Message::Close(_)) => {
                let connected = match self.state {
                    ConnectionState::Connected(id) => Some(id),
                    _ => None,
                };
                if let Some(id) = connected {
                    self.srv_tx
                        .try_send(ConnectionCommand::Disconnect { from: id })
                        .expect("should have enough buffer");
                    // stopping() must not report the same disconnect again
                    self.state = ConnectionState::Idle {
                        pending: Vec::new(),
                    };
                }
                ctx.stop();
            }
            _ => (),
        }
    }
}

/// Egress
impl Handler<ConnectionActorMessage> for ConnectionActor {
    type Result = ();

    fn handle(
        &mut self,
        msg: ConnectionActorMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Self::Result {
        let connection_event = &msg.0;
        log::debug!("egress {:?}", connection_event);
        match connection_event {
            ConnectionEvent::Connected { connection_id } => {
                let from = *connection_id;
                let previous =
                    std::mem::replace(&mut self.state, ConnectionState::Connected(from));
                if let ConnectionState::Idle { pending } = previous {
                    for event in pending {
                        log::debug!("ingress from {} (held): {:?}", from, event);
                        self.srv_tx
                            .try_send(ConnectionCommand::ClientEvent { from, event })
                            .expect("should have enough buffer");
                    }
                }
            }
            ConnectionEvent::Egress(event) => {
                let serialized = serde_json::to_string(event).expect("must succeed");
                ctx.text(serialized);
            }
        }
    }
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    srv_tx: web::Data<ServerTx>,
) -> Result<HttpResponse, Error> {
    ws::start(
        ConnectionActor {
            srv_tx: srv_tx.get_ref().clone(),
            state: ConnectionState::Idle {
                pending: Vec::new(),
            },
        },
        &req,
        stream,
    )
}
