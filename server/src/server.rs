use std::num::Wrapping;

use tokio::sync::mpsc::{channel, Sender};

use system::{Card, ClientEvent, ConnectionId, Replicated, ServerEvent, SessionDoc};

use super::connection::{ConnectionCommand, ConnectionEvent};
use crate::connection_tx_storage::ConnectionTxStorage;
use crate::persistence::PersistenceGateway;
use crate::rooms::RoomManager;

pub type ServerTx = Sender<ConnectionCommand>;

/// The sync core. All mutable state (rooms, egress handles, the gateway)
/// is owned here and touched only from the dispatch loop, so events are
/// processed strictly one at a time.
struct Server {
    gateway: PersistenceGateway,
    rooms: RoomManager,
    connections: ConnectionTxStorage,
    connection_id_source: Wrapping<ConnectionId>,
}

impl Server {
    fn new(gateway: PersistenceGateway) -> Self {
        Self {
            gateway,
            rooms: RoomManager::new(),
            connections: ConnectionTxStorage::new(),
            connection_id_source: Wrapping(0),
        }
    }

    async fn handle_connection_command(&mut self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::Connect { tx } => {
                let connection_id = self.new_connection_id();
                self.connections.insert(connection_id, tx);
                self.connections
                    .send(&connection_id, ConnectionEvent::Connected { connection_id })
                    .await;
            }
            ConnectionCommand::Disconnect { from } => {
                self.rooms.drop_connection(from);
                if self.connections.remove(&from).is_some() {
                    log::info!("connection {} disconnected", from);
                }
            }
            ConnectionCommand::ClientEvent { from, event } => {
                self.handle_client_event(from, event).await
            }
        }
    }

    async fn handle_client_event(&mut self, from: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::Join { session } => {
                self.rooms.join(from, session);
                self.send(from, ServerEvent::Boot).await;
            }
            ClientEvent::CardsInit => {
                if let Some(cards) = self.restore::<Card>().await {
                    self.send(from, ServerEvent::CardsRestore(cards)).await;
                }
            }
            ClientEvent::SessionsInit => {
                if let Some(sessions) = self.restore::<SessionDoc>().await {
                    self.send(from, ServerEvent::SessionsRestore(sessions)).await;
                }
            }
            ClientEvent::CardsMutation(card) => {
                if let Some(stored) = self.apply_mutation(card).await {
                    self.send(from, ServerEvent::CardsPush(stored)).await;
                }
            }
            ClientEvent::SessionsMutation(doc) => {
                if let Some(stored) = self.apply_mutation(doc).await {
                    self.send(from, ServerEvent::SessionsPush(stored)).await;
                }
            }
        }
    }

    /// Fetches the active documents of a collection. A storage failure
    /// aborts this one request; the error stays server-side.
    async fn restore<T: Replicated>(&mut self) -> Option<Vec<T>> {
        match self.gateway.fetch_active::<T>().await {
            Ok(docs) => Some(docs),
            Err(err) => {
                log::error!("{} restore failed: {}", T::KIND, err);
                None
            }
        }
    }

    /// Validates and persists one mutation. The echo is withheld unless the
    /// write is confirmed, so a client never sees a push for a document that
    /// was not stored.
    async fn apply_mutation<T: Replicated>(&mut self, doc: T) -> Option<T> {
        if let Err(err) = doc.validate() {
            log::warn!("rejected {} mutation: {}", T::KIND, err);
            return None;
        }
        match self.gateway.upsert(doc).await {
            Ok(stored) => Some(stored),
            Err(err) => {
                log::error!("{} mutation was not persisted: {}", T::KIND, err);
                None
            }
        }
    }

    async fn send(&mut self, to: ConnectionId, event: ServerEvent) {
        self.connections.send(&to, ConnectionEvent::Egress(event)).await;
    }

    fn new_connection_id(&mut self) -> ConnectionId {
        self.connection_id_source += Wrapping(1);
        self.connection_id_source.0
    }
}

pub fn spawn_server(gateway: PersistenceGateway) -> ServerTx {
    let (srv_tx, mut srv_rx) = channel::<ConnectionCommand>(16);

    tokio::spawn(async move {
        let mut server = Box::new(Server::new(gateway));

        while let Some(command) = srv_rx.recv().await {
            server.handle_connection_command(command).await;
        }
    });

    srv_tx
}
