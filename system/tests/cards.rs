use system::serde_json;
use system::{Card, Collection, EntityKind, SessionDoc};

fn card(uuid: &str, x: f64, y: f64) -> Card {
    Card {
        uuid: uuid.into(),
        session: Some("room-1".into()),
        deleted: false,
        shape: 2.0,
        x,
        y,
    }
}

#[test]
fn it_should_sync_a_card_through_its_lifecycle() {
    let mut cards: Collection<Card> = Collection::new();

    // first mutation with a fresh uuid creates the card
    let stored = cards.upsert(card("a1", 10.0, 5.0), 1);
    assert_eq!(stored.uuid, "a1");
    assert_eq!(cards.fetch_active(EntityKind::Cards.restore_limit()).len(), 1);

    // moving the card is a full replace of the same uuid
    cards.upsert(card("a1", 300.0, 120.0), 2);
    let active = cards.fetch_active(EntityKind::Cards.restore_limit());
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].x, 300.0);
    assert_eq!(active[0].y, 120.0);

    // deleting tombstones it but keeps the record around
    let mut dead = card("a1", 300.0, 120.0);
    dead.deleted = true;
    cards.upsert(dead, 3);
    assert!(cards.fetch_active(EntityKind::Cards.restore_limit()).is_empty());
    assert_eq!(cards.len(), 1);
}

#[test]
fn it_should_let_the_last_commit_win_for_a_contended_uuid() {
    let mut cards: Collection<Card> = Collection::new();

    // two writers race on "a1"; whichever commit lands last owns the state,
    // independent of who sent first
    cards.upsert(card("a1", 10.0, 5.0), 7);
    cards.upsert(card("a1", 99.0, 5.0), 7);

    let active = cards.fetch_active(EntityKind::Cards.restore_limit());
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].x, 99.0);
}

#[test]
fn it_should_restore_only_the_latest_session_document() {
    let mut sessions: Collection<SessionDoc> = Collection::new();
    for (i, uuid) in ["s1", "s2", "s3"].iter().enumerate() {
        let doc: SessionDoc = serde_json::from_value(serde_json::json!({
            "uuid": uuid,
            "phase": format!("round-{}", i),
        }))
        .expect("must parse");
        sessions.upsert(doc, i as u64);
    }

    let active = sessions.fetch_active(EntityKind::Sessions.restore_limit());
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].uuid, "s3");
}
