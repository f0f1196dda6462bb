use cipher_essentials::utils::rand::LabeledRng;
use ledger_card_protocol::cards::decode_deck;
use ledger_card_protocol::coordinator::decryption::decryptor;
use ledger_card_protocol::coordinator::shuffle_chain::final_shuffler;
use ledger_card_protocol::ledger::{Categories, InMemoryLedger, KeyedSigner, StepTag};
use ledger_card_protocol::node::TickOutcome;
use ledger_card_protocol::payload::DeckPayload;
use ledger_card_protocol::rotation::rotation_from;
use ledger_card_protocol::{
    Address, GameId, Ledger, Phase, PlayerNode, ProtocolConfig, ProtocolError,
};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

type Node = PlayerNode<InMemoryLedger, LabeledRng>;

const NAMES: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

fn config(players: usize) -> ProtocolConfig {
    ProtocolConfig {
        min_players: players,
        ..ProtocolConfig::default()
    }
}

fn game() -> GameId {
    GameId::new("tx-create")
}

fn table(ledger: &Arc<InMemoryLedger>, players: usize, dealer: &str) -> Vec<Node> {
    NAMES[..players]
        .iter()
        .map(|name| {
            PlayerNode::new(
                config(players),
                ledger.clone(),
                Arc::new(KeyedSigner::new(*name)),
                game(),
                Address::from("A"),
                LabeledRng::from_label(format!("player {name}").as_bytes()),
            )
            .with_dealer(Address::from(dealer))
        })
        .collect()
}

async fn join_all(nodes: &mut [Node]) {
    for node in nodes.iter_mut() {
        node.join().await.unwrap();
    }
}

async fn tick_until_ready(nodes: &mut [Node], rounds: usize) {
    for _ in 0..rounds {
        for node in nodes.iter_mut() {
            node.tick().await;
        }
        if nodes.iter().all(|node| node.session().phase() == Phase::Ready) {
            return;
        }
    }
    panic!("table not ready after {rounds} rounds");
}

fn categories(players: usize) -> Categories {
    config(players).categories(&game())
}

async fn decrypted_deck(ledger: &InMemoryLedger, players: usize, decryptor: &Address) -> Vec<String> {
    let bytes = ledger
        .query_latest_by_sender(categories(players).get(StepTag::Decrypt), decryptor)
        .await
        .unwrap()
        .unwrap();
    DeckPayload::from_bytes(&bytes).unwrap().deck
}

#[tokio::test]
async fn three_players_step_by_step() {
    let ledger = Arc::new(InMemoryLedger::new());
    let mut nodes = table(&ledger, 3, "A");
    join_all(&mut nodes).await;
    let [a, b, c] = &mut nodes[..] else {
        unreachable!()
    };

    for node in [&mut *a, &mut *b, &mut *c] {
        node.session_tick().await.unwrap();
        assert_eq!(node.session().phase(), Phase::KeyExchange);
    }

    for node in [&mut *a, &mut *b, &mut *c] {
        assert!(matches!(
            node.key_exchange_tick().await.unwrap(),
            TickOutcome::Published(_)
        ));
    }
    for node in [&mut *a, &mut *b, &mut *c] {
        node.key_exchange_tick().await.unwrap();
        assert_eq!(node.other_keys().len(), 2);
        node.session_tick().await.unwrap();
        assert_eq!(node.session().phase(), Phase::Encrypting);
    }

    // nobody moves before their predecessor
    assert_eq!(b.shuffle_tick().await.unwrap(), TickOutcome::Idle);
    assert_eq!(c.shuffle_tick().await.unwrap(), TickOutcome::Idle);
    assert!(matches!(a.shuffle_tick().await.unwrap(), TickOutcome::Published(_)));
    assert_eq!(c.shuffle_tick().await.unwrap(), TickOutcome::Idle);
    assert!(matches!(b.shuffle_tick().await.unwrap(), TickOutcome::Published(_)));
    assert!(matches!(c.shuffle_tick().await.unwrap(), TickOutcome::Published(_)));
    for node in [&mut *a, &mut *b, &mut *c] {
        assert_eq!(node.shuffle_tick().await.unwrap(), TickOutcome::Idle);
    }

    let shuffle = categories(3).get(StepTag::Shuffle).clone();
    assert_eq!(
        ledger.senders_in(&shuffle),
        vec![Address::from("A"), Address::from("B"), Address::from("C")]
    );
    assert_eq!(final_shuffler(a.session()), Some(&Address::from("C")));

    for node in [&mut *a, &mut *b, &mut *c] {
        node.session_tick().await.unwrap();
        assert!(node.has_finished_encrypting());
        assert_eq!(node.session().phase(), Phase::Decrypting);
    }

    assert_eq!(a.decryption_tick().await.unwrap(), TickOutcome::Idle);
    assert_eq!(c.decryption_tick().await.unwrap(), TickOutcome::Idle);
    assert!(matches!(b.decryption_tick().await.unwrap(), TickOutcome::Published(_)));
    assert_eq!(b.decryption_tick().await.unwrap(), TickOutcome::Idle);

    let decrypt = categories(3).get(StepTag::Decrypt).clone();
    assert_eq!(ledger.senders_in(&decrypt), vec![Address::from("B")]);

    // still no cards, so still not ready
    for node in [&mut *a, &mut *b, &mut *c] {
        node.session_tick().await.unwrap();
        assert_eq!(node.session().phase(), Phase::Decrypting);
    }

    for node in [&mut *a, &mut *b, &mut *c] {
        assert_eq!(node.deal_tick().await.unwrap(), TickOutcome::Observed);
        assert_eq!(node.session().cards().len(), 2);
        node.session_tick().await.unwrap();
        assert_eq!(node.session().phase(), Phase::Ready);
    }
}

#[tokio::test]
async fn hands_are_disjoint_slices_of_the_decrypted_deck() {
    let ledger = Arc::new(InMemoryLedger::new());
    let mut nodes = table(&ledger, 3, "A");
    join_all(&mut nodes).await;
    tick_until_ready(&mut nodes, 10).await;

    let published = decrypted_deck(&ledger, 3, &Address::from("B")).await;
    let hand = |name: &str| {
        let node = nodes.iter().find(|n| n.address().as_str() == name).unwrap();
        node.session()
            .cards()
            .iter()
            .map(ledger_card_protocol::payload::encode_field)
            .collect::<Vec<_>>()
    };
    assert_eq!(hand("B"), published[0..2].to_vec());
    assert_eq!(hand("C"), published[2..4].to_vec());
    assert_eq!(hand("A"), published[4..6].to_vec());

    let distinct: HashSet<String> = ["A", "B", "C"].into_iter().flat_map(hand).collect();
    assert_eq!(distinct.len(), 6);
}

#[tokio::test]
async fn dealt_cards_stay_masked() {
    let ledger = Arc::new(InMemoryLedger::new());
    let mut nodes = table(&ledger, 3, "A");
    join_all(&mut nodes).await;
    tick_until_ready(&mut nodes, 10).await;

    let bytes = ledger
        .query_latest_by_sender(categories(3).get(StepTag::Decrypt), &Address::from("B"))
        .await
        .unwrap()
        .unwrap();
    let deck = DeckPayload::from_bytes(&bytes).unwrap().deck().unwrap();
    assert!(decode_deck(&deck).is_err());
}

#[tokio::test]
async fn repeated_ticks_publish_each_step_once() {
    let ledger = Arc::new(InMemoryLedger::new());
    let mut nodes = table(&ledger, 3, "A");
    join_all(&mut nodes).await;
    tick_until_ready(&mut nodes, 10).await;

    let before = ledger.transactions().len();
    for _ in 0..5 {
        for node in nodes.iter_mut() {
            assert_eq!(node.tick().await, Phase::Ready);
        }
    }
    assert_eq!(ledger.transactions().len(), before);

    let categories = categories(3);
    assert_eq!(ledger.count_in_category(categories.get(StepTag::Join)), 2);
    assert_eq!(ledger.count_in_category(categories.get(StepTag::PublicKey)), 3);
    assert_eq!(ledger.count_in_category(categories.get(StepTag::Shuffle)), 3);
    assert_eq!(ledger.count_in_category(categories.get(StepTag::Decrypt)), 1);
}

#[tokio::test]
async fn every_dealer_for_three_to_six_players() {
    for players in 3..=6 {
        for dealer in &NAMES[..players] {
            let ledger = Arc::new(InMemoryLedger::new());
            let mut nodes = table(&ledger, players, dealer);
            join_all(&mut nodes).await;
            tick_until_ready(&mut nodes, 4 * players).await;

            let session = nodes[0].session();
            assert_eq!(session.dealer(), &Address::from(*dealer));
            let expected: Vec<Address> = rotation_from(session.players(), session.dealer())
                .unwrap()
                .into_iter()
                .cloned()
                .collect();

            let categories = categories(players);
            assert_eq!(ledger.senders_in(categories.get(StepTag::Shuffle)), expected);

            let decryptors = ledger.senders_in(categories.get(StepTag::Decrypt));
            assert_eq!(decryptors.iter().collect::<Vec<_>>(), vec![decryptor(session).unwrap()]);

            for node in &nodes {
                assert_eq!(node.session().cards().len(), 2);
            }
        }
    }
}

#[tokio::test]
async fn transient_failures_only_delay_the_deal() {
    let ledger = Arc::new(InMemoryLedger::new());
    let mut nodes = table(&ledger, 4, "C");
    join_all(&mut nodes).await;

    let mut rounds = 0;
    while !nodes.iter().all(|node| node.session().phase() == Phase::Ready) {
        rounds += 1;
        assert!(rounds < 60, "deal stalled");
        for node in nodes.iter_mut() {
            ledger.fail_next(1);
            node.tick().await;
        }
    }

    let categories = categories(4);
    assert_eq!(ledger.count_in_category(categories.get(StepTag::PublicKey)), 4);
    assert_eq!(ledger.count_in_category(categories.get(StepTag::Shuffle)), 4);
    assert_eq!(ledger.count_in_category(categories.get(StepTag::Decrypt)), 1);
}

#[tokio::test]
async fn two_players_can_deal_heads_up() {
    let ledger = Arc::new(InMemoryLedger::new());
    let mut nodes = table(&ledger, 2, "A");
    join_all(&mut nodes).await;
    tick_until_ready(&mut nodes, 10).await;

    let categories = categories(2);
    assert_eq!(
        ledger.senders_in(categories.get(StepTag::Shuffle)),
        vec![Address::from("A"), Address::from("B")]
    );
    assert_eq!(
        ledger.senders_in(categories.get(StepTag::Decrypt)),
        vec![Address::from("B")]
    );
}

#[tokio::test]
async fn nothing_happens_until_the_table_is_full() {
    let ledger = Arc::new(InMemoryLedger::new());
    let mut nodes = table(&ledger, 3, "A");
    nodes[1].join().await.unwrap();

    for _ in 0..3 {
        for node in nodes[..2].iter_mut() {
            assert_eq!(node.tick().await, Phase::WaitingForPlayers);
        }
    }
    let categories = categories(3);
    assert_eq!(ledger.count_in_category(categories.get(StepTag::PublicKey)), 0);
}

#[tokio::test]
async fn a_late_joiner_is_never_seated() {
    let ledger = Arc::new(InMemoryLedger::new());
    let mut nodes = table(&ledger, 3, "A");
    join_all(&mut nodes).await;
    tick_until_ready(&mut nodes, 10).await;
    let hands: Vec<_> = nodes.iter().map(|node| node.session().cards().to_vec()).collect();

    nodes.push(
        PlayerNode::new(
            config(3),
            ledger.clone(),
            Arc::new(KeyedSigner::new("D")),
            game(),
            Address::from("A"),
            LabeledRng::from_label(b"player D"),
        )
        .with_dealer(Address::from("A")),
    );
    for _ in 0..10 {
        for node in nodes.iter_mut() {
            node.tick().await;
        }
    }

    let late = &nodes[3];
    assert!(late.session().cards().is_empty());
    assert_eq!(late.session().phase(), Phase::WaitingForPlayers);
    assert!(late.public_key().is_none());

    let seated = vec![Address::from("A"), Address::from("B"), Address::from("C")];
    for (node, hand) in nodes[..3].iter().zip(&hands) {
        assert_eq!(node.session().players(), &seated[..]);
        assert_eq!(node.session().cards(), &hand[..]);
    }

    let categories = categories(3);
    assert_eq!(ledger.count_in_category(categories.get(StepTag::PublicKey)), 3);
    assert_eq!(ledger.count_in_category(categories.get(StepTag::Shuffle)), 3);
    assert_eq!(ledger.count_in_category(categories.get(StepTag::Decrypt)), 1);
}

#[tokio::test]
async fn an_oversized_hand_is_a_deck_size_error() {
    let ledger = Arc::new(InMemoryLedger::new());
    let greedy = ProtocolConfig {
        min_players: 2,
        cards_per_player: 30,
        ..ProtocolConfig::default()
    };
    assert!(matches!(greedy.validate(), Err(ProtocolError::Config(_))));

    let mut nodes: Vec<Node> = NAMES[..2]
        .iter()
        .map(|name| {
            PlayerNode::new(
                greedy.clone(),
                ledger.clone(),
                Arc::new(KeyedSigner::new(*name)),
                game(),
                Address::from("A"),
                LabeledRng::from_label(name.as_bytes()),
            )
        })
        .collect();
    join_all(&mut nodes).await;
    for _ in 0..10 {
        for node in nodes.iter_mut() {
            node.tick().await;
        }
    }

    assert_eq!(ledger.count_in_category(categories(2).get(StepTag::Decrypt)), 1);
    assert!(matches!(
        nodes[0].deal_tick().await,
        Err(ProtocolError::DeckSize(52, 60))
    ));
    assert!(nodes[0].session().cards().is_empty());
}

#[tokio::test]
async fn running_nodes_reach_ready_and_stop() {
    let ledger = Arc::new(InMemoryLedger::new());
    let (shutdown, stop) = watch::channel(false);
    let config = config(3).with_interval(Duration::from_millis(5));

    let mut phases = Vec::new();
    let mut handles = Vec::new();
    for name in &NAMES[..3] {
        let node: Node = PlayerNode::new(
            config.clone(),
            ledger.clone(),
            Arc::new(KeyedSigner::new(*name)),
            game(),
            Address::from("A"),
            LabeledRng::from_label(name.as_bytes()),
        );
        phases.push(node.subscribe_phase());
        handles.push(tokio::spawn(node.run(stop.clone())));
    }

    for phase in phases.iter_mut() {
        tokio::time::timeout(Duration::from_secs(10), phase.wait_for(|p| *p == Phase::Ready))
            .await
            .expect("deal timed out")
            .unwrap();
    }
    shutdown.send(true).unwrap();

    for handle in handles {
        let node = handle.await.unwrap();
        assert_eq!(node.session().cards().len(), 2);
    }
}
