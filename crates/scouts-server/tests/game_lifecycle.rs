//! End-to-end scenarios for the game server core: lifecycle, event
//! streams, disconnects, and timer expiry.

mod common;

use common::{expect_events, TestServer};
use scouts_server::gameserver::{
    CreateGameOptions, GameDuration, GameError, GameEvent, GAME_TTL,
};
use scouts::Player;
use std::time::Duration;

fn infinite() -> [GameDuration; 2] {
    GameDuration::infinite_pair()
}

#[tokio::test]
async fn initial_state() {
    let server = TestServer::new();
    let id = server.create_game(CreateGameOptions::default());

    let state = server.manager.query_game(id).await.unwrap();
    assert!(state.player_a.is_none(), "player A should be empty");
    assert!(state.player_b.is_none(), "player B should be empty");
    assert!(state.moves.is_empty(), "snapshot should have no moves");
    assert!(state.began_at.is_none());

    // A young game survives collection.
    assert_eq!(server.manager.collect_idle(Duration::from_secs(3600)).await, 0);

    // Nobody can move before joining.
    let err = server
        .manager
        .make_move(&server.user1, id, &"place_scout 0,0".parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::InvalidMove { .. }));
}

#[tokio::test]
async fn both_players_join_untimed() {
    let server = TestServer::new();
    let id = server.create_game(CreateGameOptions::default());

    server.join(&server.user1, id).await;
    server.join(&server.user2, id).await;

    let mut sub1 = server.subscribe(&server.user1, id).await;
    let mut sub2 = server.subscribe(&server.user2, id).await;

    let expected = [
        GameEvent::PlayerJoined {
            player_side: Player::A,
            user_id: server.user1.user_id,
        },
        GameEvent::PlayerConnected {
            player_side: Player::A,
        },
        GameEvent::PlayerJoined {
            player_side: Player::B,
            user_id: server.user2.user_id,
        },
        GameEvent::PlayerConnected {
            player_side: Player::B,
        },
        GameEvent::TurnBegin {
            player_side: Player::A,
            plays_remaining: 1,
            time_remaining: infinite(),
        },
    ];
    expect_events(&mut sub1, &expected).await;
    expect_events(&mut sub2, &expected).await;

    sub1.stop().await;
    sub2.stop().await;
}

#[tokio::test]
async fn opening_moves_reach_every_subscriber() {
    let server = TestServer::new();
    let id = server.create_game(CreateGameOptions::default());

    server.join(&server.user1, id).await;
    server.join(&server.user2, id).await;

    let mut sub1 = server.subscribe(&server.user1, id).await;
    let mut sub2 = server.subscribe(&server.user2, id).await;

    server.make_move(&server.user1, id, "place_scout 0,9").await;
    server.make_move(&server.user2, id, "place_scout 0,0").await;

    let expected = [
        GameEvent::PlayerJoined {
            player_side: Player::A,
            user_id: server.user1.user_id,
        },
        GameEvent::PlayerConnected {
            player_side: Player::A,
        },
        GameEvent::PlayerJoined {
            player_side: Player::B,
            user_id: server.user2.user_id,
        },
        GameEvent::PlayerConnected {
            player_side: Player::B,
        },
        GameEvent::TurnBegin {
            player_side: Player::A,
            plays_remaining: 1,
            time_remaining: infinite(),
        },
        GameEvent::MoveMade {
            mv: "place_scout 0,9".parse().unwrap(),
            player_side: Player::A,
            plays_remaining: 0,
            time_remaining: infinite(),
        },
        GameEvent::TurnBegin {
            player_side: Player::B,
            plays_remaining: 1,
            time_remaining: infinite(),
        },
        GameEvent::MoveMade {
            mv: "place_scout 0,0".parse().unwrap(),
            player_side: Player::B,
            plays_remaining: 0,
            time_remaining: infinite(),
        },
        GameEvent::TurnBegin {
            player_side: Player::A,
            plays_remaining: 1,
            time_remaining: infinite(),
        },
    ];
    expect_events(&mut sub1, &expected).await;
    expect_events(&mut sub2, &expected).await;

    let state = server.manager.query_game(id).await.unwrap();
    assert_eq!(state.moves.len(), 2);

    sub1.stop().await;
    sub2.stop().await;
}

#[tokio::test]
async fn illegal_move_recovers() {
    let server = TestServer::new();
    let id = server.create_game(CreateGameOptions::default());

    server.join(&server.user1, id).await;
    server.join(&server.user2, id).await;

    let mut sub1 = server.subscribe(&server.user1, id).await;

    let err = server
        .manager
        .make_move(&server.user1, id, &"jump 0,0 0,9".parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::Rules(_)));

    // The same player can then make a legal move.
    server.make_move(&server.user1, id, "place_scout 0,9").await;
    server.make_move(&server.user2, id, "place_scout 0,0").await;

    let expected = [
        GameEvent::MoveMade {
            mv: "place_scout 0,9".parse().unwrap(),
            player_side: Player::A,
            plays_remaining: 0,
            time_remaining: infinite(),
        },
        GameEvent::MoveMade {
            mv: "place_scout 0,0".parse().unwrap(),
            player_side: Player::B,
            plays_remaining: 0,
            time_remaining: infinite(),
        },
    ];
    // The stream also carries join/connect/turn events; match just the
    // moves by draining until both are seen.
    let mut seen = Vec::new();
    while seen.len() < 2 {
        let event = tokio::time::timeout(Duration::from_secs(2), sub1.recv())
            .await
            .expect("timed out")
            .expect("stream ended");
        if matches!(event, GameEvent::MoveMade { .. }) {
            seen.push(event);
        }
    }
    assert_eq!(seen, expected);

    sub1.stop().await;
}

#[tokio::test]
async fn disconnect_and_reconnect() {
    let server = TestServer::new();
    let id = server.create_game(CreateGameOptions::default());

    server.join(&server.user1, id).await;
    server.join(&server.user2, id).await;

    let sub1 = server.subscribe(&server.user1, id).await;
    let mut sub2 = server.subscribe(&server.user2, id).await;

    server.make_move(&server.user1, id, "place_scout 0,9").await;
    server.make_move(&server.user2, id, "place_scout 0,0").await;

    sub1.stop().await;
    let mut sub1 = server.subscribe(&server.user1, id).await;

    let replayed = [
        GameEvent::PlayerJoined {
            player_side: Player::A,
            user_id: server.user1.user_id,
        },
        GameEvent::PlayerConnected {
            player_side: Player::A,
        },
        GameEvent::PlayerJoined {
            player_side: Player::B,
            user_id: server.user2.user_id,
        },
        GameEvent::PlayerConnected {
            player_side: Player::B,
        },
        GameEvent::TurnBegin {
            player_side: Player::A,
            plays_remaining: 1,
            time_remaining: infinite(),
        },
        GameEvent::MoveMade {
            mv: "place_scout 0,9".parse().unwrap(),
            player_side: Player::A,
            plays_remaining: 0,
            time_remaining: infinite(),
        },
        GameEvent::TurnBegin {
            player_side: Player::B,
            plays_remaining: 1,
            time_remaining: infinite(),
        },
        GameEvent::MoveMade {
            mv: "place_scout 0,0".parse().unwrap(),
            player_side: Player::B,
            plays_remaining: 0,
            time_remaining: infinite(),
        },
        GameEvent::TurnBegin {
            player_side: Player::A,
            plays_remaining: 1,
            time_remaining: infinite(),
        },
    ];
    // The rejoining player re-primes with the full history but not its own
    // past connection transitions.
    expect_events(&mut sub1, &replayed).await;

    // The other player observes the disconnect and the reconnect.
    let mut expected_for_2: Vec<GameEvent> = replayed.to_vec();
    expected_for_2.push(GameEvent::PlayerDisconnected {
        player_side: Player::A,
    });
    expected_for_2.push(GameEvent::PlayerConnected {
        player_side: Player::A,
    });
    expect_events(&mut sub2, &expected_for_2).await;

    sub1.stop().await;
    sub2.stop().await;
}

#[tokio::test]
async fn timer_expiry_ends_the_game() {
    // Real clock: the tick loop runs on wall time. 300ms drains quickly.
    let server = TestServer::real_time();
    let id = server.create_game(CreateGameOptions {
        time_limit: GameDuration::from_millis(300),
        increment: GameDuration::ZERO,
    });

    server.join(&server.user1, id).await;
    server.join(&server.user2, id).await;

    let mut sub1 = server.subscribe(&server.user1, id).await;

    let expected = [
        GameEvent::PlayerJoined {
            player_side: Player::A,
            user_id: server.user1.user_id,
        },
        GameEvent::PlayerConnected {
            player_side: Player::A,
        },
        GameEvent::PlayerJoined {
            player_side: Player::B,
            user_id: server.user2.user_id,
        },
        GameEvent::TurnBegin {
            player_side: Player::A,
            plays_remaining: 1,
            time_remaining: [
                GameDuration::from_millis(300),
                GameDuration::from_millis(300),
            ],
        },
        // Player A's clock drains while B's stays untouched.
        GameEvent::GameEnd {
            winner: Player::B,
            time_remaining: [GameDuration::ZERO, GameDuration::from_millis(300)],
        },
        GameEvent::GoingAway {},
    ];
    expect_events(&mut sub1, &expected).await;

    // The instance closes every subscriber queue on the way out.
    let end = tokio::time::timeout(Duration::from_secs(2), sub1.recv())
        .await
        .expect("timed out waiting for stream end");
    assert_eq!(end, None, "stream should close after going_away");
}

#[tokio::test]
async fn idle_games_are_collected_after_ttl() {
    let server = TestServer::new();
    let id = server.create_game(CreateGameOptions::default());
    assert_eq!(server.manager.len(), 1);

    server.clock.advance(chrono::Duration::hours(2) + chrono::Duration::minutes(1));
    assert_eq!(server.manager.collect_idle(GAME_TTL).await, 1);
    assert!(server.manager.is_empty());

    let err = server.manager.query_game(id).await.unwrap_err();
    assert!(matches!(err, GameError::NotFound));
}

#[tokio::test]
async fn game_full_for_third_session() {
    let server = TestServer::new();
    let id = server.create_game(CreateGameOptions::default());

    server.join(&server.user1, id).await;
    server.join(&server.user2, id).await;

    let user3 = scouts_server::session::Authorization::anonymous(
        scouts_server::session::SessionToken::generate(),
    );
    let err = server.manager.join_game(&user3, id).await.unwrap_err();
    assert!(matches!(err, GameError::GameFull));
}
