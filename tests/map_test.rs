//! Tests for the three-phase bulk transform.

use memory_scramble::{Board, BoardError, Card};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;

fn cards(tokens: &[&str]) -> Vec<Card> {
    tokens
        .iter()
        .map(|t| Card::new(*t).expect("valid token"))
        .collect()
}

fn board_2x2() -> Board {
    Board::new(2, 2, cards(&["A", "A", "B", "B"])).expect("valid board")
}

/// Leaves all four cards face-up and uncontrolled via two mismatches.
async fn reveal_all(board: &Board) {
    board.flip("x", 0, 0).await.unwrap();
    board.flip("x", 0, 1).await.unwrap();
    board.flip("y", 1, 0).await.unwrap();
    board.flip("y", 1, 1).await.unwrap();
}

#[tokio::test]
async fn identity_map_changes_nothing() {
    let board = board_2x2();
    board.flip("p1", 0, 0).await.unwrap();

    let before = board.look("p1").await.unwrap();
    let after = board
        .map("p1", |card| async move { card.to_string() })
        .await
        .unwrap();
    assert_eq!(after, before);
    assert!(board.invariants_hold().await);
}

#[tokio::test]
async fn map_preserves_visibility_and_control() {
    let board = board_2x2();
    board.flip("p1", 0, 0).await.unwrap();

    board
        .map("m", |card| async move { card.as_str().to_lowercase() })
        .await
        .unwrap();

    assert_eq!(board.look("p1").await.unwrap(), "my a\ndown\ndown\ndown\n");
    assert_eq!(board.look("m").await.unwrap(), "up a\ndown\ndown\ndown\n");
}

#[tokio::test]
async fn transform_runs_once_per_distinct_value() {
    let board = board_2x2();
    let calls = AtomicUsize::new(0);

    board
        .map("m", |card| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { format!("{card}!") }
        })
        .await
        .unwrap();

    // two distinct values on a four-cell board
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalid_transform_output_aborts_without_applying() {
    let board = board_2x2();
    board.flip("p1", 0, 0).await.unwrap();
    let before = board.look("p1").await.unwrap();

    let result = board
        .map("m", |card| async move { format!("{card} oops") })
        .await;
    assert!(matches!(result, Err(BoardError::InvalidCard { .. })));

    // nothing committed
    assert_eq!(board.look("p1").await.unwrap(), before);
    assert!(board.invariants_hold().await);
}

#[tokio::test]
async fn sequential_maps_compose() {
    let layout = ["A", "B", "C", "D"];
    let composed = Board::new(2, 2, cards(&layout)).unwrap();
    let stepwise = Board::new(2, 2, cards(&layout)).unwrap();
    reveal_all(&composed).await;
    reveal_all(&stepwise).await;

    stepwise
        .map("m", |card| async move { format!("{card}g") })
        .await
        .unwrap();
    let two_steps = stepwise
        .map("m", |card| async move { format!("{card}f") })
        .await
        .unwrap();

    let one_step = composed
        .map("m", |card| async move { format!("{card}gf") })
        .await
        .unwrap();

    assert_eq!(two_steps, one_step);
    assert_eq!(two_steps, "up Agf\nup Bgf\nup Cgf\nup Dgf\n");
}

#[tokio::test]
async fn flips_interleave_with_a_slow_transform() {
    let board = Arc::new(board_2x2());
    let gate = Arc::new(Semaphore::new(0));

    let map_board = board.clone();
    let map_gate = gate.clone();
    let mapper = tokio::spawn(async move {
        map_board
            .map("m", move |card| {
                let gate = map_gate.clone();
                async move {
                    let permit = gate.acquire().await.expect("gate open");
                    permit.forget();
                    format!("{card}x")
                }
            })
            .await
    });
    // let the mapper take its snapshot and block in the compute phase
    tokio::task::yield_now().await;

    // the lock must be free while the transform runs
    let flip = timeout(Duration::from_millis(100), board.flip("p1", 0, 0))
        .await
        .expect("flip must not wait on the transform");
    flip.unwrap();

    gate.add_permits(2);
    let rendered = mapper.await.unwrap().unwrap();

    // the card flipped mid-transform still gets its mapped value
    assert_eq!(rendered, "up Ax\ndown\ndown\ndown\n");
    assert_eq!(board.look("p1").await.unwrap(), "my Ax\ndown\ndown\ndown\n");
    assert!(board.invariants_hold().await);
}

#[tokio::test]
async fn map_skips_values_removed_between_phases() {
    let board = Arc::new(board_2x2());
    let gate = Arc::new(Semaphore::new(0));

    let map_board = board.clone();
    let map_gate = gate.clone();
    let mapper = tokio::spawn(async move {
        map_board
            .map("m", move |card| {
                let gate = map_gate.clone();
                async move {
                    let permit = gate.acquire().await.expect("gate open");
                    permit.forget();
                    format!("{card}x")
                }
            })
            .await
    });
    tokio::task::yield_now().await;

    // remove the A pair while the transform is still computing
    board.flip("p1", 0, 0).await.unwrap();
    board.flip("p1", 0, 1).await.unwrap();
    board.flip("p1", 1, 0).await.unwrap();

    gate.add_permits(2);
    mapper.await.unwrap().unwrap();

    // the surviving B cards are rewritten, the removed cells stay gone
    assert_eq!(board.look("p1").await.unwrap(), "none\nnone\nmy Bx\ndown\n");
    assert!(board.invariants_hold().await);
}

#[tokio::test]
async fn map_rejects_empty_player() {
    let board = board_2x2();
    let result = board.map("", |card| async move { card.to_string() }).await;
    assert!(matches!(result, Err(BoardError::EmptyPlayer)));
}
