use chess_explorer::{ErrorCode, Mode, MoveAttempt, Session, Source, START_FEN};
use pretty_assertions::assert_eq;

fn play(s: &mut Session, from: &str, to: &str) -> chess_explorer::MoveOutcome {
    s.apply_move(&MoveAttempt::new(from, to)).expect("legal move")
}

#[test]
fn new_session_sits_on_start_position() {
    let s = Session::new();
    assert_eq!(s.mode(), Mode::Free);
    assert_eq!(s.source(), &Source::Free);
    assert_eq!(s.tree().len(), 1);
    let root = s.current_node();
    assert!(root.is_root());
    assert_eq!(root.ply, 0);
    assert_eq!(root.fen, START_FEN);
    assert_eq!(root.normalized_fen, "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -");
    assert!(root.child_ids.is_empty());
    assert!(s.snapshot().is_none());
}

#[test]
fn play_back_up_and_branch() {
    let mut s = Session::new();
    let root = s.current_node_id();

    let e4 = play(&mut s, "e2", "e4");
    assert_eq!(e4.san, "e4");
    assert_eq!(e4.uci, "e2e4");
    assert!(!e4.reused);
    assert_eq!(s.current_node().ply, 1);

    let e5 = play(&mut s, "e7", "e5");
    assert_eq!(e5.san, "e5");
    assert_eq!(s.current_node().ply, 2);

    assert!(s.go_prev());
    assert!(s.go_prev());
    assert_eq!(s.current_node_id(), root);

    let d4 = play(&mut s, "d2", "d4");
    let root_node = s.node(root).expect("root");
    assert_eq!(root_node.child_ids.len(), 2);
    assert_eq!(root_node.child_ids[0], e4.node_id);
    assert_eq!(root_node.child_ids[1], d4.node_id);
    assert_eq!(root_node.active_child_id, Some(d4.node_id));

    let moves = s.mainline_moves();
    assert_eq!(moves.len(), 2);
    assert_eq!(moves[0].san, "e4");
    assert_eq!(moves[0].variation_count, 1);
    assert_eq!(moves[1].variation_count, 0);
    s.tree().validate().expect("well-formed tree");
}

#[test]
fn replaying_a_known_move_reuses_the_branch() {
    let mut s = Session::new();
    let first = play(&mut s, "g1", "f3");
    s.go_prev();
    let before = s.tree().len();
    let again = play(&mut s, "g1", "f3");
    assert!(again.reused);
    assert_eq!(again.node_id, first.node_id);
    assert_eq!(again.san, "Nf3");
    assert_eq!(s.tree().len(), before);
    assert_eq!(s.current_node_id(), first.node_id);
}

#[test]
fn mainline_child_never_changes() {
    let mut s = Session::new();
    let root = s.current_node_id();
    let e4 = play(&mut s, "e2", "e4");
    for (from, to) in [("d2", "d4"), ("c2", "c4"), ("g1", "f3")] {
        s.go_start();
        play(&mut s, from, to);
        assert_eq!(s.node(root).expect("root").child_ids[0], e4.node_id);
    }
    s.go_start();
    play(&mut s, "e2", "e4");
    let root_node = s.node(root).expect("root");
    assert_eq!(root_node.child_ids.len(), 4);
    assert_eq!(root_node.child_ids[0], e4.node_id);
    assert_eq!(root_node.active_child_id, Some(e4.node_id));
}

#[test]
fn reselecting_reused_move_updates_active_child() {
    let mut s = Session::new();
    let root = s.current_node_id();
    let e4 = play(&mut s, "e2", "e4");
    s.go_prev();
    let d4 = play(&mut s, "d2", "d4");
    assert_eq!(s.node(root).unwrap().active_child_id, Some(d4.node_id));
    s.go_prev();
    play(&mut s, "e2", "e4");
    assert_eq!(s.node(root).unwrap().active_child_id, Some(e4.node_id));
}

#[test]
fn squares_are_case_insensitive_and_validated() {
    let mut s = Session::new();
    let out = s.apply_move(&MoveAttempt::new("E2", "E4")).expect("uppercase squares accepted");
    assert_eq!(out.uci, "e2e4");

    let err = s.apply_move(&MoveAttempt::new("z9", "e5")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::IllegalMove);
    let err = s.apply_move(&MoveAttempt::new("e7", "e")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::IllegalMove);
}

#[test]
fn illegal_move_leaves_tree_untouched() {
    let mut s = Session::new();
    let err = s.apply_move(&MoveAttempt::new("e2", "e5")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::IllegalMove);
    assert_eq!(s.tree().len(), 1);
    assert!(s.current_node().is_root());

    // Black piece on white's turn.
    let err = s.apply_move(&MoveAttempt::new("e7", "e5")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::IllegalMove);
}

#[test]
fn node_identity_matches_position() {
    let mut s = Session::new();
    play(&mut s, "g1", "f3");
    play(&mut s, "g8", "f6");
    play(&mut s, "f3", "g1");
    play(&mut s, "f6", "g8");
    let back_home = s.current_node().clone();
    let root = s.tree().root().expect("root").clone();
    assert_eq!(back_home.normalized_fen, root.normalized_fen);
    assert_eq!(back_home.position_key, root.position_key);
    assert_ne!(back_home.fen, root.fen);
    assert_ne!(back_home.id, root.id);
}
