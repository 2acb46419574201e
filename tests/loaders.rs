use chess_explorer::{ErrorCode, ExplorerError, GameSnapshot, Mode, MoveAttempt, MoveListMeta, PgnMeta, Session, Source, START_FEN};
use pretty_assertions::assert_eq;

const GIUOCO: &str = include_str!("data/giuoco_piano.pgn");
const SNAPSHOT: &str = include_str!("data/game_snapshot.json");

fn sans(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn load_position_canonicalizes_and_stays_free() {
    let mut s = Session::new();
    s.load_position("  4k3/8/8/8/8/8/4P3/4K3 w - - 0 1 ").expect("valid fen");
    assert_eq!(s.mode(), Mode::Free);
    assert_eq!(s.source(), &Source::Fen { fen: "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1".to_string() });
    assert_eq!(s.tree().len(), 1);
    assert_eq!(s.root_fen(), "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");

    // Still free: a second position load is allowed.
    s.load_position(START_FEN).expect("second load");
}

#[test]
fn invalid_position_is_rejected_without_mutation() {
    let mut s = Session::new();
    s.apply_move(&MoveAttempt::new("e2", "e4")).unwrap();
    let before = s.current_node_id();
    let err = s.load_position("not a position").unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidFen);
    assert_eq!(s.current_node_id(), before);
    assert_eq!(s.tree().len(), 2);
}

#[test]
fn movetext_round_trip() {
    let mut s = Session::new();
    s.load_movetext(GIUOCO, PgnMeta::default()).expect("valid movetext");
    let expected = sans(&[
        "e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "c3", "Nf6", "d4", "exd4", "cxd4", "Bb4+",
        "Bd2", "Bxd2+", "Nbxd2", "d5", "exd5", "Nxd5", "Qb3", "Nce7", "O-O", "O-O", "Rfe1", "c6",
    ]);
    assert_eq!(s.mode(), Mode::PgnLoaded);
    assert_eq!(s.source(), &Source::Pgn { name: Some("Moller vs Student".to_string()) });
    assert_eq!(s.mainline().len(), expected.len() + 1);
    let got: Vec<String> = s.mainline_moves().into_iter().map(|m| m.san).collect();
    assert_eq!(got, expected);
    assert_eq!(s.current_node_id(), *s.mainline().last().unwrap());
    assert_eq!(s.current_node().ply as usize, expected.len());
    s.tree().validate().expect("well-formed");
}

#[test]
fn movetext_name_from_caller_wins() {
    let mut s = Session::new();
    s.load_movetext(GIUOCO, PgnMeta { name: Some("training".to_string()) }).unwrap();
    assert_eq!(s.source(), &Source::Pgn { name: Some("training".to_string()) });
}

#[test]
fn empty_and_moveless_movetext_are_invalid() {
    let mut s = Session::new();
    let err = s.load_movetext("   \n", PgnMeta::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPgn);

    let err = s.load_movetext("[Event \"x\"]\n\n*", PgnMeta::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPgn);
    match err {
        ExplorerError::InvalidPgn { preview, .. } => assert!(preview.is_some()),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(s.mode(), Mode::Free);
}

#[test]
fn unparseable_movetext_does_not_mutate() {
    let mut s = Session::new();
    s.apply_move(&MoveAttempt::new("d2", "d4")).unwrap();
    let err = s.load_movetext("1. e4 (1. d4", PgnMeta::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPgn);
    assert_eq!(s.tree().len(), 2);
    assert_eq!(s.current_node().incoming_move.as_ref().unwrap().san, "d4");
}

#[test]
fn illegal_move_in_movetext_resets_session() {
    let mut s = Session::new();
    s.apply_move(&MoveAttempt::new("d2", "d4")).unwrap();
    let err = s.load_movetext("1. e4 e5 2. Ke3", PgnMeta::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPgn);
    assert!(err.to_string().contains("Ke3"), "message: {err}");
    assert_eq!(s.mode(), Mode::Free);
    assert_eq!(s.source(), &Source::Free);
    assert_eq!(s.tree().len(), 1);
    assert_eq!(s.current_fen(), START_FEN);
}

#[test]
fn oversized_movetext_is_rejected() {
    let params = chess_explorer::SessionParams { max_movetext_bytes: 8, ..Default::default() };
    let mut s = Session::with_params(chess_explorer::ShakmatyRules, params);
    let err = s.load_movetext("1. e4 e5 2. Nf3", PgnMeta::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPgn);
}

#[test]
fn fen_tag_sets_the_start_position() {
    let mut s = Session::new();
    let doc = "[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/4P3/4K3 w - - 0 1\"]\n\n1. e4 Kd7";
    s.load_movetext(doc, PgnMeta::default()).expect("valid");
    assert_eq!(s.root_fen(), "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
    assert_eq!(s.mainline().len(), 3);

    let mut s = Session::new();
    let err = s.load_movetext("[FEN \"garbage\"]\n\n1. e4", PgnMeta::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPgn);
}

#[test]
fn loaders_are_gated_outside_free_mode() {
    let mut s = Session::new();
    s.load_move_list(&sans(&["e4", "e5", "Nf3"]), MoveListMeta::new("game-42")).expect("valid list");
    assert_eq!(s.mode(), Mode::DbLoaded);
    assert_eq!(s.source(), &Source::Db { game_id: "game-42".to_string() });

    let tree_len = s.tree().len();
    let cursor = s.current_node_id();
    let attempts = [
        s.load_position(START_FEN).unwrap_err(),
        s.load_movetext(GIUOCO, PgnMeta::default()).unwrap_err(),
        s.load_move_list(&sans(&["d4"]), MoveListMeta::new("other")).unwrap_err(),
        s.load_snapshot(&GameSnapshot::new("snap", sans(&["d4"]))).unwrap_err(),
    ];
    for err in attempts {
        assert_eq!(err, ExplorerError::ResetRequired { mode: Mode::DbLoaded });
    }
    assert_eq!(s.mode(), Mode::DbLoaded);
    assert_eq!(s.tree().len(), tree_len);
    assert_eq!(s.current_node_id(), cursor);

    s.load_initial().expect("reset always allowed");
    assert_eq!(s.mode(), Mode::Free);
    assert_eq!(s.tree().len(), 1);
    s.load_movetext(GIUOCO, PgnMeta::default()).expect("free again");
    assert_eq!(s.mode(), Mode::PgnLoaded);
    let err = s.load_move_list(&sans(&["e4"]), MoveListMeta::new("g")).unwrap_err();
    assert_eq!(err, ExplorerError::ResetRequired { mode: Mode::PgnLoaded });
}

#[test]
fn move_list_requires_id_and_moves() {
    let mut s = Session::new();
    let err = s.load_move_list(&sans(&["e4"]), MoveListMeta::new("  ")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InternalError);
    let err = s.load_move_list(&[], MoveListMeta::new("g1")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPgn);
    assert_eq!(s.mode(), Mode::Free);
}

#[test]
fn illegal_move_list_resets_session() {
    let mut s = Session::new();
    let err = s.load_move_list(&sans(&["e4", "e4"]), MoveListMeta::new("bad")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPgn);
    assert_eq!(s.mode(), Mode::Free);
    assert_eq!(s.tree().len(), 1);
}

#[test]
fn move_list_from_alternate_start() {
    let mut s = Session::new();
    let meta = MoveListMeta {
        game_id: "endgame-1".to_string(),
        start_fen: Some("4k3/8/8/8/8/8/4P3/4K3 b - - 0 7".to_string()),
        snapshot: None,
    };
    s.load_move_list(&sans(&["Kd7", "e4"]), meta).expect("valid");
    assert_eq!(s.root_fen(), "4k3/8/8/8/8/8/4P3/4K3 b - - 0 7");
    assert_eq!(s.current_node().ply, 2);
}

#[test]
fn snapshot_is_loaded_and_retained() {
    let snapshot = GameSnapshot::from_json(SNAPSHOT).expect("valid snapshot");
    assert_eq!(snapshot.headers.white.as_deref(), Some("Alice"));
    assert_eq!(snapshot.headers.time_control.as_deref(), Some("300+3"));
    assert!(snapshot.headers.extra.contains_key("rated"));
    assert_eq!(snapshot.analysis_at(1).and_then(|a| a.eval_cp), Some(30));

    let mut s = Session::new();
    s.load_snapshot(&snapshot).expect("load");
    assert_eq!(s.mode(), Mode::DbLoaded);
    assert_eq!(s.source(), &Source::Db { game_id: "lichess:abcd1234".to_string() });
    assert_eq!(s.mainline().len(), 11);
    assert_eq!(s.snapshot(), Some(&snapshot));
}

#[test]
fn malformed_snapshots_are_internal_errors() {
    let missing_id = r#"{"schemaVersion":1,"kind":"DB","movesSan":["e4"]}"#;
    assert_eq!(GameSnapshot::from_json(missing_id).unwrap_err().code(), ErrorCode::InternalError);

    let wrong_version = r#"{"schemaVersion":2,"kind":"DB","gameId":"g","movesSan":["e4"]}"#;
    assert_eq!(GameSnapshot::from_json(wrong_version).unwrap_err().code(), ErrorCode::InternalError);

    let mut s = Session::new();
    let mut snap = GameSnapshot::new("g", sans(&["e4"]));
    snap.kind = "PGN".to_string();
    assert_eq!(s.load_snapshot(&snap).unwrap_err().code(), ErrorCode::InternalError);
    assert_eq!(s.mode(), Mode::Free);
}

#[test]
fn snapshot_json_round_trips() {
    let snapshot = GameSnapshot::from_json(SNAPSHOT).unwrap();
    let again = GameSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
    assert_eq!(again, snapshot);
}

#[test]
fn zero_castling_glued_to_its_move_number() {
    let mut s = Session::new();
    s.load_movetext("1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4.0-0 Nf6", PgnMeta::default()).expect("valid movetext");
    let got: Vec<String> = s.mainline_moves().into_iter().map(|m| m.san).collect();
    assert_eq!(got[6], "O-O");
    assert_eq!(got[7], "Nf6");
    assert_eq!(s.mainline_moves()[6].uci, "e1g1");
}
