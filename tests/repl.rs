use chess_explorer::repl::{Explorer, Reply};
use chess_explorer::{Session, START_FEN};
use pretty_assertions::assert_eq;

fn explorer() -> Explorer<chess_explorer::ShakmatyRules> {
    Explorer::new(Session::new())
}

fn one(reply: Reply) -> String {
    match reply {
        Reply::Lines(mut lines) => {
            assert_eq!(lines.len(), 1, "expected one line, got {lines:?}");
            lines.remove(0)
        }
        Reply::Quit => panic!("unexpected quit"),
    }
}

#[test]
fn moves_and_navigation() {
    let mut ex = explorer();
    assert_eq!(one(ex.execute("move e2e4")), "n2 e4 e2e4");
    assert_eq!(one(ex.execute("prev")), "n1 start");
    assert_eq!(one(ex.execute("prev")), "= n1 start");
    assert_eq!(one(ex.execute("move e2e4")), "n2 e4 e2e4 (existing)");
    assert_eq!(one(ex.execute("move d7d5")), "n3 d5 d7d5");
    assert_eq!(one(ex.execute("start")), "n1 start");
    assert_eq!(one(ex.execute("end")), "n3 d5");
    assert_eq!(one(ex.execute("ply 1")), "n2 e4");
    assert_eq!(one(ex.execute("node n3")), "n3 d5");
    assert_eq!(one(ex.execute("next")), "= n3 d5");
}

#[test]
fn errors_carry_codes() {
    let mut ex = explorer();
    assert!(one(ex.execute("move e2e5")).starts_with("error ILLEGAL_MOVE:"));
    assert!(one(ex.execute("move e2")).starts_with("error ILLEGAL_MOVE:"));
    assert!(one(ex.execute("fen nonsense")).starts_with("error INVALID_FEN:"));
    assert_eq!(one(ex.execute("frobnicate")), "error: unknown command 'frobnicate'");
    assert!(one(ex.execute("node bogus")).starts_with("error: bad node id"));
    assert!(one(ex.execute("ply x")).starts_with("error: bad ply"));
}

#[test]
fn loads_are_gated_until_reset() {
    let mut ex = explorer();
    assert_eq!(one(ex.execute("game g-1 e4 e5 Nf3")), "ok 4 nodes, at n4");
    assert!(one(ex.execute(&format!("fen {START_FEN}"))).starts_with("error RESET_REQUIRED:"));
    assert_eq!(one(ex.execute("reset")), "ok 1 nodes, at n1");
    assert_eq!(one(ex.execute("fen 4k3/8/8/8/8/8/4P3/4K3 w - - 0 1")), "ok 1 nodes, at n1");
    assert_eq!(one(ex.execute("captures")), r#"{"status":"not_applicable"}"#);
}

#[test]
fn promotion_round_trip() {
    let mut ex = explorer();
    ex.execute("fen 8/4P3/8/8/8/8/k7/4K3 w - - 0 1");
    assert_eq!(one(ex.execute("move e7e8")), "error PROMOTION_REQUIRED: promotion required (options: q,r,b,n)");
    assert_eq!(one(ex.execute("move e7e8q")), "n2 e8=Q e7e8q");
}

#[test]
fn json_views() {
    let mut ex = explorer();
    ex.execute("move e2e4");
    let moves: serde_json::Value = serde_json::from_str(&one(ex.execute("moves"))).unwrap();
    assert_eq!(moves["rows"][0]["white"]["label"], "1.e4");
    assert_eq!(moves["currentNodeId"], "n2");

    let material: serde_json::Value = serde_json::from_str(&one(ex.execute("material"))).unwrap();
    assert_eq!(material["whiteScore"], 39);

    let hints: serde_json::Value = serde_json::from_str(&one(ex.execute("hints g8"))).unwrap();
    assert_eq!(hints["destinations"], serde_json::json!(["f6", "h6"]));
}

#[test]
fn show_describes_the_cursor() {
    let mut ex = explorer();
    ex.execute("move g1f3");
    let Reply::Lines(lines) = ex.execute("show") else { panic!("show never quits") };
    assert_eq!(lines[0], "node n2 ply 1 last Nf3");
    assert_eq!(lines[1], "fen rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq - 1 1");
    assert!(lines[2].starts_with("key "));
    assert_eq!(lines[3], r#"mode Free source {"kind":"FREE"}"#);
}

#[test]
fn run_stops_at_quit() {
    let mut ex = explorer();
    let input = "move e2e4\n\nshow\nquit\nmove d7d5\n";
    let mut out = Vec::new();
    ex.run(input.as_bytes(), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("n2 e4 e2e4\n"));
    assert!(text.contains("node n2 ply 1 last e4"));
    assert_eq!(text.lines().count(), 5);
    assert_eq!(ex.session().tree().len(), 2);
    assert_eq!(ex.execute("exit"), Reply::Quit);
}

#[test]
fn pgn_file_is_named_from_its_tags() {
    let mut ex = explorer();
    assert_eq!(one(ex.execute("pgn tests/data/giuoco_piano.pgn")), "ok 25 nodes, at n25");
    let Reply::Lines(lines) = ex.execute("show") else { panic!("show never quits") };
    assert_eq!(lines[3], r#"mode PgnLoaded source {"kind":"PGN","name":"Moller vs Student"}"#);
}
