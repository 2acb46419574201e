use std::io::{self, BufRead, Write};

use crate::board::{MoveAttempt, RulesEngine};
use crate::error::ExplorerError;
use crate::session::{MoveListMeta, PgnMeta, Session};
use crate::snapshot::GameSnapshot;
use crate::tree::NodeId;

/// What one command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Lines(Vec<String>),
    Quit,
}

impl Reply {
    fn line(s: impl Into<String>) -> Self { Reply::Lines(vec![s.into()]) }
}

/// Line-oriented driver over one session.
pub struct Explorer<R: RulesEngine> {
    session: Session<R>,
}

fn error_line(e: &ExplorerError) -> String {
    format!("error {}: {}", e.code().as_str(), e)
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("error INTERNAL_ERROR: {e}"))
}

impl<R: RulesEngine> Explorer<R> {
    pub fn new(session: Session<R>) -> Self { Self { session } }

    pub fn session(&self) -> &Session<R> { &self.session }

    pub fn session_mut(&mut self) -> &mut Session<R> { &mut self.session }

    fn cmd_show(&self) -> Reply {
        let node = self.session.current_node();
        let last = node.incoming_move.as_ref().map(|m| m.san.as_str()).unwrap_or("-");
        Reply::Lines(vec![
            format!("node {} ply {} last {}", node.id, node.ply, last),
            format!("fen {}", node.fen),
            format!("key {}", node.position_key),
            format!("mode {:?} source {}", self.session.mode(), to_json(self.session.source())),
        ])
    }

    fn cmd_move(&mut self, args: &str) -> Reply {
        let Some(attempt) = MoveAttempt::parse_uci(args) else {
            return Reply::line(format!("error ILLEGAL_MOVE: cannot read move '{args}'"));
        };
        match self.session.apply_move(&attempt) {
            Ok(out) => Reply::line(format!("{} {} {}{}", out.node_id, out.san, out.uci, if out.reused { " (existing)" } else { "" })),
            Err(e) => Reply::line(error_line(&e)),
        }
    }

    fn cmd_pgn(&mut self, path: &str) -> Reply {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => return Reply::line(format!("error INVALID_PGN: cannot read {path}: {e}")),
        };
        let loaded = self.session.load_movetext(&text, PgnMeta::default());
        self.report(loaded)
    }

    fn cmd_snapshot(&mut self, path: &str) -> Reply {
        let loaded = std::fs::read_to_string(path)
            .map_err(|e| ExplorerError::Internal(format!("cannot read {path}: {e}")))
            .and_then(|text| GameSnapshot::from_json(&text))
            .and_then(|snap| self.session.load_snapshot(&snap));
        self.report(loaded)
    }

    fn cmd_game(&mut self, args: &str) -> Reply {
        let mut tokens = args.split_whitespace();
        let game_id = tokens.next().unwrap_or_default().to_string();
        let moves: Vec<String> = tokens.map(str::to_string).collect();
        let loaded = self.session.load_move_list(&moves, MoveListMeta::new(game_id));
        self.report(loaded)
    }

    fn report(&self, result: crate::error::Result<()>) -> Reply {
        match result {
            Ok(()) => Reply::line(format!("ok {} nodes, at {}", self.session.tree().len(), self.session.current_node_id())),
            Err(e) => Reply::line(error_line(&e)),
        }
    }

    fn moved(&self, moved: bool) -> Reply {
        let node = self.session.current_node();
        let last = node.incoming_move.as_ref().map(|m| m.san.as_str()).unwrap_or("start");
        Reply::line(format!("{}{} {}", if moved { "" } else { "= " }, node.id, last))
    }

    pub fn execute(&mut self, line: &str) -> Reply {
        let line = line.trim();
        let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match cmd {
            "" => Reply::Lines(Vec::new()),
            "quit" | "exit" => Reply::Quit,
            "reset" => { let r = self.session.load_initial(); self.report(r) }
            "fen" => { let r = self.session.load_position(rest); self.report(r) }
            "pgn" => self.cmd_pgn(rest),
            "snapshot" => self.cmd_snapshot(rest),
            "game" => self.cmd_game(rest),
            "move" => self.cmd_move(rest),
            "prev" => { let m = self.session.go_prev(); self.moved(m) }
            "next" => { let m = self.session.go_next(); self.moved(m) }
            "start" => { self.session.go_start(); self.moved(true) }
            "end" => { self.session.go_end(); self.moved(true) }
            "ply" => match rest.parse::<i64>() {
                Ok(n) => { self.session.go_to_ply(n); self.moved(true) }
                Err(_) => Reply::line(format!("error: bad ply '{rest}'")),
            },
            "node" => match rest.parse::<NodeId>() {
                Ok(id) => { let m = self.session.go_to_node(id); self.moved(m) }
                Err(_) => Reply::line(format!("error: bad node id '{rest}'")),
            },
            "var+" => { let m = self.session.go_next_variation(); self.moved(m) }
            "var-" => { let m = self.session.go_prev_variation(); self.moved(m) }
            "show" => self.cmd_show(),
            "moves" => Reply::line(to_json(&self.session.move_list_view())),
            "material" => Reply::line(to_json(&self.session.material())),
            "captures" => Reply::line(to_json(&self.session.captured_pieces())),
            "hints" => Reply::line(to_json(&self.session.legal_hints(rest))),
            other => Reply::line(format!("error: unknown command '{other}'")),
        }
    }

    pub fn run<I: BufRead, O: Write>(&mut self, input: I, mut out: O) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            match self.execute(&line) {
                Reply::Quit => break,
                Reply::Lines(lines) => {
                    for l in lines { writeln!(out, "{l}")?; }
                    out.flush()?;
                }
            }
        }
        Ok(())
    }

    pub fn run_loop(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run(stdin.lock(), stdout.lock())
    }
}
