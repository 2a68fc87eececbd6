//! OpalChess - UCI Protocol Module
//!
//! This module implements a line-oriented subset of the Universal Chess
//! Interface (UCI) protocol, plus a few debugging commands (`d`, `eval`,
//! `perft`, `undo`).
//!
//! Responses are collected per command so the handler can be driven from
//! tests as well as from stdin.

use std::io::{self, BufRead, Write};

use log::{info, warn};

use crate::bitboard::format_square_set;
use crate::board::{Move, Position};
use crate::error::{ChessError, ChessResult};
use crate::evaluation::evaluate_with;
use crate::move_generator::{CastlingRule, MoveGenerator};
use crate::search::{SearchConfig, SearchEngine, SearchResult, MATE_SCORE};

// Engine identification
const ENGINE_NAME: &str = "OpalChess";
const ENGINE_AUTHOR: &str = "OpalChess developers";
const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

const MAX_DEPTH: i32 = 12;

/// Value domain of a UCI option
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionKind {
    Spin { min: i32, max: i32 },
    Check,
}

/// One entry of the engine's option table
#[derive(Clone, Debug)]
pub struct UCIOption {
    pub name: &'static str,
    pub kind: OptionKind,
    pub default: String,
    pub value: String,
}

impl UCIOption {
    pub fn spin(name: &'static str, default: i32, min: i32, max: i32) -> Self {
        UCIOption {
            name,
            kind: OptionKind::Spin { min, max },
            default: default.to_string(),
            value: default.to_string(),
        }
    }

    pub fn check(name: &'static str, default: bool) -> Self {
        UCIOption {
            name,
            kind: OptionKind::Check,
            default: default.to_string(),
            value: default.to_string(),
        }
    }

    /// The `option name ...` line announced in reply to `uci`
    pub fn to_uci_string(&self) -> String {
        match self.kind {
            OptionKind::Spin { min, max } => format!(
                "option name {} type spin default {} min {} max {}",
                self.name, self.default, min, max
            ),
            OptionKind::Check => format!("option name {} type check default {}", self.name, self.default),
        }
    }

    /// Store a new value; false if it does not parse or is out of range
    pub fn set_value(&mut self, text: &str) -> bool {
        let accepted = match self.kind {
            OptionKind::Spin { min, max } => text
                .parse::<i32>()
                .ok()
                .filter(|v| (min..=max).contains(v))
                .map(|v| v.to_string()),
            OptionKind::Check => {
                let lower = text.to_ascii_lowercase();
                matches!(lower.as_str(), "true" | "false").then_some(lower)
            }
        };
        match accepted {
            Some(value) => {
                self.value = value;
                true
            }
            None => false,
        }
    }

    pub fn as_int(&self) -> i32 {
        self.value.parse().unwrap_or(0)
    }

    pub fn as_bool(&self) -> bool {
        self.value == "true"
    }
}

/// UCI protocol handler
pub struct UCIProtocol {
    position: Position,
    move_generator: MoveGenerator,
    search_engine: SearchEngine,
    running: bool,
    debug_mode: bool,
    options: Vec<UCIOption>,
    output: Vec<String>,
}

impl UCIProtocol {
    pub fn new() -> Self {
        let mut protocol = UCIProtocol {
            position: Position::new(),
            move_generator: MoveGenerator::new(),
            search_engine: SearchEngine::new(SearchConfig::default()),
            running: true,
            debug_mode: false,
            options: Vec::new(),
            output: Vec::new(),
        };

        protocol.init_options();
        protocol.apply_options();
        protocol
    }

    fn init_options(&mut self) {
        let defaults = SearchConfig::default();
        self.options = vec![
            UCIOption::spin("Depth", defaults.depth as i32, 1, MAX_DEPTH),
            UCIOption::spin("QuiescenceHorizon", defaults.quiescence_horizon as i32, 0, 16),
            UCIOption::check("UseLMR", defaults.late_move_reduction),
            UCIOption::check("KingSafety", defaults.eval.king_safety),
            UCIOption::check("StrictCastling", false),
        ];
    }

    fn apply_options(&mut self) {
        for opt in &self.options {
            match opt.name {
                "Depth" => {
                    self.search_engine.config.depth = opt.as_int().max(1) as u32;
                }
                "QuiescenceHorizon" => {
                    self.search_engine.config.quiescence_horizon = opt.as_int().max(0) as u32;
                }
                "UseLMR" => {
                    self.search_engine.config.late_move_reduction = opt.as_bool();
                }
                "KingSafety" => {
                    self.search_engine.config.eval.king_safety = opt.as_bool();
                }
                "StrictCastling" => {
                    let rule = if opt.as_bool() { CastlingRule::Strict } else { CastlingRule::PathOnly };
                    self.move_generator = MoveGenerator::with_castling_rule(rule);
                }
                _ => {}
            }
        }
        self.search_engine.set_move_generator(self.move_generator);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn run(&mut self) {
        let stdin = io::stdin();
        let stdout = io::stdout();

        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if !line.is_empty() {
                let mut out = stdout.lock();
                for response in self.process_command(line) {
                    if writeln!(out, "{}", response).is_err() {
                        return;
                    }
                }
                out.flush().ok();
            }
            if !self.running {
                break;
            }
        }
    }

    /// Handle one command line and return the response lines
    pub fn process_command(&mut self, line: &str) -> Vec<String> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            return Vec::new();
        };

        match command {
            "uci" => self.cmd_uci(),
            "isready" => self.cmd_isready(),
            "setoption" => self.cmd_setoption(args),
            "ucinewgame" => self.cmd_ucinewgame(),
            "position" => self.cmd_position(args),
            "go" => self.cmd_go(args),
            "quit" => self.cmd_quit(),
            "debug" => self.cmd_debug(args),
            "d" => self.cmd_display(),
            "eval" => self.cmd_eval(),
            "perft" => self.cmd_perft(args),
            "undo" => self.cmd_undo(),
            _ => {
                warn!("unknown command: {}", command);
                if self.debug_mode {
                    self.send(format!("info string Unknown command: {}", command));
                }
            }
        }

        std::mem::take(&mut self.output)
    }

    fn send(&mut self, message: impl Into<String>) {
        self.output.push(message.into());
    }

    fn send_error(&mut self, err: &ChessError) {
        warn!("{}", err);
        self.send(format!("info string error: {}", err));
    }

    fn cmd_uci(&mut self) {
        self.send(format!("id name {} {}", ENGINE_NAME, ENGINE_VERSION));
        self.send(format!("id author {}", ENGINE_AUTHOR));

        let lines: Vec<String> = self.options.iter().map(UCIOption::to_uci_string).collect();
        for line in lines {
            self.send(line);
        }

        self.send("uciok");
    }

    /// `setoption name <name words> [value <value words>]`
    fn cmd_setoption(&mut self, args: &[&str]) {
        let Some((&"name", rest)) = args.split_first() else {
            return;
        };
        let (name_words, value_words) = match rest.iter().position(|&w| w == "value") {
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => (rest, &[][..]),
        };
        let name = name_words.join(" ");
        let value = value_words.join(" ");

        let Some(opt) = self.options.iter_mut().find(|o| o.name.eq_ignore_ascii_case(&name)) else {
            warn!("unknown option: {}", name);
            self.send(format!("info string error: unknown option {}", name));
            return;
        };

        if opt.set_value(&value) {
            info!("option {} set to {}", opt.name, opt.value);
            let confirmation = format!("info string Option {} set to {}", opt.name, opt.value);
            if self.debug_mode {
                self.send(confirmation);
            }
            self.apply_options();
        } else {
            let msg = format!("info string error: bad value {} for option {}", value, opt.name);
            warn!("{}", msg);
            self.send(msg);
        }
    }

    fn cmd_isready(&mut self) {
        self.send("readyok");
    }

    fn cmd_ucinewgame(&mut self) {
        self.position = Position::new();
    }

    fn cmd_position(&mut self, args: &[&str]) {
        match self.parse_position(args) {
            Ok(position) => {
                info!("position set: {}", position.to_fen());
                self.position = position;
            }
            Err(err) => self.send_error(&err),
        }
    }

    /// Build the position described by `position` arguments. The current
    /// position is only replaced once every move has been accepted.
    fn parse_position(&self, args: &[&str]) -> ChessResult<Position> {
        let moves_at = args.iter().position(|&a| a == "moves");
        let (setup, moves) = match moves_at {
            Some(i) => (&args[..i], &args[i + 1..]),
            None => (args, &[][..]),
        };

        let mut position = match setup.split_first() {
            Some((&"startpos", _)) => Position::new(),
            Some((&"fen", fen)) => Position::from_fen(&fen.join(" "))?,
            _ => return Err(ChessError::EmptyPosition),
        };

        for text in moves {
            let mv = self.parse_move(&mut position, text)?;
            position.apply_move(&mv);
        }

        Ok(position)
    }

    fn parse_move(&self, position: &mut Position, text: &str) -> ChessResult<Move> {
        let mv = position.parse_move(text)?;
        if !self.move_generator.is_valid_move(position, &mv) {
            return Err(ChessError::IllegalMove(text.to_string()));
        }
        Ok(mv)
    }

    fn cmd_go(&mut self, args: &[&str]) {
        let mut depth = self.search_engine.config.depth as i32;

        // Clock arguments are accepted and ignored: search is depth-limited
        let mut words = args.iter();
        while let Some(&word) = words.next() {
            if word == "depth" {
                if let Some(d) = words.next().and_then(|w| w.parse::<i32>().ok()) {
                    depth = d;
                }
            }
        }

        let depth = depth.clamp(0, MAX_DEPTH) as u32;
        let result = self.search_engine.search(&self.position, depth);

        self.send(format!(
            "info depth {} score {} nodes {}",
            depth,
            format_score(&result, depth),
            result.stats.nodes + result.stats.quiescence_nodes
        ));

        match result.best_move {
            Some(mv) => self.send(format!("bestmove {}", mv)),
            None => self.send("bestmove 0000"),
        }
    }

    fn cmd_quit(&mut self) {
        self.running = false;
    }

    fn cmd_debug(&mut self, args: &[&str]) {
        if let Some(&arg) = args.first() {
            self.debug_mode = arg == "on";
        }
    }

    fn cmd_display(&mut self) {
        let side = self.position.side_to_move();
        let in_check = self.move_generator.is_in_check(&self.position, side);
        let attacked = self.move_generator.attacked_squares(&self.position, side.opponent());
        let legal_moves = self.move_generator.legal_moves(&mut self.position);

        self.send(self.position.display());
        self.send(format!("FEN: {}", self.position.to_fen()));
        self.send(format!("In check: {}", in_check));
        self.send(format!("Legal moves: {}", legal_moves.len()));

        let move_list: Vec<String> = legal_moves.iter().map(|m| m.to_string()).collect();
        self.send(format!("Moves: {}", move_list.join(" ")));

        self.send(format!("Attacked by {}:", side.opponent()));
        self.send(format_square_set(attacked));
    }

    fn cmd_eval(&mut self) {
        let score = evaluate_with(&self.position, &self.search_engine.config.eval);
        self.send(format!("info string eval {:.2}", score));
    }

    fn cmd_perft(&mut self, args: &[&str]) {
        let depth = args.first().and_then(|s| s.parse::<u32>().ok()).unwrap_or(1);

        let mut position = self.position.clone();
        let nodes = self.move_generator.perft(&mut position, depth);
        self.send(format!("Nodes: {}", nodes));
    }

    /// Take back the last move applied through `position ... moves`
    fn cmd_undo(&mut self) {
        match self.position.try_undo_move() {
            Ok(record) => {
                info!("undid {}{}", record.from, record.to);
                self.send(format!("info string undo {}{}", record.from, record.to));
            }
            Err(err) => self.send_error(&err),
        }
    }
}

/// Format a root score as `cp N` or `mate N` (negative when being mated).
///
/// The mate distance is derived from the remaining depth at the mated node,
/// which only matches the ply count from the root when no line was reduced.
/// Reduced searches report mate scores as `cp`.
fn format_score(result: &SearchResult, depth: u32) -> String {
    let score = result.score;
    if score.abs() >= MATE_SCORE && result.stats.reductions == 0 {
        // Mate scores carry the remaining depth of the mated node
        let remaining = (score.abs() - MATE_SCORE).round() as i64;
        let plies = (depth as i64 - remaining).max(1);
        let moves = (plies + 1) / 2;
        if score > 0.0 {
            format!("mate {}", moves)
        } else {
            format!("mate -{}", moves)
        }
    } else {
        format!("cp {}", (score * 100.0).round() as i64)
    }
}

impl Default for UCIProtocol {
    fn default() -> Self {
        UCIProtocol::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(protocol: &mut UCIProtocol, line: &str) -> Vec<String> {
        protocol.process_command(line)
    }

    #[test]
    fn uci_lists_options() {
        let mut p = UCIProtocol::new();
        let out = run(&mut p, "uci");
        assert!(out[0].starts_with("id name OpalChess"));
        assert!(out.iter().any(|l| l == "option name Depth type spin default 4 min 1 max 12"));
        assert!(out.iter().any(|l| l == "option name StrictCastling type check default false"));
        assert_eq!(out.last().map(String::as_str), Some("uciok"));
        assert_eq!(run(&mut p, "isready"), vec!["readyok".to_string()]);
    }

    #[test]
    fn position_with_moves() {
        let mut p = UCIProtocol::new();
        assert!(run(&mut p, "position startpos moves e2e4 e7e5 g1f3").is_empty());
        assert_eq!(
            p.position().to_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq"
        );
        run(&mut p, "position fen 4k3/8/8/8/8/8/8/4K2R w K moves e1g1");
        assert_eq!(p.position().to_fen(), "4k3/8/8/8/8/8/8/5RK1 b -");
    }

    #[test]
    fn illegal_move_is_reported_and_ignored() {
        let mut p = UCIProtocol::new();
        run(&mut p, "position startpos moves e2e4");
        let before = p.position().clone();
        let out = run(&mut p, "position startpos moves e2e5");
        assert_eq!(out, vec!["info string error: Illegal move: e2e5".to_string()]);
        assert_eq!(p.position(), &before);

        let out = run(&mut p, "position fen rnbqkbnr/pppppppp/8/8 w");
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("info string error:"));
        assert_eq!(p.position(), &before);
    }

    #[test]
    fn go_finds_mate() {
        let mut p = UCIProtocol::new();
        run(&mut p, "position fen 6k1/5ppp/8/8/8/8/8/R5K1 w");
        let out = run(&mut p, "go depth 2");
        assert!(out[0].contains("score mate 1"));
        assert_eq!(out.last().map(String::as_str), Some("bestmove a1a8"));

        run(&mut p, "position fen R5k1/5ppp/8/8/8/8/8/6K1 b");
        let out = run(&mut p, "go depth 2");
        assert_eq!(out.last().map(String::as_str), Some("bestmove 0000"));
    }

    #[test]
    fn setoption_updates_engine() {
        let mut p = UCIProtocol::new();
        run(&mut p, "setoption name Depth value 2");
        assert_eq!(p.search_engine.config.depth, 2);
        run(&mut p, "setoption name UseLMR value false");
        assert!(!p.search_engine.config.late_move_reduction);
        run(&mut p, "setoption name StrictCastling value true");
        assert_eq!(p.move_generator.castling_rule, CastlingRule::Strict);

        let out = run(&mut p, "setoption name Depth value 99");
        assert!(out[0].starts_with("info string error"));
        assert_eq!(p.search_engine.config.depth, 2);
        let out = run(&mut p, "setoption name Hash value 16");
        assert_eq!(out, vec!["info string error: unknown option Hash".to_string()]);
    }

    #[test]
    fn perft_eval_and_display() {
        let mut p = UCIProtocol::new();
        assert_eq!(run(&mut p, "perft 2"), vec!["Nodes: 400".to_string()]);
        let out = run(&mut p, "eval");
        let score: f32 = out[0].trim_start_matches("info string eval ").parse().unwrap();
        assert!(score.abs() < 0.01);
        let out = run(&mut p, "d");
        assert!(out.iter().any(|l| l == "Legal moves: 20"));
        assert!(out.iter().any(|l| l == "In check: false"));
        assert!(out.iter().any(|l| l == "Attacked by black:"));
    }

    #[test]
    fn mate_distance_only_reported_for_unreduced_search() {
        let mut p = UCIProtocol::new();
        run(&mut p, "position fen 6k1/5ppp/8/8/8/8/8/R5K1 w");
        let out = run(&mut p, "go depth 4");
        assert!(out[0].contains("score cp "), "{}", out[0]);
        assert_eq!(out.last().map(String::as_str), Some("bestmove a1a8"));

        run(&mut p, "setoption name UseLMR value false");
        let out = run(&mut p, "go depth 4");
        assert!(out[0].contains("score mate 1"), "{}", out[0]);
        assert_eq!(out.last().map(String::as_str), Some("bestmove a1a8"));
    }

    #[test]
    fn undo_takes_back_the_last_move() {
        let mut p = UCIProtocol::new();
        run(&mut p, "position startpos moves e2e4 e7e5");
        assert_eq!(run(&mut p, "undo"), vec!["info string undo e7e5".to_string()]);
        assert_eq!(
            p.position().to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq"
        );
        run(&mut p, "undo");
        assert_eq!(p.position(), &Position::new());

        let out = run(&mut p, "undo");
        assert_eq!(out, vec!["info string error: Cannot undo: move history is empty".to_string()]);
        assert_eq!(p.position(), &Position::new());
    }

    #[test]
    fn quit_stops_the_loop() {
        let mut p = UCIProtocol::new();
        assert!(p.is_running());
        run(&mut p, "quit");
        assert!(!p.is_running());
    }
}
