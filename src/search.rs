//! OpalChess - Search Engine Module
//!
//! This module implements move selection using:
//! - Negamax with alpha-beta pruning
//! - Quiescence search over captures at the horizon
//! - Static move ordering (captures by victim value, promotions)
//! - Late Move Reductions (LMR)
//!
//! The search works on a single `Position` in place. Every `apply_move` made
//! below the root is paired with exactly one `undo_move` before the frame that
//! made it returns, so the history length on leaving a node always equals the
//! length on entering it.

use log::{debug, trace};

use crate::board::{Move, Position};
use crate::evaluation::{evaluate_move, evaluate_with, EvalConfig};
use crate::move_generator::MoveGenerator;

// Constants for search
pub const INFINITY: f32 = f32::INFINITY;
pub const MATE_SCORE: f32 = 100_000.0;
pub const DEFAULT_DEPTH: u32 = 4;
pub const QUIESCENCE_HORIZON: u32 = 4;

// Late Move Reductions
const LMR_FULL_DEPTH_MOVES: usize = 3;
const LMR_REDUCTION_LIMIT: u32 = 3;
const LMR_INTEREST_THRESHOLD: u32 = 1;

/// Score of the side to move when it is checkmated with `depth` plies left.
///
/// More remaining depth means the mate happens closer to the root, so it
/// scores lower: the mated side prefers later mates and the mating side
/// prefers sooner ones.
#[inline]
pub fn mated_score(depth: u32) -> f32 {
    -(MATE_SCORE + depth as f32)
}

/// Search switches
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchConfig {
    pub depth: u32,
    pub quiescence_horizon: u32,
    pub late_move_reduction: bool,
    pub eval: EvalConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            depth: DEFAULT_DEPTH,
            quiescence_horizon: QUIESCENCE_HORIZON,
            late_move_reduction: true,
            eval: EvalConfig::default(),
        }
    }
}

/// Counters for the most recent search
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub quiescence_nodes: u64,
    pub cutoffs: u64,
    pub reductions: u64,
}

/// Outcome of a root search
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchResult {
    /// `None` when the side to move has no legal move
    pub best_move: Option<Move>,
    /// Score of `best_move` for the side to move
    pub score: f32,
    pub stats: SearchStats,
}

pub struct SearchEngine {
    move_generator: MoveGenerator,
    pub config: SearchConfig,
    pub stats: SearchStats,
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        SearchEngine {
            move_generator: MoveGenerator::new(),
            config,
            stats: SearchStats::default(),
        }
    }

    pub fn set_move_generator(&mut self, move_generator: MoveGenerator) {
        self.move_generator = move_generator;
    }

    /// Pick the best move for the side to move, `None` if there is none
    pub fn choose_move(&mut self, position: &Position, depth: u32) -> Option<Move> {
        self.search(position, depth).best_move
    }

    /// Search every legal root move to `depth` plies with a full window.
    ///
    /// Works on a copy; `position` is never modified. The first move reaching
    /// the highest score wins.
    pub fn search(&mut self, position: &Position, depth: u32) -> SearchResult {
        self.stats = SearchStats::default();

        let mut board = position.clone();
        let moves = self.move_generator.legal_moves(&mut board);
        if moves.is_empty() {
            let side = board.side_to_move();
            let score = if self.move_generator.is_in_check(&board, side) {
                mated_score(depth)
            } else {
                0.0
            };
            debug!("no legal move for {} (score {})", side, score);
            return SearchResult { best_move: None, score, stats: self.stats };
        }

        let mut best_move = None;
        let mut best_score = -INFINITY;

        for mv in moves {
            board.apply_move(&mv);
            let score = -self.negamax(&mut board, depth.saturating_sub(1), -INFINITY, INFINITY);
            board.undo_move();

            trace!("root {} score {:.2}", mv, score);

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
        }

        debug!(
            "depth {} nodes {} qnodes {} cutoffs {} reductions {} best {} score {:.2}",
            depth,
            self.stats.nodes,
            self.stats.quiescence_nodes,
            self.stats.cutoffs,
            self.stats.reductions,
            best_move.map_or_else(|| "none".to_string(), |m| m.to_string()),
            best_score
        );

        SearchResult { best_move, score: best_score, stats: self.stats }
    }

    /// Negamax with alpha-beta pruning. Score is for the side to move.
    pub fn negamax(&mut self, board: &mut Position, depth: u32, mut alpha: f32, beta: f32) -> f32 {
        if depth == 0 {
            return self.quiescence(board, alpha, beta, self.config.quiescence_horizon);
        }

        self.stats.nodes += 1;
        let entry_depth = board.history_len();
        let side = board.side_to_move();

        // Checkmate / Stalemate
        if !self.move_generator.has_legal_move(board) {
            return if self.move_generator.is_in_check(board, side) {
                mated_score(depth)
            } else {
                0.0
            };
        }

        let moves = self.order_moves(board, self.move_generator.pseudo_legal_moves(board, side));

        let mut best_score = -INFINITY;
        let mut moves_searched = 0usize;

        for mv in moves {
            let is_capture = !board.piece_at(mv.to).is_empty();

            board.apply_move(&mv);
            if self.move_generator.is_in_check(board, side) {
                board.undo_move();
                continue;
            }

            // Late Move Reductions
            let gives_check = self.move_generator.is_in_check(board, side.opponent());
            let interest = is_capture as u32 + gives_check as u32;
            let mut child_depth = depth - 1;
            if self.config.late_move_reduction
                && interest < LMR_INTEREST_THRESHOLD
                && depth >= LMR_REDUCTION_LIMIT
                && moves_searched >= LMR_FULL_DEPTH_MOVES
            {
                child_depth -= 1;
                self.stats.reductions += 1;
            }

            let score = -self.negamax(board, child_depth, -beta, -alpha);
            board.undo_move();
            moves_searched += 1;

            if score > best_score {
                best_score = score;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                self.stats.cutoffs += 1;
                break;
            }
        }

        debug_assert_eq!(board.history_len(), entry_depth, "apply/undo imbalance in negamax");
        best_score
    }

    /// Capture-only search below the horizon, bounded by `horizon` plies.
    pub fn quiescence(&mut self, board: &mut Position, mut alpha: f32, beta: f32, horizon: u32) -> f32 {
        self.stats.quiescence_nodes += 1;

        let stand_pat = self.relative_eval(board);
        if stand_pat >= beta {
            return stand_pat;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }
        if horizon == 0 {
            return stand_pat;
        }

        let entry_depth = board.history_len();
        let side = board.side_to_move();

        // Only search captures
        let captures: Vec<Move> = self
            .move_generator
            .pseudo_legal_moves(board, side)
            .into_iter()
            .filter(|m| !board.piece_at(m.to).is_empty())
            .collect();
        let captures = self.order_moves(board, captures);

        let mut best_score = stand_pat;
        for mv in captures {
            board.apply_move(&mv);
            if self.move_generator.is_in_check(board, side) {
                board.undo_move();
                continue;
            }
            let score = -self.quiescence(board, -beta, -alpha, horizon - 1);
            board.undo_move();

            if score > best_score {
                best_score = score;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                self.stats.cutoffs += 1;
                break;
            }
        }

        debug_assert_eq!(board.history_len(), entry_depth, "apply/undo imbalance in quiescence");
        best_score
    }

    /// Static evaluation from the side to move's point of view
    pub fn relative_eval(&self, board: &Position) -> f32 {
        board.side_to_move().sign() * evaluate_with(board, &self.config.eval)
    }

    /// Sort by ordering score, highest first; equal scores keep generation order
    fn order_moves(&self, board: &Position, moves: Vec<Move>) -> Vec<Move> {
        let mut scored: Vec<(Move, f32)> = moves
            .into_iter()
            .map(|m| (m, evaluate_move(board, &m)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.into_iter().map(|(m, _)| m).collect()
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        SearchEngine::new(SearchConfig::default())
    }
}
