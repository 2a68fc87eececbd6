use opal_chess::board::{Move, Position};
use opal_chess::evaluation::evaluate;
use opal_chess::move_generator::{CastlingRule, MoveGenerator};
use opal_chess::types::{CastlingRights, Side, Wing};

fn legal_texts(generator: &MoveGenerator, fen: &str) -> Vec<String> {
    let mut position = Position::from_fen(fen).unwrap();
    generator.legal_moves(&mut position).iter().map(Move::to_string).collect()
}

fn play(position: &mut Position, moves: &[&str]) {
    for text in moves {
        let mv = position.parse_move(text).unwrap();
        position.apply_move(&mv);
    }
}

#[test]
fn start_position_scenario() {
    let generator = MoveGenerator::new();
    let mut position = Position::new();
    assert_eq!(generator.legal_moves(&mut position).len(), 20);
    assert!(evaluate(&position).abs() < 1e-4);

    let before = position.clone();
    play(&mut position, &["e2e4"]);
    assert_eq!(position.side_to_move(), Side::Black);
    position.undo_move();
    assert_eq!(position, before);
}

#[test]
fn back_rank_mate_is_checkmate() {
    let generator = MoveGenerator::new();
    let mut mated = Position::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b").unwrap();
    assert!(generator.is_in_check(&mated, Side::Black));
    assert!(generator.is_checkmate(&mut mated));
    assert!(!generator.is_stalemate(&mut mated));

    // Without the f7 pawn the king escapes
    let mut escape = Position::from_fen("R5k1/6pp/8/8/8/8/8/6K1 b").unwrap();
    assert!(generator.is_in_check(&escape, Side::Black));
    assert!(!generator.is_checkmate(&mut escape));
    assert_eq!(legal_texts(&generator, "R5k1/6pp/8/8/8/8/8/6K1 b"), vec!["g8f7".to_string()]);
}

#[test]
fn cornered_king_is_stalemated() {
    let generator = MoveGenerator::new();
    let mut position = Position::from_fen("k7/8/1Q6/8/8/8/8/7K b").unwrap();
    assert!(!generator.is_in_check(&position, Side::Black));
    assert!(generator.is_stalemate(&mut position));
    assert!(!generator.is_checkmate(&mut position));
}

#[test]
fn castling_through_an_attacked_square() {
    let fen = "4k3/5r2/8/8/8/8/8/4K2R w";
    let path_only = legal_texts(&MoveGenerator::new(), fen);
    let strict = legal_texts(&MoveGenerator::with_castling_rule(CastlingRule::Strict), fen);
    assert!(path_only.contains(&"e1g1".to_string()));
    assert!(!strict.contains(&"e1g1".to_string()));
}

#[test]
fn castling_out_of_check() {
    let fen = "4k3/4r3/8/8/8/8/8/4K2R w";
    let path_only = legal_texts(&MoveGenerator::new(), fen);
    let strict = legal_texts(&MoveGenerator::with_castling_rule(CastlingRule::Strict), fen);
    assert!(path_only.contains(&"e1g1".to_string()));
    assert!(!strict.contains(&"e1g1".to_string()));
}

#[test]
fn castling_into_check_is_never_legal() {
    let fen = "4k3/6r1/8/8/8/8/8/4K2R w";
    for rule in [CastlingRule::PathOnly, CastlingRule::Strict] {
        let moves = legal_texts(&MoveGenerator::with_castling_rule(rule), fen);
        assert!(!moves.contains(&"e1g1".to_string()), "{:?}", rule);
    }
}

#[test]
fn castling_needs_an_empty_path() {
    let generator = MoveGenerator::new();
    assert!(!legal_texts(&generator, "4k3/8/8/8/8/8/8/4K1NR w").contains(&"e1g1".to_string()));
    assert!(legal_texts(&generator, "r3k3/8/8/8/8/8/8/4K3 b").contains(&"e8c8".to_string()));
    assert!(!legal_texts(&generator, "rn2k3/8/8/8/8/8/8/4K3 b").contains(&"e8c8".to_string()));
}

#[test]
fn king_walk_forfeits_castling() {
    let generator = MoveGenerator::new();
    let mut position = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w").unwrap();
    assert!(position.castling_rights().has(Side::White, Wing::Kingside));

    play(&mut position, &["e1f1", "e8d8", "f1e1", "d8e8"]);
    assert_eq!(position.castling_rights(), CastlingRights::NONE);
    let moves: Vec<String> = generator.legal_moves(&mut position).iter().map(Move::to_string).collect();
    assert!(!moves.contains(&"e1g1".to_string()));

    for _ in 0..4 {
        position.undo_move();
    }
    assert!(position.castling_rights().has(Side::White, Wing::Kingside));
}

#[test]
fn pinned_piece_cannot_move() {
    let generator = MoveGenerator::new();
    let moves = legal_texts(&generator, "4k3/4r3/8/8/8/8/4B3/4K3 w");
    assert!(moves.iter().all(|m| !m.starts_with("e2")));
}

#[test]
fn queen_promotion_is_the_only_promotion() {
    let generator = MoveGenerator::new();
    let mut position = Position::from_fen("7k/P7/8/8/8/8/8/K7 w").unwrap();
    let promotions: Vec<Move> = generator
        .legal_moves(&mut position)
        .into_iter()
        .filter(|m| m.is_promotion())
        .collect();
    assert_eq!(promotions.len(), 1);
    position.apply_move(&promotions[0]);
    assert_eq!(position.to_fen(), "Q6k/8/8/8/8/8/8/K7 b -");
}
