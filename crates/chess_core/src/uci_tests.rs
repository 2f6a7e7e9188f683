use super::*;

#[test]
fn test_parse_plain_move() {
    let mv = MoveToken::parse("e2e4").unwrap();
    assert_eq!(mv.from, coord_to_sq("e2").unwrap());
    assert_eq!(mv.to, coord_to_sq("e4").unwrap());
    assert_eq!(mv.promotion, None);
    assert_eq!(mv.to_string(), "e2e4");
}

#[test]
fn test_parse_promotion() {
    let mv = MoveToken::parse("a7a8Q").unwrap();
    assert_eq!(mv.promotion, Some(PieceKind::Queen));
    assert_eq!(mv.to_string(), "a7a8q");
}

#[test]
fn test_strict_parse_rejects_noise() {
    for bad in ["", "e2", "e2e9", "i2e4", "e2e4#", "e2e4qq", "resign", NULL_MOVE] {
        assert!(MoveToken::parse(bad).is_none(), "accepted {bad:?}");
    }
}

#[test]
fn test_lenient_parse_skips_markers() {
    let mv = MoveToken::parse_lenient("e7e8q#").unwrap();
    assert_eq!(mv.promotion, Some(PieceKind::Queen));
    let mv = MoveToken::parse_lenient("d1h5=").unwrap();
    assert_eq!(mv.promotion, None);
}

#[test]
fn test_board_from_position_args() {
    let board = board_from_position_args(&["startpos", "moves", "e2e4", "e7e5"]);
    assert_eq!(board.side_to_move(), Color::White);
    assert!(board.piece_at(coord_to_sq("e5").unwrap()).is_some());

    let fresh = board_from_position_args(&["startpos"]);
    assert_eq!(fresh, Board::startpos());
}
