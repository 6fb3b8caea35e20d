//! Rules-provider adapter over the `chess` crate: attack lookups, move
//! predicates and algebraic notation. Positions are never mutated in place;
//! every what-if goes through `Board::make_move_new` on a copy.

use chess::{
    BitBoard, Board, ChessMove, Color, File, MoveGen, Piece, Rank, Square, ALL_SQUARES, EMPTY,
};

use crate::error::ReviewError;

/// Canonical material ranking used for "stronger piece" comparisons.
/// Deliberately a value table, not the enum ordinal: knight and bishop tie.
pub fn material_rank(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 1,
        Piece::Knight => 3,
        Piece::Bishop => 3,
        Piece::Rook => 5,
        Piece::Queen => 9,
        Piece::King => 10,
    }
}

pub fn piece_name(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "pawn",
        Piece::Knight => "knight",
        Piece::Bishop => "bishop",
        Piece::Rook => "rook",
        Piece::Queen => "queen",
        Piece::King => "king",
    }
}

/// Home rank index for a color (0-indexed)
pub fn home_rank(color: Color) -> usize {
    match color {
        Color::White => 0,
        Color::Black => 7,
    }
}

/// Get squares attacked by a piece on a given square
pub fn attacks(board: &Board, square: Square) -> BitBoard {
    let piece = match board.piece_on(square) {
        Some(p) => p,
        None => return EMPTY,
    };

    match piece {
        Piece::Pawn => {
            let color = board.color_on(square).expect("occupied square has a color");
            pawn_attacks(square, color)
        }
        Piece::Knight => chess::get_knight_moves(square),
        Piece::King => chess::get_king_moves(square),
        Piece::Bishop => chess::get_bishop_moves(square, *board.combined()),
        Piece::Rook => chess::get_rook_moves(square, *board.combined()),
        Piece::Queen => {
            chess::get_bishop_moves(square, *board.combined())
                | chess::get_rook_moves(square, *board.combined())
        }
    }
}

/// Pawn attack squares (just the diagonal attacks, not pushes)
pub fn pawn_attacks(square: Square, color: Color) -> BitBoard {
    let file = square.get_file().to_index();
    let rank = square.get_rank().to_index();

    let mut result = EMPTY;

    match color {
        Color::White => {
            if rank < 7 {
                if file > 0 {
                    result |= BitBoard::from_square(Square::make_square(
                        Rank::from_index(rank + 1),
                        File::from_index(file - 1),
                    ));
                }
                if file < 7 {
                    result |= BitBoard::from_square(Square::make_square(
                        Rank::from_index(rank + 1),
                        File::from_index(file + 1),
                    ));
                }
            }
        }
        Color::Black => {
            if rank > 0 {
                if file > 0 {
                    result |= BitBoard::from_square(Square::make_square(
                        Rank::from_index(rank - 1),
                        File::from_index(file - 1),
                    ));
                }
                if file < 7 {
                    result |= BitBoard::from_square(Square::make_square(
                        Rank::from_index(rank - 1),
                        File::from_index(file + 1),
                    ));
                }
            }
        }
    }

    result
}

/// Get all pieces of a given color that attack a square
pub fn attackers(board: &Board, color: Color, square: Square) -> BitBoard {
    let occupied = *board.combined();
    let color_pieces = *board.color_combined(color);

    let mut result = EMPTY;

    // Pawns: reverse lookup — pawn attacks FROM the target square
    // with the OPPOSITE color, then intersect with actual pawns
    let pawn_atk = pawn_attacks(square, !color);
    result |= pawn_atk & *board.pieces(Piece::Pawn) & color_pieces;

    // Knights
    let knight_atk = chess::get_knight_moves(square);
    result |= knight_atk & *board.pieces(Piece::Knight) & color_pieces;

    // King
    let king_atk = chess::get_king_moves(square);
    result |= king_atk & *board.pieces(Piece::King) & color_pieces;

    // Bishops (and queen diagonals)
    let bishop_atk = chess::get_bishop_moves(square, occupied);
    result |=
        bishop_atk & (*board.pieces(Piece::Bishop) | *board.pieces(Piece::Queen)) & color_pieces;

    // Rooks (and queen ranks/files)
    let rook_atk = chess::get_rook_moves(square, occupied);
    result |= rook_atk & (*board.pieces(Piece::Rook) | *board.pieces(Piece::Queen)) & color_pieces;

    result
}

/// Is a square attacked by any piece of a color?
pub fn is_attacked_by(board: &Board, color: Color, square: Square) -> bool {
    attackers(board, color, square) != EMPTY
}

/// Count of all squares attacked by a color
pub fn attacked_square_count(board: &Board, color: Color) -> u32 {
    ALL_SQUARES
        .iter()
        .filter(|sq| is_attacked_by(board, color, **sq))
        .count() as u32
}

/// Count of opponent pieces currently attacked by a color
pub fn attacked_opponent_piece_count(board: &Board, color: Color) -> u32 {
    let enemy = *board.color_combined(!color);
    let mut count = 0;
    for sq in enemy {
        if is_attacked_by(board, color, sq) {
            count += 1;
        }
    }
    count
}

/// Find the king square for a color
pub fn king_square(board: &Board, color: Color) -> Square {
    let king_bb = *board.pieces(Piece::King) & *board.color_combined(color);
    debug_assert_eq!(king_bb.popcnt(), 1);
    king_bb.to_square()
}

/// Number of legal moves for the side to move
pub fn legal_move_count(board: &Board) -> usize {
    MoveGen::new_legal(board).len()
}

/// Is a move a capture? Includes en passant (empty destination).
pub fn is_capture(board: &Board, m: ChessMove) -> bool {
    board.piece_on(m.get_dest()).is_some() || is_en_passant(board, m)
}

/// Is a move an en passant capture? A pawn changing file onto an empty square.
pub fn is_en_passant(board: &Board, m: ChessMove) -> bool {
    board.piece_on(m.get_source()) == Some(Piece::Pawn)
        && m.get_source().get_file() != m.get_dest().get_file()
        && board.piece_on(m.get_dest()).is_none()
}

/// Is a move castling? (king travels more than one file)
pub fn is_castling_move(board: &Board, m: ChessMove) -> bool {
    if board.piece_on(m.get_source()) == Some(Piece::King) {
        let from_file = m.get_source().get_file().to_index() as i32;
        let to_file = m.get_dest().get_file().to_index() as i32;
        return (from_file - to_file).abs() > 1;
    }
    false
}

/// Does a move give check?
pub fn gives_check(board: &Board, m: ChessMove) -> bool {
    let after = board.make_move_new(m);
    after.checkers().popcnt() > 0
}

/// Name of the piece captured by a move, if any. For en passant the
/// captured pawn is not on the destination square.
pub fn captured_piece_name(board: &Board, m: ChessMove) -> Option<&'static str> {
    if is_en_passant(board, m) {
        return Some("pawn");
    }
    board.piece_on(m.get_dest()).map(piece_name)
}

/// Construct the position with the turn passed to the opponent, via FEN
/// (flip side to move, clear en passant). None when the side to move is in
/// check — a pass would leave the king capturable.
pub fn passed_turn(board: &Board) -> Option<Board> {
    use std::str::FromStr;

    if board.checkers().popcnt() > 0 {
        return None;
    }

    let fen = board.to_string();
    let parts: Vec<&str> = fen.split(' ').collect();
    if parts.len() < 4 {
        return None;
    }
    let side = if parts[1] == "w" { "b" } else { "w" };
    let null_fen = format!("{} {} {} - 0 1", parts[0], side, parts[2]);
    Board::from_str(&null_fen).ok()
}

/// Parse a UCI move string against a board position
pub fn parse_uci_move(board: &Board, uci: &str) -> Option<ChessMove> {
    if uci.len() < 4 {
        return None;
    }

    let bytes = uci.as_bytes();
    if !(b'a'..=b'h').contains(&bytes[0])
        || !(b'1'..=b'8').contains(&bytes[1])
        || !(b'a'..=b'h').contains(&bytes[2])
        || !(b'1'..=b'8').contains(&bytes[3])
    {
        return None;
    }

    let from = Square::make_square(
        Rank::from_index((bytes[1] - b'1') as usize),
        File::from_index((bytes[0] - b'a') as usize),
    );
    let to = Square::make_square(
        Rank::from_index((bytes[3] - b'1') as usize),
        File::from_index((bytes[2] - b'a') as usize),
    );

    let promotion = if uci.len() > 4 {
        match bytes[4] {
            b'q' | b'Q' => Some(Piece::Queen),
            b'r' | b'R' => Some(Piece::Rook),
            b'b' | b'B' => Some(Piece::Bishop),
            b'n' | b'N' => Some(Piece::Knight),
            _ => None,
        }
    } else {
        None
    };

    let m = ChessMove::new(from, to, promotion);
    if board.legal(m) {
        Some(m)
    } else {
        None
    }
}

/// Find the legal move matching a SAN string
pub fn find_san_move(board: &Board, san: &str) -> Result<ChessMove, ReviewError> {
    let clean = san.trim_end_matches(|c: char| c == '+' || c == '#' || c == '!' || c == '?');

    let legal_moves: Vec<ChessMove> = MoveGen::new_legal(board).collect();

    // Handle castling
    if clean == "O-O" || clean == "0-0" {
        for m in &legal_moves {
            if board.piece_on(m.get_source()) == Some(Piece::King) {
                let src_file = m.get_source().get_file().to_index();
                let dst_file = m.get_dest().get_file().to_index();
                if dst_file > src_file && (dst_file - src_file) == 2 {
                    return Ok(*m);
                }
            }
        }
        return Err(ReviewError::MoveAnalysis(format!(
            "No kingside castling move found for: {san}"
        )));
    }
    if clean == "O-O-O" || clean == "0-0-0" {
        for m in &legal_moves {
            if board.piece_on(m.get_source()) == Some(Piece::King) {
                let src_file = m.get_source().get_file().to_index();
                let dst_file = m.get_dest().get_file().to_index();
                if src_file > dst_file && (src_file - dst_file) == 2 {
                    return Ok(*m);
                }
            }
        }
        return Err(ReviewError::MoveAnalysis(format!(
            "No queenside castling move found for: {san}"
        )));
    }

    let bytes = clean.as_bytes();
    if bytes.is_empty() {
        return Err(ReviewError::MoveAnalysis("Empty SAN move".to_string()));
    }

    let (piece, rest) = if bytes[0].is_ascii_uppercase() {
        let p = match bytes[0] {
            b'K' => Piece::King,
            b'Q' => Piece::Queen,
            b'R' => Piece::Rook,
            b'B' => Piece::Bishop,
            b'N' => Piece::Knight,
            _ => {
                return Err(ReviewError::MoveAnalysis(format!(
                    "Unknown piece: {}",
                    bytes[0] as char
                )))
            }
        };
        (p, &clean[1..])
    } else {
        (Piece::Pawn, clean)
    };

    // Extract promotion
    let (rest, promotion) = if let Some(eq_pos) = rest.find('=') {
        let promo_piece = match rest.as_bytes().get(eq_pos + 1) {
            Some(b'Q') => Some(Piece::Queen),
            Some(b'R') => Some(Piece::Rook),
            Some(b'B') => Some(Piece::Bishop),
            Some(b'N') => Some(Piece::Knight),
            _ => None,
        };
        (&rest[..eq_pos], promo_piece)
    } else {
        (rest, None)
    };

    // Remove capture marker
    let rest = rest.replace('x', "");

    // The last two characters are the destination square
    let rest_bytes = rest.as_bytes();
    if rest_bytes.len() < 2 {
        return Err(ReviewError::MoveAnalysis(format!("SAN too short: {san}")));
    }

    let dest_file = rest_bytes[rest_bytes.len() - 2];
    let dest_rank = rest_bytes[rest_bytes.len() - 1];

    if !(b'a'..=b'h').contains(&dest_file) || !(b'1'..=b'8').contains(&dest_rank) {
        return Err(ReviewError::MoveAnalysis(format!(
            "Invalid destination in SAN: {san}"
        )));
    }

    let dest = Square::make_square(
        Rank::from_index((dest_rank - b'1') as usize),
        File::from_index((dest_file - b'a') as usize),
    );

    // Disambiguation
    let disambig = &rest[..rest.len() - 2];

    let mut candidates: Vec<ChessMove> = legal_moves
        .into_iter()
        .filter(|m| {
            m.get_dest() == dest
                && board.piece_on(m.get_source()) == Some(piece)
                && m.get_promotion() == promotion
        })
        .collect();

    if candidates.len() == 1 {
        return Ok(candidates[0]);
    }

    if !disambig.is_empty() {
        let disambig_bytes = disambig.as_bytes();
        candidates.retain(|m| {
            let src = m.get_source();
            for &b in disambig_bytes {
                if (b'a'..=b'h').contains(&b) {
                    if src.get_file().to_index() != (b - b'a') as usize {
                        return false;
                    }
                } else if (b'1'..=b'8').contains(&b)
                    && src.get_rank().to_index() != (b - b'1') as usize
                {
                    return false;
                }
            }
            true
        });
    }

    match candidates.len() {
        1 => Ok(candidates[0]),
        0 => Err(ReviewError::MoveAnalysis(format!(
            "No legal move matches SAN: {san}"
        ))),
        _ => Err(ReviewError::MoveAnalysis(format!(
            "Ambiguous SAN: {san} ({} candidates)",
            candidates.len()
        ))),
    }
}

/// Render a legal move in standard algebraic notation, with disambiguation
/// and check/mate suffix. The `chess` crate itself only renders UCI.
pub fn san(board: &Board, m: ChessMove) -> String {
    let mut out = String::new();

    if is_castling_move(board, m) {
        if m.get_dest().get_file().to_index() > m.get_source().get_file().to_index() {
            out.push_str("O-O");
        } else {
            out.push_str("O-O-O");
        }
        return with_check_suffix(board, m, out);
    }

    let piece = match board.piece_on(m.get_source()) {
        Some(p) => p,
        // Not a legal move for this board; fall back to coordinates
        None => return format!("{}{}", m.get_source(), m.get_dest()),
    };
    let capture = is_capture(board, m);

    if piece == Piece::Pawn {
        if capture {
            out.push((b'a' + m.get_source().get_file().to_index() as u8) as char);
            out.push('x');
        }
        out.push_str(&m.get_dest().to_string());
        if let Some(promo) = m.get_promotion() {
            out.push('=');
            out.push(piece_letter(promo));
        }
        return with_check_suffix(board, m, out);
    }

    out.push(piece_letter(piece));
    out.push_str(&disambiguation(board, m, piece));
    if capture {
        out.push('x');
    }
    out.push_str(&m.get_dest().to_string());

    with_check_suffix(board, m, out)
}

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
        Piece::Pawn => 'P',
    }
}

/// Minimal disambiguation string: file, then rank, then both.
fn disambiguation(board: &Board, m: ChessMove, piece: Piece) -> String {
    let others: Vec<ChessMove> = MoveGen::new_legal(board)
        .filter(|o| {
            o.get_dest() == m.get_dest()
                && o.get_source() != m.get_source()
                && board.piece_on(o.get_source()) == Some(piece)
        })
        .collect();

    if others.is_empty() {
        return String::new();
    }

    let file = m.get_source().get_file().to_index();
    let rank = m.get_source().get_rank().to_index();
    let file_unique = others.iter().all(|o| o.get_source().get_file().to_index() != file);
    let rank_unique = others.iter().all(|o| o.get_source().get_rank().to_index() != rank);

    let file_ch = (b'a' + file as u8) as char;
    let rank_ch = (b'1' + rank as u8) as char;

    if file_unique {
        file_ch.to_string()
    } else if rank_unique {
        rank_ch.to_string()
    } else {
        format!("{file_ch}{rank_ch}")
    }
}

fn with_check_suffix(board: &Board, m: ChessMove, mut san: String) -> String {
    let after = board.make_move_new(m);
    if after.checkers().popcnt() > 0 {
        if MoveGen::new_legal(&after).len() == 0 {
            san.push('#');
        } else {
            san.push('+');
        }
    }
    san
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn board_after(moves: &[&str]) -> Board {
        let mut board = Board::default();
        for san_str in moves {
            let m = find_san_move(&board, san_str).unwrap();
            board = board.make_move_new(m);
        }
        board
    }

    #[test]
    fn test_san_round_trip_basics() {
        let board = Board::default();
        for s in ["e4", "d4", "Nf3", "Nc3", "a3"] {
            let m = find_san_move(&board, s).unwrap();
            assert_eq!(san(&board, m), *s);
        }
    }

    #[test]
    fn test_san_pawn_capture() {
        let board = board_after(&["e4", "d5"]);
        let m = find_san_move(&board, "exd5").unwrap();
        assert!(is_capture(&board, m));
        assert_eq!(san(&board, m), "exd5");
    }

    #[test]
    fn test_san_castling() {
        let board = board_after(&["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5"]);
        let m = find_san_move(&board, "O-O").unwrap();
        assert!(is_castling_move(&board, m));
        assert_eq!(san(&board, m), "O-O");
    }

    #[test]
    fn test_san_check_suffix() {
        // Scholar's mate: Qxf7 is mate, not just check
        let board = board_after(&["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6"]);
        let m = find_san_move(&board, "Qxf7#").unwrap();
        assert_eq!(san(&board, m), "Qxf7#");
    }

    #[test]
    fn test_san_rook_disambiguation() {
        // Rooks on a1 and h1 can both reach d1
        let board = Board::from_str("4k3/8/8/8/8/8/4K3/R6R w - - 0 1").unwrap();
        let m = find_san_move(&board, "Rad1").unwrap();
        assert_eq!(san(&board, m), "Rad1");

        let m = find_san_move(&board, "Rhd1").unwrap();
        assert_eq!(san(&board, m), "Rhd1");
    }

    #[test]
    fn test_en_passant_detected_and_named() {
        let board = board_after(&["e4", "a6", "e5", "d5"]);
        let m = find_san_move(&board, "exd6").unwrap();
        assert!(is_en_passant(&board, m));
        assert!(is_capture(&board, m));
        assert_eq!(captured_piece_name(&board, m), Some("pawn"));
    }

    #[test]
    fn test_captured_piece_name_on_destination() {
        let board = board_after(&["e4", "d5"]);
        let m = find_san_move(&board, "exd5").unwrap();
        assert_eq!(captured_piece_name(&board, m), Some("pawn"));

        let board = board_after(&["e4", "d5", "exd5", "Qxd5"]);
        let m = find_san_move(&board, "Nc3").unwrap();
        assert_eq!(captured_piece_name(&board, m), None);
    }

    #[test]
    fn test_attackers_reverse_lookup() {
        // White knight on f3 attacks e5
        let board =
            Board::from_str("rnbqkbnr/pppppppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2")
                .unwrap();
        let e5 = Square::make_square(Rank::Fifth, File::E);
        let white_attackers = attackers(&board, Color::White, e5);
        let f3 = Square::make_square(Rank::Third, File::F);
        assert!((white_attackers & BitBoard::from_square(f3)).popcnt() > 0);
        assert!(is_attacked_by(&board, Color::White, e5));
    }

    #[test]
    fn test_material_rank_table() {
        assert!(material_rank(Piece::Queen) > material_rank(Piece::Rook));
        assert!(material_rank(Piece::Rook) > material_rank(Piece::Bishop));
        // Knight and bishop tie: neither is "stronger"
        assert_eq!(material_rank(Piece::Knight), material_rank(Piece::Bishop));
        assert!(material_rank(Piece::Knight) > material_rank(Piece::Pawn));
    }

    #[test]
    fn test_passed_turn_flips_side() {
        let board = Board::default();
        let passed = passed_turn(&board).unwrap();
        assert_eq!(passed.side_to_move(), Color::Black);

        // In check: no pass available
        let board = board_after(&["e4", "e5", "Qh5", "Nc6", "Qxf7"]);
        assert!(board.checkers().popcnt() > 0);
        assert!(passed_turn(&board).is_none());
    }

    #[test]
    fn test_gives_check() {
        let board = board_after(&["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6"]);
        let m = find_san_move(&board, "Qxf7#").unwrap();
        assert!(gives_check(&board, m));
    }
}
