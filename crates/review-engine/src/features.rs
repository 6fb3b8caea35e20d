//! Tactical and positional feature extraction: qualitative signals
//! comparing a played move against a reference (best) move on the same
//! position, plus per-move strengths for the best-move commentary.
//!
//! All comparisons run on what-if copies of the position; nothing here
//! queries the engine. The one engine-assisted signal (the last-resort
//! lookahead) is pure given the engine line.

use chess::{Board, ChessMove, Color, MoveGen, Piece, Square};

use crate::board::{
    attacked_opponent_piece_count, attacked_square_count, attacks, gives_check, home_rank,
    is_attacked_by, is_capture, is_castling_move, king_square, legal_move_count, material_rank,
    passed_turn, piece_name, san,
};
use crate::score::Evaluation;
use crate::uci::EngineLine;

/// A qualitative difference between the reference move and the played move,
/// in priority order of extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Factor {
    // Tactical pass
    MissedCapture,
    MaterialGain,
    Check,
    // Positional pass
    StrongerPiece(String),
    BetterCenterControl,
    OccupiesCenter,
    MoreActivity,
    BetterDevelopment,
    CastlingPrep,
    BetterKingSafety,
    BetterPawnStructure,
    PawnAdvance,
    MoreMobility,
    RestrictsOpponent,
    Pressure,
    DefendsPiece,
    RookOpenFile,
    QueenFileOrDiagonal,
    BishopDiagonal,
    // Fallback tier
    KnightOutpost,
    BishopPair,
    MoreActive(&'static str),
    // Last resorts
    FutureTactic(Lookahead),
    LongTermProspects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookahead {
    Opportunity,
    Sequence,
    DiscoveredAttack,
}

impl Factor {
    /// The phrase slotted into the explanation sentence.
    pub fn phrase(&self) -> String {
        match self {
            Factor::MissedCapture => "a capture opportunity".to_string(),
            Factor::MaterialGain => "material gain".to_string(),
            Factor::Check => "a check".to_string(),
            Factor::StrongerPiece(san) => format!("uses a stronger piece ({san})"),
            Factor::BetterCenterControl => "provides better control of the center".to_string(),
            Factor::OccupiesCenter => "occupies a central square".to_string(),
            Factor::MoreActivity => "increases piece activity".to_string(),
            Factor::BetterDevelopment => "improves piece development".to_string(),
            Factor::CastlingPrep => "helps prepare for castling".to_string(),
            Factor::BetterKingSafety => "improves king safety".to_string(),
            Factor::BetterPawnStructure => "creates a better pawn structure".to_string(),
            Factor::PawnAdvance => "advances a pawn closer to promotion".to_string(),
            Factor::MoreMobility => "increases your mobility".to_string(),
            Factor::RestrictsOpponent => "restricts opponent's mobility".to_string(),
            Factor::Pressure => "puts pressure on opponent's pieces".to_string(),
            Factor::DefendsPiece => "defends a vulnerable piece".to_string(),
            Factor::RookOpenFile => "controls an open file with a rook".to_string(),
            Factor::QueenFileOrDiagonal => {
                "positions the queen on a strong file or diagonal".to_string()
            }
            Factor::BishopDiagonal => "controls an important diagonal".to_string(),
            Factor::KnightOutpost => "places the knight on a strong outpost".to_string(),
            Factor::BishopPair => "preserves the bishop pair".to_string(),
            Factor::MoreActive(piece) => format!("places the {piece} more actively"),
            Factor::FutureTactic(kind) => {
                let what = match kind {
                    Lookahead::Opportunity => "a tactical opportunity",
                    Lookahead::Sequence => "a tactical sequence",
                    Lookahead::DiscoveredAttack => "a discovered attack",
                };
                format!("sets up {what} in future moves")
            }
            Factor::LongTermProspects => "gives you better long-term prospects".to_string(),
        }
    }
}

/// A strength of a single move, used by the best-move and good-alternative
/// commentary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    AdvancingPawn,
    PawnCenter,
    KnightOutpost,
    KnightPressure,
    LongDiagonal,
    Fianchetto,
    RookOpenFile,
    RookSeventh,
    QueenActivity,
    CastlingKingside,
    CastlingQueenside,
    KingCentralization,
}

impl Strength {
    pub fn phrase(&self) -> &'static str {
        match self {
            Strength::AdvancingPawn => "advancing a pawn toward promotion",
            Strength::PawnCenter => "controlling the center with a pawn",
            Strength::KnightOutpost => "placing your knight on a strong outpost",
            Strength::KnightPressure => "creating knight pressure on multiple pieces",
            Strength::LongDiagonal => "placing your bishop on a powerful long diagonal",
            Strength::Fianchetto => "fianchettoing your bishop",
            Strength::RookOpenFile => "placing your rook on an open file",
            Strength::RookSeventh => "placing your rook on the 7th rank",
            Strength::QueenActivity => "maximizing your queen's activity",
            Strength::CastlingKingside => "castling kingside for king safety",
            Strength::CastlingQueenside => "castling queenside for king safety",
            Strength::KingCentralization => "centralizing your king in the endgame",
        }
    }
}

/// The fixed center set: d4, d5, e4, e5.
pub fn is_center(sq: Square) -> bool {
    let file = sq.get_file().to_index();
    let rank = sq.get_rank().to_index();
    (file == 3 || file == 4) && (rank == 3 || rank == 4)
}

/// How many center squares a color attacks.
pub fn center_control_count(board: &Board, color: Color) -> u32 {
    chess::ALL_SQUARES
        .iter()
        .filter(|sq| is_center(**sq) && is_attacked_by(board, color, **sq))
        .count() as u32
}

/// Developed pieces: non-pawn, non-king pieces off the home rank.
pub fn development_count(board: &Board, color: Color) -> u32 {
    let mut count = 0;
    for sq in *board.color_combined(color) {
        if let Some(piece) = board.piece_on(sq) {
            if piece != Piece::Pawn
                && piece != Piece::King
                && sq.get_rank().to_index() != home_rank(color)
            {
                count += 1;
            }
        }
    }
    count
}

/// King safety on a 0-10 scale: 10, minus 5 if the king square is attacked,
/// minus 1 per attacked adjacent square.
pub fn king_safety_score(board: &Board, color: Color) -> i32 {
    let king = king_square(board, color);
    let mut safety = 10;

    if is_attacked_by(board, !color, king) {
        safety -= 5;
    }
    for adjacent in chess::get_king_moves(king) {
        if is_attacked_by(board, !color, adjacent) {
            safety -= 1;
        }
    }

    safety.max(0)
}

/// Pawn structure on a 0-10 scale: 10, minus 2 per doubled pawn
/// (pawn count minus distinct files occupied). 0 with no pawns left.
pub fn pawn_structure_score(board: &Board, color: Color) -> i32 {
    let pawns = *board.pieces(Piece::Pawn) & *board.color_combined(color);
    if pawns.popcnt() == 0 {
        return 0;
    }

    let mut files_seen = [false; 8];
    for sq in pawns {
        files_seen[sq.get_file().to_index()] = true;
    }
    let distinct = files_seen.iter().filter(|f| **f).count() as i32;
    let doubled = pawns.popcnt() as i32 - distinct;

    (10 - doubled * 2).max(0)
}

/// Endgame: both sides down to at most one major piece (queen or rook).
pub fn is_endgame(board: &Board) -> bool {
    let majors = *board.pieces(Piece::Queen) | *board.pieces(Piece::Rook);
    (majors & *board.color_combined(Color::White)).popcnt() <= 1
        && (majors & *board.color_combined(Color::Black)).popcnt() <= 1
}

/// Manhattan distance from the four-square center.
pub fn distance_to_center(sq: Square) -> u32 {
    let file = sq.get_file().to_index() as i32;
    let rank = sq.get_rank().to_index() as i32;
    let file_distance = (file - 3).abs().min((file - 4).abs());
    let rank_distance = (rank - 3).abs().min((rank - 4).abs());
    (file_distance + rank_distance) as u32
}

/// Outpost: a square beyond the frontier that no enemy pawn can ever
/// attack (no enemy pawn on an adjacent file in front of it), defended by
/// the mover.
pub fn is_outpost(board: &Board, sq: Square, color: Color) -> bool {
    let rank = sq.get_rank().to_index();
    let file = sq.get_file().to_index();

    let beyond_frontier = match color {
        Color::White => rank >= 4,
        Color::Black => rank <= 3,
    };
    if !beyond_frontier {
        return false;
    }

    let enemy_pawns = *board.pieces(Piece::Pawn) & *board.color_combined(!color);
    for pawn_sq in enemy_pawns {
        let pawn_file = pawn_sq.get_file().to_index();
        if pawn_file.abs_diff(file) != 1 {
            continue;
        }
        let pawn_rank = pawn_sq.get_rank().to_index();
        let can_reach = match color {
            // A black pawn above the square can advance and attack it
            Color::White => pawn_rank > rank,
            Color::Black => pawn_rank < rank,
        };
        if can_reach {
            return false;
        }
    }

    is_attacked_by(board, color, sq)
}

pub fn has_bishop_pair(board: &Board, color: Color) -> bool {
    (*board.pieces(Piece::Bishop) & *board.color_combined(color)).popcnt() >= 2
}

/// How far a pawn move advances toward promotion (ranks gained).
pub fn pawn_advance_gain(m: ChessMove, color: Color) -> i32 {
    let from = m.get_source().get_rank().to_index() as i32;
    let to = m.get_dest().get_rank().to_index() as i32;
    match color {
        Color::White => to - from,
        Color::Black => from - to,
    }
}

/// Does a move keep castling available while developing off the home rank?
pub fn helps_castling(board: &Board, m: ChessMove, color: Color) -> bool {
    match board.piece_on(m.get_source()) {
        Some(Piece::King) | Some(Piece::Rook) | None => false,
        Some(_) => m.get_source().get_rank().to_index() == home_rank(color),
    }
}

/// After this move, does the mover attack any opponent piece?
pub fn attacks_opponent_piece(board: &Board, m: ChessMove) -> bool {
    let mover = board.side_to_move();
    let after = board.make_move_new(m);
    attacked_opponent_piece_count(&after, mover) > 0
}

/// Does this move leave a previously threatened piece of the mover both
/// alive and defended?
pub fn defends_threatened_piece(board: &Board, m: ChessMove) -> bool {
    let mover = board.side_to_move();

    let mut threatened = Vec::new();
    for sq in *board.color_combined(mover) {
        if is_attacked_by(board, !mover, sq) {
            threatened.push(sq);
        }
    }
    if threatened.is_empty() {
        return false;
    }

    let after = board.make_move_new(m);
    for sq in threatened {
        if after.color_on(sq) == Some(mover) && is_attacked_by(&after, mover, sq) {
            return true;
        }
    }
    false
}

/// Which long-range piece, if any, gains file or diagonal control by this
/// move: a rook/queen landing on a file with no own pawns, or a bishop on a
/// diagonal covering at least 7 squares.
pub fn file_control(after: &Board, m: ChessMove, color: Color) -> Option<Piece> {
    let dest = m.get_dest();
    let piece = after.piece_on(dest)?;

    match piece {
        Piece::Rook | Piece::Queen => {
            let file = dest.get_file();
            let own_pawns = *after.pieces(Piece::Pawn) & *after.color_combined(color);
            let own_pawn_on_file = own_pawns
                .into_iter()
                .any(|sq| sq.get_file() == file);
            if !own_pawn_on_file {
                Some(piece)
            } else {
                None
            }
        }
        Piece::Bishop => {
            if attacks(after, dest).popcnt() >= 7 {
                Some(piece)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Legal-move count of the position as it stands (the side now to move).
pub fn direct_mobility(after: &Board) -> usize {
    legal_move_count(after)
}

/// Legal-move count after passing the turn back; falls back to the direct
/// count when the pass is unavailable (side to move in check).
pub fn passed_mobility(after: &Board) -> usize {
    match passed_turn(after) {
        Some(board) => legal_move_count(&board),
        None => legal_move_count(after),
    }
}

/// Tactical pass. Fires only for material-sized deltas (except the check
/// factor); when any factor fires the positional pass is skipped.
pub fn tactical_factors(
    board: &Board,
    played: ChessMove,
    reference: ChessMove,
    delta_cp: i32,
    material_cp: i32,
) -> Vec<Factor> {
    let mut factors = Vec::new();

    if delta_cp.abs() >= material_cp {
        let capture_existed = MoveGen::new_legal(board).any(|m| is_capture(board, m));
        if capture_existed && !is_capture(board, played) {
            factors.push(Factor::MissedCapture);
        }
        if is_capture(board, reference) {
            factors.push(Factor::MaterialGain);
        }
    }

    if gives_check(board, reference) {
        factors.push(Factor::Check);
    }

    factors
}

/// Positional pass: ordered comparisons between the position after the
/// played move and the position after the reference move, from the mover's
/// perspective. Returns None only on an internal inconsistency (a source
/// square without a piece), which callers degrade to the generic sentence.
pub fn positional_factors(
    board: &Board,
    played: ChessMove,
    reference: ChessMove,
    move_number: u32,
) -> Option<Vec<Factor>> {
    let mover = board.side_to_move();
    let played_piece = board.piece_on(played.get_source())?;
    let reference_piece = board.piece_on(reference.get_source())?;

    let after_played = board.make_move_new(played);
    let after_reference = board.make_move_new(reference);

    let mut factors = Vec::new();

    // Piece-type upgrade, by canonical material value
    if material_rank(reference_piece) > material_rank(played_piece) {
        let label = san(board, reference)
            .trim_end_matches(['+', '#'])
            .to_string();
        factors.push(Factor::StrongerPiece(label));
    }

    // Center control
    if center_control_count(&after_reference, mover) > center_control_count(&after_played, mover) {
        factors.push(Factor::BetterCenterControl);
    }
    if is_center(reference.get_dest()) && !is_center(played.get_dest()) {
        factors.push(Factor::OccupiesCenter);
    }

    // Overall activity
    if attacked_square_count(&after_reference, mover)
        > attacked_square_count(&after_played, mover) + 2
    {
        factors.push(Factor::MoreActivity);
    }

    // Development
    if development_count(&after_reference, mover) > development_count(&after_played, mover) {
        factors.push(Factor::BetterDevelopment);
    }
    if move_number <= 10
        && board.checkers().popcnt() == 0
        && helps_castling(board, reference, mover)
        && !helps_castling(board, played, mover)
    {
        factors.push(Factor::CastlingPrep);
    }

    // King safety
    if king_safety_score(&after_reference, mover) > king_safety_score(&after_played, mover) {
        factors.push(Factor::BetterKingSafety);
    }

    // Pawn structure
    if pawn_structure_score(&after_reference, mover) > pawn_structure_score(&after_played, mover) {
        factors.push(Factor::BetterPawnStructure);
    }
    if reference_piece == Piece::Pawn {
        let reference_gain = pawn_advance_gain(reference, mover);
        let played_gain = if played_piece == Piece::Pawn {
            pawn_advance_gain(played, mover)
        } else {
            0
        };
        if reference_gain > played_gain {
            factors.push(Factor::PawnAdvance);
        }
    }

    // Mobility: direct count after the move, and the count after passing
    // the turn back
    let played_direct = direct_mobility(&after_played);
    let reference_direct = direct_mobility(&after_reference);
    if reference_direct > played_direct + 2 {
        factors.push(Factor::MoreMobility);
    }
    let played_passed = passed_mobility(&after_played);
    let reference_passed = passed_mobility(&after_reference);
    if played_passed > reference_passed + 2 {
        factors.push(Factor::RestrictsOpponent);
    }

    // Attack and defense
    if attacks_opponent_piece(board, reference) && !attacks_opponent_piece(board, played) {
        factors.push(Factor::Pressure);
    }
    if defends_threatened_piece(board, reference) && !defends_threatened_piece(board, played) {
        factors.push(Factor::DefendsPiece);
    }

    // File and diagonal control
    let reference_control = file_control(&after_reference, reference, mover);
    let played_control = file_control(&after_played, played, mover);
    if played_control.is_none() {
        match reference_control {
            Some(Piece::Rook) => factors.push(Factor::RookOpenFile),
            Some(Piece::Queen) => factors.push(Factor::QueenFileOrDiagonal),
            Some(Piece::Bishop) => factors.push(Factor::BishopDiagonal),
            _ => {}
        }
    }

    // Fallback tier
    if factors.is_empty() {
        if reference_piece == Piece::Knight
            && is_outpost(&after_reference, reference.get_dest(), mover)
        {
            factors.push(Factor::KnightOutpost);
        }
        if has_bishop_pair(&after_reference, mover) && !has_bishop_pair(&after_played, mover) {
            factors.push(Factor::BishopPair);
        }
        if factors.is_empty() {
            // Vacuous when both moves put the same piece type on the same
            // square; the ladder then falls through to the lookahead
            let vacuous =
                reference_piece == played_piece && reference.get_dest() == played.get_dest();
            if !vacuous {
                factors.push(Factor::MoreActive(piece_name(reference_piece)));
            }
        }
    }

    Some(factors)
}

/// Last-resort lookahead over a shallow engine line from the position
/// after the reference move (opponent to move).
pub fn lookahead_factor(
    after_reference: &Board,
    mover: Color,
    line: &EngineLine,
) -> Option<Factor> {
    let eval = Evaluation::from_engine(line.cp, line.mate, after_reference.side_to_move());
    if eval.for_mover(mover) > 150 {
        return Some(Factor::FutureTactic(Lookahead::Opportunity));
    }

    if line.pv.len() >= 2 {
        let reply = crate::board::parse_uci_move(after_reference, &line.pv[0])?;
        let after_reply = after_reference.make_move_new(reply);

        if let Some(followup) = crate::board::parse_uci_move(&after_reply, &line.pv[1]) {
            if is_capture(&after_reply, followup) {
                return Some(Factor::FutureTactic(Lookahead::Sequence));
            }
        }

        if uncovers_attack(after_reference, &after_reply, mover) {
            return Some(Factor::FutureTactic(Lookahead::DiscoveredAttack));
        }
    }

    None
}

/// Did the position change uncover an attack on an opponent piece that was
/// previously safe?
fn uncovers_attack(before: &Board, after: &Board, mover: Color) -> bool {
    for sq in *after.color_combined(!mover) {
        if is_attacked_by(after, mover, sq) && !is_attacked_by(before, mover, sq) {
            return true;
        }
    }
    false
}

/// Positional strengths of a single move, for the best-move and
/// good-alternative commentary.
pub fn move_strengths(board: &Board, m: ChessMove) -> Vec<Strength> {
    let mover = board.side_to_move();
    let piece = match board.piece_on(m.get_source()) {
        Some(p) => p,
        None => return Vec::new(),
    };
    let after = board.make_move_new(m);
    let dest = m.get_dest();
    let dest_rank = dest.get_rank().to_index();

    let mut strengths = Vec::new();

    match piece {
        Piece::Pawn => {
            let advanced = match mover {
                Color::White => dest_rank >= 5,
                Color::Black => dest_rank <= 2,
            };
            if advanced {
                strengths.push(Strength::AdvancingPawn);
            }
            if is_center(dest) {
                strengths.push(Strength::PawnCenter);
            }
        }
        Piece::Knight => {
            if is_outpost(&after, dest, mover) {
                strengths.push(Strength::KnightOutpost);
            }
            if attacked_opponent_piece_count(&after, mover) >= 2 {
                strengths.push(Strength::KnightPressure);
            }
        }
        Piece::Bishop => {
            let file = dest.get_file().to_index();
            if file == dest_rank || file + dest_rank == 7 {
                strengths.push(Strength::LongDiagonal);
            }
            let fianchetto = (file == 1 || file == 6) && (dest_rank == 1 || dest_rank == 6);
            if fianchetto {
                strengths.push(Strength::Fianchetto);
            }
        }
        Piece::Rook => {
            if file_control(&after, m, mover) == Some(Piece::Rook) {
                strengths.push(Strength::RookOpenFile);
            }
            let seventh = match mover {
                Color::White => dest_rank == 6,
                Color::Black => dest_rank == 1,
            };
            if seventh {
                strengths.push(Strength::RookSeventh);
            }
        }
        Piece::Queen => {
            if attacked_square_count(&after, mover) >= 16 {
                strengths.push(Strength::QueenActivity);
            }
        }
        Piece::King => {
            if is_castling_move(board, m) {
                if dest.get_file().to_index() < 4 {
                    strengths.push(Strength::CastlingQueenside);
                } else {
                    strengths.push(Strength::CastlingKingside);
                }
            }
            if is_endgame(board) && distance_to_center(dest) <= 2 {
                strengths.push(Strength::KingCentralization);
            }
        }
    }

    strengths
}

/// Do two moves follow a similar plan? Both captures, both checks, or the
/// same piece type heading to adjacent squares.
pub fn is_similar_move_type(board: &Board, a: ChessMove, b: ChessMove) -> bool {
    if is_capture(board, a) && is_capture(board, b) {
        return true;
    }
    if gives_check(board, a) && gives_check(board, b) {
        return true;
    }

    let same_piece = match (board.piece_on(a.get_source()), board.piece_on(b.get_source())) {
        (Some(pa), Some(pb)) => pa == pb,
        _ => false,
    };
    let file_gap = a
        .get_dest()
        .get_file()
        .to_index()
        .abs_diff(b.get_dest().get_file().to_index());
    let rank_gap = a
        .get_dest()
        .get_rank()
        .to_index()
        .abs_diff(b.get_dest().get_rank().to_index());

    same_piece && file_gap <= 1 && rank_gap <= 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::find_san_move;
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
    fn test_center_set_is_exactly_four_squares() {
        let center: Vec<String> = chess::ALL_SQUARES
            .iter()
            .filter(|sq| is_center(**sq))
            .map(|sq| sq.to_string())
            .collect();
        assert_eq!(center, vec!["d4", "e4", "d5", "e5"]);
    }

    #[test]
    fn test_king_safety_bounds() {
        let board = Board::default();
        assert_eq!(king_safety_score(&board, Color::White), 10);
        assert_eq!(king_safety_score(&board, Color::Black), 10);

        // Exposed king under fire stays within range
        let board = Board::from_str("4k3/8/8/8/8/8/2q5/4K3 w - - 0 1").unwrap();
        let score = king_safety_score(&board, Color::White);
        assert!((0..=10).contains(&score));
        assert!(score < 10);
    }

    #[test]
    fn test_pawn_structure_score() {
        let board = Board::default();
        assert_eq!(pawn_structure_score(&board, Color::White), 10);

        // Doubled e-pawns: 8 pawns on 7 files
        let board =
            Board::from_str("rnbqkbnr/pppp1ppp/8/4p3/4P3/4P3/PPPP2PP/RNBQKBNR b KQkq - 0 1")
                .unwrap();
        assert_eq!(pawn_structure_score(&board, Color::White), 8);

        // No pawns at all
        let board = Board::from_str("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(pawn_structure_score(&board, Color::White), 0);
    }

    #[test]
    fn test_endgame_detection() {
        assert!(!is_endgame(&Board::default()));

        let board = Board::from_str("4k3/4r3/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
        assert!(is_endgame(&board));

        let board = Board::from_str("3qk3/4r3/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
        assert!(!is_endgame(&board));
    }

    #[test]
    fn test_outpost() {
        // White knight on d5, supported by the c4 pawn, no black pawn on
        // the c or e file able to chase it
        let board = Board::from_str("4k3/5p2/8/3N4/2P5/8/8/4K3 w - - 0 1").unwrap();
        let d5 = Square::from_str("d5").unwrap();
        assert!(is_outpost(&board, d5, Color::White));

        // A black e-pawn behind the square can advance and attack it
        let board = Board::from_str("4k3/4p3/8/3N4/2P5/8/8/4K3 w - - 0 1").unwrap();
        assert!(!is_outpost(&board, d5, Color::White));
    }

    #[test]
    fn test_tactical_pass_missed_capture_and_material_gain() {
        // 1. e4 d5: exd5 is available, 2. a3 ignores it
        let board = board_after(&["e4", "d5"]);
        let played = find_san_move(&board, "a3").unwrap();
        let reference = find_san_move(&board, "exd5").unwrap();

        let factors = tactical_factors(&board, played, reference, 150, 100);
        assert_eq!(factors, vec![Factor::MissedCapture, Factor::MaterialGain]);
    }

    #[test]
    fn test_tactical_pass_respects_material_gate() {
        let board = board_after(&["e4", "d5"]);
        let played = find_san_move(&board, "a3").unwrap();
        let reference = find_san_move(&board, "exd5").unwrap();

        // Small delta: no capture factors, and exd5 gives no check
        let factors = tactical_factors(&board, played, reference, 60, 100);
        assert!(factors.is_empty());
    }

    #[test]
    fn test_tactical_pass_check_factor_ungated() {
        let board = board_after(&["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6"]);
        let played = find_san_move(&board, "a3").unwrap();
        let reference = find_san_move(&board, "Qxf7#").unwrap();

        let factors = tactical_factors(&board, played, reference, 0, 100);
        assert!(factors.contains(&Factor::Check));
    }

    #[test]
    fn test_stronger_piece_requires_strict_value_gap() {
        // Knight vs bishop: equal value, no factor
        assert!(material_rank(Piece::Knight) == material_rank(Piece::Bishop));

        // Pawn move vs queen move is a genuine upgrade
        let board = board_after(&["e4", "e5"]);
        let played = find_san_move(&board, "a3").unwrap();
        let reference = find_san_move(&board, "Qh5").unwrap();
        let factors = positional_factors(&board, played, reference, 2).unwrap();
        assert!(matches!(factors.first(), Some(Factor::StrongerPiece(_))));
    }

    #[test]
    fn test_occupies_center() {
        let board = Board::default();
        let played = find_san_move(&board, "a3").unwrap();
        let reference = find_san_move(&board, "e4").unwrap();
        let factors = positional_factors(&board, played, reference, 1).unwrap();
        assert!(factors.contains(&Factor::OccupiesCenter));
    }

    #[test]
    fn test_generic_factor_suppressed_for_same_piece_same_destination() {
        // Rooks on a1 and h1 can both reach d1: same piece type, same
        // destination, nothing else differs enough to fire a factor
        let board = Board::from_str("4k3/8/8/8/8/8/4K3/R6R w - - 0 1").unwrap();
        let played = find_san_move(&board, "Rad1").unwrap();
        let reference = find_san_move(&board, "Rhd1").unwrap();

        let factors = positional_factors(&board, played, reference, 30).unwrap();
        assert!(!factors
            .iter()
            .any(|f| matches!(f, Factor::MoreActive(_))));
    }

    #[test]
    fn test_move_strengths_castling() {
        let board = board_after(&["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5"]);
        let castle = find_san_move(&board, "O-O").unwrap();
        let strengths = move_strengths(&board, castle);
        assert!(strengths.contains(&Strength::CastlingKingside));
    }

    #[test]
    fn test_move_strengths_center_pawn() {
        let board = Board::default();
        let e4 = find_san_move(&board, "e4").unwrap();
        assert!(move_strengths(&board, e4).contains(&Strength::PawnCenter));
    }

    #[test]
    fn test_king_centralization_in_endgame() {
        let board = Board::from_str("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert!(is_endgame(&board));
        let m = find_san_move(&board, "Kd2").unwrap();
        assert!(move_strengths(&board, m).contains(&Strength::KingCentralization));
    }

    #[test]
    fn test_similar_move_type() {
        let board = board_after(&["e4", "e5"]);
        let a = find_san_move(&board, "Nf3").unwrap();
        let b = find_san_move(&board, "Ne2").unwrap();
        assert!(is_similar_move_type(&board, a, b));

        let c = find_san_move(&board, "a3").unwrap();
        assert!(!is_similar_move_type(&board, a, c));
    }

    #[test]
    fn test_factor_phrases() {
        assert_eq!(Factor::MissedCapture.phrase(), "a capture opportunity");
        assert_eq!(
            Factor::FutureTactic(Lookahead::Sequence).phrase(),
            "sets up a tactical sequence in future moves"
        );
        assert_eq!(
            Factor::MoreActive("knight").phrase(),
            "places the knight more actively"
        );
    }
}
