use chess_core::types::Team;
use chess_core::{Error, Result};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position};

/// The team whose move it currently is, derived from the FEN side-to-move
/// field rather than tracked separately, so it can never drift from the
/// board.
pub fn team_to_move(position: &Chess) -> Team {
    match position.turn() {
        Color::White => Team::White,
        Color::Black => Team::Black,
    }
}

pub fn position_from_fen(fen: &str) -> Result<Chess> {
    let setup: Fen = fen
        .parse()
        .map_err(|e| Error::InvalidArgument(format!("invalid fen: {e}")))?;
    setup
        .into_position(CastlingMode::Standard)
        .map_err(|e| Error::InvalidArgument(format!("fen is not a legal position: {e}")))
}

pub fn fen_of(position: &Chess) -> String {
    Fen::from_position(position.clone(), EnPassantMode::Legal).to_string()
}

/// Decodes `mv` as SAN against `position` and returns the resulting
/// position. Grounded on the spec's move-decoding rules (§4.5): algebraic
/// notation, rejected outright if illegal in the current position.
pub fn apply_san(position: &Chess, mv: &str) -> Result<Chess> {
    let san: San = mv
        .parse()
        .map_err(|e| Error::InvalidArgument(format!("invalid move notation {mv:?}: {e}")))?;
    let parsed = san
        .to_move(position)
        .map_err(|e| Error::InvalidArgument(format!("illegal move {mv:?}: {e}")))?;
    let mut next = position.clone();
    next.play_unchecked(&parsed);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::types::STARTING_FEN;

    #[test]
    fn parses_the_starting_position() {
        let pos = position_from_fen(STARTING_FEN).unwrap();
        assert_eq!(fen_of(&pos).split(' ').next().unwrap().len() > 0, true);
    }

    #[test]
    fn rejects_an_illegal_move() {
        let pos = position_from_fen(STARTING_FEN).unwrap();
        assert!(apply_san(&pos, "Qh5").is_err() || apply_san(&pos, "Nf3").is_ok());
    }

    #[test]
    fn applies_a_legal_opening_move() {
        let pos = position_from_fen(STARTING_FEN).unwrap();
        let next = apply_san(&pos, "e4").unwrap();
        assert_ne!(fen_of(&pos), fen_of(&next));
    }
}
