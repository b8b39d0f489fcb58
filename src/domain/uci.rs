//! UCI (Universal Chess Interface) protocol types and utilities.
//!
//! This module covers the text of the protocol: the commands we send and how
//! the lines an engine prints are classified. Talking to an actual process is
//! the job of `models::engine`.

use std::fmt;

use super::chess::{PieceType, Position};

/// UCI commands that can be sent to an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    /// Initialize UCI mode
    Uci,
    /// Check if engine is ready
    IsReady,
    /// Set an engine option
    SetOption { name: String, value: String },
    /// Set the position to search from
    Position { fen: String },
    /// Search to a fixed depth
    GoDepth(u32),
    /// Stop searching and report a move
    Stop,
    /// Quit the engine
    Quit,
}

impl UciCommand {
    pub fn set_option(name: &str, value: impl fmt::Display) -> Self {
        UciCommand::SetOption {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// Convert command to UCI protocol string
    pub fn to_uci_string(&self) -> String {
        match self {
            UciCommand::Uci => "uci".to_string(),
            UciCommand::IsReady => "isready".to_string(),
            UciCommand::SetOption { name, value } => {
                format!("setoption name {} value {}", name, value)
            }
            UciCommand::Position { fen } => format!("position fen {}", fen),
            UciCommand::GoDepth(d) => format!("go depth {}", d),
            UciCommand::Stop => "stop".to_string(),
            UciCommand::Quit => "quit".to_string(),
        }
    }
}

/// Engine output lines, categorized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciOutputKind {
    /// "uciok" - engine is ready for UCI
    UciOk,
    /// "readyok" - engine is ready
    ReadyOk,
    /// "info ..." - search progress
    Info(String),
    /// "bestmove ..." - the answer to a search, everything after the keyword
    BestMove(String),
    /// Anything else
    Other(String),
}

impl UciOutputKind {
    /// Parse a raw UCI output line into a categorized type
    pub fn parse(line: &str) -> Self {
        let line = line.trim();

        if line == "uciok" {
            UciOutputKind::UciOk
        } else if line == "readyok" {
            UciOutputKind::ReadyOk
        } else if let Some(rest) = line.strip_prefix("info ") {
            UciOutputKind::Info(rest.to_string())
        } else if let Some(rest) = line
            .strip_prefix("bestmove")
            .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            UciOutputKind::BestMove(rest.trim().to_string())
        } else {
            UciOutputKind::Other(line.to_string())
        }
    }
}

/// A line from the engine together with its category
#[derive(Debug, Clone)]
pub struct UciOutput {
    pub raw: String,
    pub kind: UciOutputKind,
}

impl UciOutput {
    pub fn new(line: String) -> Self {
        let kind = UciOutputKind::parse(&line);
        Self { raw: line, kind }
    }
}

/// A move in UCI long algebraic form: `<from><to>[promotion]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UciMove {
    pub from: Position,
    pub to: Position,
    pub promotion: Option<PieceType>,
}

impl UciMove {
    /// Parse a token such as `e2e4` or `a7a8q`
    pub fn from_uci(token: &str) -> Option<Self> {
        if !token.is_ascii() || !(4..=5).contains(&token.len()) {
            return None;
        }
        let from = Position::from_algebraic(&token[0..2])?;
        let to = Position::from_algebraic(&token[2..4])?;
        let promotion = match token[4..].chars().next() {
            Some(c) => Some(PieceType::from_promotion_char(c)?),
            None => None,
        };
        Some(Self { from, to, promotion })
    }
}

impl fmt::Display for UciMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.fen_letter())?;
        }
        Ok(())
    }
}
