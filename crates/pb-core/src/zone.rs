//! Drop-zone ids: UI-addressable insertion slots.
//!
//! Grammar (parsed with `winnow` 0.7):
//!
//! ```text
//! zone   := "root:" index
//!         | "in:" parent ":" ("col" index ":")? index
//! parent := [^:]+
//! index  := [0-9]+
//! ```
//!
//! `root:3` is root position 3, `in:cols_1:2` is position 2 inside
//! `cols_1`, `in:cols_1:col1:0` is the head of column 1 of `cols_1`.

use crate::id::NodeId;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use winnow::ascii::digit1;
use winnow::combinator::{alt, opt, preceded, terminated};
use winnow::prelude::*;
use winnow::token::take_while;

/// An insertion slot in the page tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropZone {
    /// Position `index` among the root nodes.
    Root { index: usize },
    /// Position `index` inside `parent`; with `column`, position within that column.
    Inside {
        parent: NodeId,
        column: Option<usize>,
        index: usize,
    },
}

/// A zone id that does not follow the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid drop zone `{input}`: {message}")]
pub struct ZoneParseError {
    pub input: String,
    pub message: String,
}

impl DropZone {
    pub fn root(index: usize) -> Self {
        Self::Root { index }
    }

    pub fn inside(parent: NodeId, index: usize) -> Self {
        Self::Inside {
            parent,
            column: None,
            index,
        }
    }

    pub fn in_column(parent: NodeId, column: usize, index: usize) -> Self {
        Self::Inside {
            parent,
            column: Some(column),
            index,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root { .. })
    }

    pub fn parent(&self) -> Option<NodeId> {
        match self {
            Self::Root { .. } => None,
            Self::Inside { parent, .. } => Some(*parent),
        }
    }

    pub fn column(&self) -> Option<usize> {
        match self {
            Self::Root { .. } => None,
            Self::Inside { column, .. } => *column,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Root { index } | Self::Inside { index, .. } => *index,
        }
    }
}

impl fmt::Display for DropZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root { index } => write!(f, "root:{index}"),
            Self::Inside {
                parent,
                column: None,
                index,
            } => write!(f, "in:{}:{index}", parent.as_str()),
            Self::Inside {
                parent,
                column: Some(c),
                index,
            } => write!(f, "in:{}:col{c}:{index}", parent.as_str()),
        }
    }
}

impl FromStr for DropZone {
    type Err = ZoneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_zone.parse(s).map_err(|e| ZoneParseError {
            input: s.to_string(),
            message: e.to_string(),
        })
    }
}

// ─── Parsers ─────────────────────────────────────────────────────────────

fn parse_zone(input: &mut &str) -> ModalResult<DropZone> {
    alt((
        preceded("root:", parse_index).map(DropZone::root),
        preceded("in:", parse_inside),
    ))
    .parse_next(input)
}

fn parse_inside(input: &mut &str) -> ModalResult<DropZone> {
    let parent = take_while(1.., |c: char| c != ':')
        .map(NodeId::intern)
        .parse_next(input)?;
    let _ = ':'.parse_next(input)?;
    let column = opt(terminated(preceded("col", parse_index), ':')).parse_next(input)?;
    let index = parse_index.parse_next(input)?;
    Ok(DropZone::Inside {
        parent,
        column,
        index,
    })
}

fn parse_index(input: &mut &str) -> ModalResult<usize> {
    digit1.try_map(str::parse::<usize>).parse_next(input)
}
