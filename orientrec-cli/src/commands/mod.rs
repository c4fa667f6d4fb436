//! CLI command implementations.

pub mod common;
pub mod config;
pub mod inspect;
pub mod list;
pub mod replay;
pub mod simulate;

use console::{style, StyledObject};
use orientrec::orientation::ChangeKind;

/// Coloured one-letter tag for an event kind.
pub fn kind_tag(kind: ChangeKind) -> StyledObject<char> {
    let tag = style(kind.tag());
    match kind {
        ChangeKind::Orientation => tag.cyan(),
        ChangeKind::Location => tag.green(),
        ChangeKind::Accuracy => tag.yellow(),
    }
}
