//! The wrapping line Formatter: turns the piece chain into
//! display rows, expanding tabs and escaping non-printable/high bytes, and
//! caches beginning-of-line (BoL) positions so vertical motion and framing
//! don't re-wrap the whole document on every keystroke.
//!
//! Depends only on `core-text`'s public `Location`/`Document` API. No
//! terminal I/O lives here (see `core-terminal::Screen` for that seam).

pub mod formatter;
pub mod ladder;

pub use formatter::Formatter;
pub use ladder::Ladder;
