//! Rule-based grouping for links.
//!
//! A group holds `include` blocks and `exclude` blocks. A link is in the
//! group when it passes ALL include blocks and NONE of the exclude blocks.
//! Within a block, a link passes if ANY tag, name, or URL matches.
//!
//! Groups are stored flat (see [`assemble::flatten`]) and rebuilt on read
//! (see [`assemble::assemble`]).

use core::borrow::Borrow;

use crate::models::{group::Group, link::Link};

pub mod assemble;
pub mod evaluate;

/// Keeps only the links that belong in `group`.
///
/// This is a stable filter. Links come out in the order they went in.
pub fn filter_links<I>(links: I, group: &Group) -> Vec<I::Item>
where
    I: IntoIterator,
    I::Item: Borrow<Link>,
{
    links
        .into_iter()
        .filter(|link| group.matches(<I::Item as Borrow<Link>>::borrow(link)))
        .collect()
}
