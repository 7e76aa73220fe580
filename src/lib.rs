/*! # `tabinator`

The backend library for Tabinator, a personal link manager.

## Purpose

Users save links with tags, then sort them into rule-based groups. A group
says which links it wants with `include` blocks and which it doesn't with
`exclude` blocks:

- every include block must match (AND),
- no exclude block may match (OR, then negated),
- a block matches when any of its tags, names, or URLs match.

Everything a user has can be exported to (and imported from) a single JSON
bundle.

## Layout

- [`grouping`]: the rule engine. It's pure, so you can run it anywhere.
- [`database`]: a SQLite store for links, tags, and groups.
- [`bundle`]: the JSON export/import format.
- [`config`]: app configuration, including input limits.
*/

pub mod bundle;
pub mod config;
pub mod database;
pub mod error;
pub mod grouping;
pub mod models;
pub mod validate;
