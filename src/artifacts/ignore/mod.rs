//! Ignore rules
//!
//! Rules are read from `info/exclude`, the user-wide excludes file and tracked
//! `.gitignore` files, using the usual line syntax (`#` comments, `!` negation, `\`
//! escapes).

pub mod ignore_rule;
pub mod ignores;
