//! Kind classifier: maps a syntactic category to its spacing kind
//!
//! Decoration does not change a declaration's kind; it only disqualifies
//! collapse (see [`crate::collapse`]).

use crate::parser::ast::{Category, Kind};

/// Spacing kind for a syntactic category
pub fn kind_of(category: Category) -> Kind {
    match category {
        Category::Class => Kind::TypeLike,
        Category::Def => Kind::FunctionLike,
        Category::If
        | Category::While
        | Category::For
        | Category::Try
        | Category::With
        | Category::Unknown => Kind::Compound,
        Category::Simple | Category::Comment | Category::Verbatim => Kind::Data,
    }
}

/// Whether the normalizer understands the construct well enough to merge it
/// with its neighbours. Unsupported constructs are always kept apart.
pub fn is_supported(category: Category) -> bool {
    category != Category::Unknown
}

/// Kinds that own a body of their own
pub fn has_body(kind: Kind) -> bool {
    kind != Kind::Data
}
