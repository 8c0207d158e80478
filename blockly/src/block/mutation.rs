/// Structural metadata changing how a block's sockets are read.
///
/// Every attribute is optional in the serialized form. Absence decodes to
/// `false`, `0` or the empty string, and is a meaningful state: a
/// `controls_if` with `elseif_count == 0` simply has no `elseif` clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mutation {
    /// `lists_getIndex` / `lists_setIndex`: an `AT` socket is present.
    pub at: bool,
    /// `lists_getSublist`: an `AT1` socket is present.
    pub at1: bool,
    /// `lists_getSublist`: an `AT2` socket is present.
    pub at2: bool,
    /// `controls_if`: number of `elseif` clauses.
    pub elseif_count: u32,
    /// `controls_if`: non-zero when an `else` clause is present.
    pub else_count: u32,
    /// `text_join` / `lists_create_with`: number of `ADD` sockets.
    pub items: u32,
    /// Dropdown state some blocks keep in their mutation, verbatim: `SPLIT`
    /// or `JOIN` for `lists_split`, the `PROPERTY` choice for `math_property`.
    pub mode: String,
    /// The block sits in statement position rather than a value socket.
    pub statement: bool,
}

impl Mutation {
    pub fn is_default(&self) -> bool {
        *self == Mutation::default()
    }
}
