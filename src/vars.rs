//! Variable identity
//!
//! Caller-facing variables are strings. The engine only knows integer ids, so
//! the [`Registry`] keeps both directions of the mapping and hands out fresh
//! anonymous names for auxiliary variables introduced by the encoders.

use crate::engine::PbEngine;
use crate::{PbError, Result};
use rustc_hash::FxHashMap;
use std::borrow::Borrow;
use std::fmt;

/// First character of every generated (anonymous) variable name
pub const ANONYMOUS_SENTINEL: char = '`';

/// Engine-side identity of a variable (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(u32);

impl VarId {
    /// Creates an id from its raw index
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw 0-based index
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A validated variable name
///
/// Names are arbitrary strings without line breaks. Names starting with
/// [`ANONYMOUS_SENTINEL`] are reserved for generated variables and must be
/// the sentinel followed by a decimal number without leading zeros.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarName(String);

impl VarName {
    /// Parses and validates a variable name
    pub fn parse(name: &str) -> Result<Self> {
        if name.contains(['\n', '\r']) {
            return Err(PbError::Validation(format!(
                "variable name {name:?} contains a line break"
            )));
        }
        if let Some(suffix) = name.strip_prefix(ANONYMOUS_SENTINEL) {
            if !is_generated_suffix(suffix) {
                return Err(PbError::Validation(format!(
                    "variable name {name:?} uses the reserved prefix '{ANONYMOUS_SENTINEL}' \
                     but is not a generated name"
                )));
            }
        }
        Ok(Self(name.to_owned()))
    }

    /// Builds the name of the `n`th generated variable
    fn anonymous(n: u64) -> Self {
        Self(format!("{ANONYMOUS_SENTINEL}{n}"))
    }

    /// Returns true for generated names
    pub fn is_anonymous(&self) -> bool {
        self.0.starts_with(ANONYMOUS_SENTINEL)
    }

    /// The name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Decimal digits, no leading zero, at least one digit.
fn is_generated_suffix(suffix: &str) -> bool {
    let bytes = suffix.as_bytes();
    !bytes.is_empty() && bytes[0] != b'0' && bytes.iter().all(u8::is_ascii_digit)
}

impl fmt::Display for VarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VarName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for VarName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for VarName {
    type Error = PbError;

    fn try_from(name: &str) -> Result<Self> {
        Self::parse(name)
    }
}

/// A registered variable: its name and engine id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: VarName,
    id: VarId,
}

impl Variable {
    /// The variable's name
    pub fn name(&self) -> &VarName {
        &self.name
    }

    /// The variable's engine id
    pub fn id(&self) -> VarId {
        self.id
    }
}

/// Bidirectional name ⇄ id mapping for one solver instance
///
/// Once a name is registered its id never changes. After [`Registry::seal`]
/// (called on the first solve) no new names are accepted.
#[derive(Debug)]
pub struct Registry {
    ids: FxHashMap<VarName, VarId>,
    names: FxHashMap<VarId, VarName>,
    next_anonymous: u64,
    sealed: bool,
}

impl Registry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            ids: FxHashMap::default(),
            names: FxHashMap::default(),
            next_anonymous: 1,
            sealed: false,
        }
    }

    /// Registers a name, allocating an engine id on first mention
    ///
    /// Registering a known name is side-effect free. A new name after the
    /// registry was sealed is a usage error.
    pub fn register<E: PbEngine + ?Sized>(
        &mut self,
        name: &VarName,
        engine: &mut E,
    ) -> Result<Variable> {
        if let Some(&id) = self.ids.get(name) {
            return Ok(Variable {
                name: name.clone(),
                id,
            });
        }
        if self.sealed {
            return Err(PbError::Usage(format!(
                "no new variables after first solve (got '{name}')"
            )));
        }

        let id = engine.new_var();
        self.ids.insert(name.clone(), id);
        self.names.insert(id, name.clone());
        Ok(Variable {
            name: name.clone(),
            id,
        })
    }

    /// Creates a fresh anonymous variable
    ///
    /// Skips over any generated-looking name the caller already registered,
    /// so the result is always a new variable.
    pub fn generate<E: PbEngine + ?Sized>(&mut self, engine: &mut E) -> Result<Variable> {
        let mut name = VarName::anonymous(self.next_anonymous);
        while self.ids.contains_key(&name) {
            self.next_anonymous += 1;
            name = VarName::anonymous(self.next_anonymous);
        }
        let var = self.register(&name, engine)?;
        self.next_anonymous += 1;
        Ok(var)
    }

    /// Looks up the id of a registered name
    pub fn id_of(&self, name: &str) -> Option<VarId> {
        self.ids.get(name).copied()
    }

    /// Looks up the name behind an engine id
    ///
    /// Engine-internal variables (guards, encoder auxiliaries) have no name.
    pub fn name_of(&self, id: VarId) -> Option<&VarName> {
        self.names.get(&id)
    }

    /// Stops accepting new names
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Whether new names are still accepted
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Number of registered names (including anonymous ones)
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no name was registered yet
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
