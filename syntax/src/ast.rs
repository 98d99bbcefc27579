/// type alias just to make type signatures look more consistent.
pub type Ident<'a> = &'a str;

/// The right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value<'a> {
    /// "some quoted value" or unquoted_value_without_spaces
    Literal(&'a str),
    /// [value1, "value 2", value3]
    List(Vec<&'a str>),
}

impl<'a> Value<'a> {
    /// View this value as a list; a literal is a list of one.
    pub fn to_list(&self) -> Vec<&'a str> {
        match self {
            Self::Literal(s) => vec![*s],
            Self::List(items) => items.clone(),
        }
    }
}

/// `key = value`
pub type Assignment<'a> = (Ident<'a>, Value<'a>);

/// One line (or nested block) inside a `package { ... }` block.
#[derive(Debug, PartialEq, Eq)]
pub enum Entry<'a> {
    Field(Assignment<'a>),
    Configuration(Vec<Assignment<'a>>),
}

/// A `package <identifier> { ... }` block from a manifest file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PackageBlock<'a> {
    /// Globally unique package identifier, e.g. `org.vistrails.vtk`.
    pub identifier: &'a str,
    /// Metadata fields, in file order.
    pub fields: Vec<Assignment<'a>>,
    /// Entries of any `configuration { ... }` sub-blocks, in file order.
    pub configuration: Vec<Assignment<'a>>,
}

impl<'a> PackageBlock<'a> {
    pub fn from_entries(identifier: &'a str, entries: Vec<Entry<'a>>) -> Self {
        let mut block = Self {
            identifier,
            fields: Vec::with_capacity(entries.len()),
            configuration: Vec::with_capacity(0),
        };
        for entry in entries {
            match entry {
                Entry::Field(asst) => block.fields.push(asst),
                Entry::Configuration(mut assts) => block.configuration.append(&mut assts),
            }
        }
        block
    }
}

/// One high-level item in a manifest or startup file.
#[derive(Debug, PartialEq, Eq)]
pub enum Item<'a> {
    /// A package definition.
    Package(PackageBlock<'a>),
    /// A top-level `key = value` setting.
    Setting(Assignment<'a>),
}
