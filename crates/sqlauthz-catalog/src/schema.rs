/// Schema: a named container of objects with a single owner.
///
/// Every object in a schema is owned by the schema owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub name: String,
    pub owner: String,
    /// System schemas (`SYS`, `SYSFUN`, `SYSCS_UTIL`) are never targets of DDL
    pub system: bool,
}

impl Schema {
    pub fn new(name: String, owner: String) -> Self {
        Schema { name, owner, system: false }
    }

    pub fn system(name: String, owner: String) -> Self {
        Schema { name, owner, system: true }
    }
}
