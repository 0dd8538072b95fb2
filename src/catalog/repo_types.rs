use sqlx::FromRow;

/// Which catalog table an operation targets. Tags and ingredients share
/// one shape and one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Tag,
    Ingredient,
}

impl AttributeKind {
    pub fn table(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tags",
            AttributeKind::Ingredient => "ingredients",
        }
    }

    /// Field name used when a recipe refers to this kind.
    pub fn relation_field(self) -> &'static str {
        self.table()
    }
}

/// A tag or ingredient row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Attribute {
    pub id: i64,
    pub name: String,
    pub user_id: i64,
}
