use crate::dialect::DialectKind;

/// One optimizer hint, optionally restricted to a dialect kind.
///
/// Hints that do not apply to the render dialect are dropped; the rest are
/// joined into a single `/*+ ... */` comment after the statement verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerHint {
    text: String,
    dialect: Option<DialectKind>,
}

impl OptimizerHint {
    /// Hint emitted on every dialect.
    pub fn any(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            dialect: None,
        }
    }

    pub fn mysql(text: impl Into<String>) -> Self {
        Self::for_kind(DialectKind::MySql, text)
    }

    /// pg_hint_plan style hint.
    pub fn postgres(text: impl Into<String>) -> Self {
        Self::for_kind(DialectKind::Postgres, text)
    }

    pub fn for_kind(kind: DialectKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            dialect: Some(kind),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn dialect(&self) -> Option<DialectKind> {
        self.dialect
    }

    pub(crate) fn applies_to(&self, active: Option<DialectKind>) -> bool {
        match self.dialect {
            None => true,
            Some(kind) => active == Some(kind),
        }
    }
}
