//! Full-text search: MySQL `MATCH ... AGAINST` and PostgreSQL tsvector/tsquery.

use super::Expr;
use crate::config;
use crate::dialect::DialectKind;
use crate::error::QueryResult;
use crate::render::BuildContext;
use crate::value::Value;

const MATCH_FEATURE: &str = "MATCH ... AGAINST";
const TSVECTOR_FEATURE: &str = "Full Text Search (tsvector)";

/// MySQL full-text search modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    NaturalLanguage,
    NaturalLanguageWithQueryExpansion,
    Boolean,
    QueryExpansion,
}

impl MatchMode {
    pub const fn as_sql(self) -> &'static str {
        match self {
            MatchMode::NaturalLanguage => "IN NATURAL LANGUAGE MODE",
            MatchMode::NaturalLanguageWithQueryExpansion => {
                "IN NATURAL LANGUAGE MODE WITH QUERY EXPANSION"
            }
            MatchMode::Boolean => "IN BOOLEAN MODE",
            MatchMode::QueryExpansion => "WITH QUERY EXPANSION",
        }
    }
}

/// Start a MySQL `MATCH(columns...)` builder.
pub fn match_columns<I, S>(columns: I) -> MatchBuilder
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    MatchBuilder {
        columns: columns.into_iter().map(Into::into).collect(),
        mode: None,
    }
}

/// Columns and mode for a `MATCH ... AGAINST` search.
#[derive(Debug, Clone)]
pub struct MatchBuilder {
    columns: Vec<String>,
    mode: Option<MatchMode>,
}

impl MatchBuilder {
    pub fn mode(mut self, mode: MatchMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Predicate form for WHERE/HAVING.
    pub fn against(&self, query: impl Into<String>) -> Expr {
        Expr::Match(MatchAgainst {
            columns: self.columns.clone(),
            mode: self.mode,
            query: query.into(),
        })
    }

    /// Relevance score for SELECT/ORDER BY. Renders the same SQL as
    /// [`MatchBuilder::against`]; MySQL evaluates it as a float in value position.
    pub fn score(&self, query: impl Into<String>) -> Expr {
        self.against(query)
    }
}

/// A bound `MATCH(...) AGAINST (...)` clause.
#[derive(Debug, Clone)]
pub struct MatchAgainst {
    pub columns: Vec<String>,
    pub mode: Option<MatchMode>,
    pub query: String,
}

impl MatchAgainst {
    pub(crate) fn build(&self, ctx: &mut BuildContext<'_>) -> QueryResult<String> {
        ctx.dialect().require(DialectKind::MySql, MATCH_FEATURE)?;
        let placeholder = ctx.bind(Value::Text(self.query.clone()));
        let columns = self.columns.join(", ");
        Ok(match self.mode {
            Some(mode) => format!("MATCH({columns}) AGAINST ({placeholder} {})", mode.as_sql()),
            None => format!("MATCH({columns}) AGAINST ({placeholder})"),
        })
    }
}

/// Which tsquery constructor parses the search text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TsQueryMode {
    #[default]
    Plain,
    WebSearch,
    Phrase,
}

impl TsQueryMode {
    pub const fn function(self) -> &'static str {
        match self {
            TsQueryMode::Plain => "plainto_tsquery",
            TsQueryMode::WebSearch => "websearch_to_tsquery",
            TsQueryMode::Phrase => "phraseto_tsquery",
        }
    }
}

/// Start a PostgreSQL `to_tsvector` builder over `columns`.
///
/// The text-search configuration is taken from
/// [`config::default_text_search_config`] at this point.
pub fn ts_vector<I, S>(columns: I) -> TsVector
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    TsVector {
        columns: columns.into_iter().map(Into::into).collect(),
        config: config::default_text_search_config(),
    }
}

/// `to_tsvector('<config>', <columns>)`
#[derive(Debug, Clone)]
pub struct TsVector {
    columns: Vec<String>,
    config: String,
}

impl TsVector {
    /// Override the text-search configuration.
    pub fn config(mut self, config: impl Into<String>) -> Self {
        self.config = config.into();
        self
    }

    /// Alias for [`TsVector::config`].
    pub fn language(self, language: impl Into<String>) -> Self {
        self.config(language)
    }

    pub fn search(&self, mode: TsQueryMode, query: impl Into<String>) -> TsSearch {
        TsSearch {
            vector: self.clone(),
            mode,
            query: query.into(),
        }
    }

    /// `... @@ plainto_tsquery(...)`
    pub fn plain_query(&self, query: impl Into<String>) -> Expr {
        Expr::TsMatch(self.search(TsQueryMode::Plain, query))
    }

    /// `... @@ websearch_to_tsquery(...)`
    pub fn web_search(&self, query: impl Into<String>) -> Expr {
        Expr::TsMatch(self.search(TsQueryMode::WebSearch, query))
    }

    /// `... @@ phraseto_tsquery(...)`
    pub fn phrase_query(&self, query: impl Into<String>) -> Expr {
        Expr::TsMatch(self.search(TsQueryMode::Phrase, query))
    }

    /// `ts_rank(...)` using `plainto_tsquery`.
    pub fn rank_plain_query(&self, query: impl Into<String>) -> Expr {
        self.rank(TsQueryMode::Plain, query, None)
    }

    /// `ts_rank(...)` using `websearch_to_tsquery`.
    pub fn rank_web_search(&self, query: impl Into<String>) -> Expr {
        self.rank(TsQueryMode::WebSearch, query, None)
    }

    /// `ts_rank(vector, query[, normalization])`
    pub fn rank(
        &self,
        mode: TsQueryMode,
        query: impl Into<String>,
        normalization: Option<i32>,
    ) -> Expr {
        Expr::TsRank {
            search: self.search(mode, query),
            normalization,
        }
    }

    fn document(&self) -> String {
        match self.columns.as_slice() {
            [] => "''".to_string(),
            [single] => single.clone(),
            many => format!("CONCAT_WS(' ', {})", many.join(", ")),
        }
    }
}

/// A tsvector matched against one tsquery.
#[derive(Debug, Clone)]
pub struct TsSearch {
    vector: TsVector,
    mode: TsQueryMode,
    query: String,
}

impl TsSearch {
    fn build_parts(&self, ctx: &mut BuildContext<'_>) -> QueryResult<(String, String)> {
        ctx.dialect().require(DialectKind::Postgres, TSVECTOR_FEATURE)?;
        let config = escape_single_quotes(&self.vector.config);
        let vector = format!("to_tsvector('{config}', {})", self.vector.document());
        let placeholder = ctx.bind(Value::Text(self.query.clone()));
        let query = format!("{}('{config}', {placeholder})", self.mode.function());
        Ok((vector, query))
    }

    pub(crate) fn build_match(&self, ctx: &mut BuildContext<'_>) -> QueryResult<String> {
        let (vector, query) = self.build_parts(ctx)?;
        Ok(format!("{vector} @@ {query}"))
    }

    pub(crate) fn build_rank(
        &self,
        normalization: Option<i32>,
        ctx: &mut BuildContext<'_>,
    ) -> QueryResult<String> {
        let (vector, query) = self.build_parts(ctx)?;
        Ok(match normalization {
            Some(n) => format!("ts_rank({vector}, {query}, {n})"),
            None => format!("ts_rank({vector}, {query})"),
        })
    }
}

/// Escape a string for interpolation inside a single-quoted SQL literal.
pub(crate) fn escape_single_quotes(value: &str) -> String {
    value.replace('\'', "''")
}
