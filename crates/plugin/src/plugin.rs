use crate::error::PluginResult;
use crate::query::{QueryDefinitions, RawMatch, SourceText};
use structscope_api::{CodeElement, Language, QueryKind};

/// The capability surface every language plugin implements.
///
/// Shared code depends on this trait only; every language-specific decision
/// (what to query, how to turn matches into elements) lives behind it.
pub trait LanguagePlugin: Send + Sync {
    fn language(&self) -> Language;

    /// Supported file extensions, without the leading dot.
    fn extensions(&self) -> &[&str];

    /// Grammar the plugin's queries are written against.
    fn grammar(&self) -> tree_sitter::Language;

    fn query_definitions(&self) -> &QueryDefinitions;

    fn supports(&self, kind: &QueryKind) -> bool {
        self.query_definitions().contains_key(kind)
    }

    /// Node kinds that hold comments, used for line statistics.
    fn comment_node_kinds(&self) -> &[&str] {
        &["comment"]
    }

    /// Turn the raw matches of the `kind` query into elements, in source order.
    fn extract(
        &self,
        kind: &QueryKind,
        matches: &[RawMatch<'_>],
        source: &SourceText<'_>,
    ) -> PluginResult<Vec<CodeElement>>;
}
