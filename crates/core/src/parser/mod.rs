use crate::error::{AnalysisError, Result};
use structscope_api::Language;
use tree_sitter::{Node, Parser, Tree};

/// An immutable syntax tree, shared between cached results.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    language: Language,
    tree: Tree,
    has_errors: bool,
}

impl SyntaxTree {
    pub fn new(language: Language, tree: Tree) -> Self {
        let has_errors = tree.root_node().has_error();
        Self {
            language,
            tree,
            has_errors,
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// True if the grammar had to recover from syntax errors. The tree is
    /// still usable; error regions simply yield no elements.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }
}

/// Turns source bytes into a syntax tree.
pub trait SyntaxParser: Send + Sync {
    fn parse(
        &self,
        language: &Language,
        grammar: &tree_sitter::Language,
        source: &[u8],
    ) -> Result<SyntaxTree>;
}

/// Default parser backed by tree-sitter. A fresh `Parser` per call keeps it
/// usable from any blocking thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeSitterParser;

impl SyntaxParser for TreeSitterParser {
    fn parse(
        &self,
        language: &Language,
        grammar: &tree_sitter::Language,
        source: &[u8],
    ) -> Result<SyntaxTree> {
        let mut parser = Parser::new();
        parser
            .set_language(grammar)
            .map_err(|e| AnalysisError::ParseFailure {
                language: language.clone(),
                reason: format!("incompatible grammar: {e}"),
            })?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| AnalysisError::ParseFailure {
                language: language.clone(),
                reason: "parser produced no tree".into(),
            })?;

        let tree = SyntaxTree::new(language.clone(), tree);
        if tree.has_errors() {
            tracing::debug!("{} source parsed with syntax errors", language);
        }
        Ok(tree)
    }
}
