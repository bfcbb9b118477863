//! Document-collection model and reader.
//!
//! One document per line: `<text_id> <term_1> <term_2> ...` with 1-based
//! word positions in source order. The reader folds each document into a
//! sorted term -> positions map and tracks the collection statistics the
//! index sizing needs.

use std::collections::{BTreeMap, HashSet};
use std::io::{self, BufRead};

/// One term of a document with its word positions (1-based, ascending).
#[derive(Debug, Clone)]
pub struct TermPositions {
    /// The term string.
    pub term: String,
    /// 1-based positions of the term's occurrences.
    pub positions: Vec<u32>,
}

/// A parsed document.
#[derive(Debug, Clone)]
pub struct Document {
    /// The document's textual identifier (first token of its line).
    pub text_id: String,
    /// Distinct terms with positions, sorted by term.
    pub terms: Vec<TermPositions>,
    /// Document length in words.
    pub length: u32,
}

impl Document {
    /// Number of distinct terms, which is the number of postings this
    /// document contributes.
    pub fn unique_terms(&self) -> usize {
        self.terms.len()
    }
}

/// A whole collection plus the aggregate statistics used for sizing.
#[derive(Debug, Default)]
pub struct Collection {
    /// Documents in input order; docids are assigned 1-based from this
    /// order.
    pub documents: Vec<Document>,
    /// Total number of words across the collection.
    pub total_terms: usize,
    /// Sum of distinct terms per document.
    pub total_postings: usize,
    /// Vocabulary size.
    pub unique_terms: usize,
}

impl Collection {
    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when no documents were read.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Read a collection from `input`. Lines without any token are skipped.
pub fn read_collection<R: BufRead>(input: R) -> io::Result<Collection> {
    let mut collection = Collection::default();
    let mut vocabulary: HashSet<String> = HashSet::new();

    for line in input.lines() {
        let line = line?;
        let mut tokens = line.split_whitespace();
        let Some(text_id) = tokens.next() else {
            continue;
        };

        let mut term_to_pos: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        let mut position = 1u32;
        for term in tokens {
            term_to_pos.entry(term.to_string()).or_default().push(position);
            position += 1;
        }

        collection.total_postings += term_to_pos.len();
        collection.total_terms += position as usize - 1;
        for term in term_to_pos.keys() {
            if !vocabulary.contains(term) {
                vocabulary.insert(term.clone());
            }
        }

        let terms = term_to_pos
            .into_iter()
            .map(|(term, positions)| TermPositions { term, positions })
            .collect();
        collection.documents.push(Document {
            text_id: text_id.to_string(),
            terms,
            length: position - 1,
        });
    }

    collection.unique_terms = vocabulary.len();
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_based_in_source_order() {
        let collection = read_collection("doc1 b a b\n".as_bytes()).unwrap();
        let doc = &collection.documents[0];
        assert_eq!(doc.text_id, "doc1");
        assert_eq!(doc.length, 3);
        assert_eq!(doc.unique_terms(), 2);
        // Sorted by term.
        assert_eq!(doc.terms[0].term, "a");
        assert_eq!(doc.terms[0].positions, vec![2]);
        assert_eq!(doc.terms[1].term, "b");
        assert_eq!(doc.terms[1].positions, vec![1, 3]);
    }

    #[test]
    fn statistics_cover_the_whole_collection() {
        let input = "d1 a b a\nd2 b c\n";
        let collection = read_collection(input.as_bytes()).unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.total_terms, 5);
        assert_eq!(collection.total_postings, 4);
        assert_eq!(collection.unique_terms, 3);
    }

    #[test]
    fn document_without_terms_is_kept() {
        let collection = read_collection("lonely\n".as_bytes()).unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.documents[0].length, 0);
        assert!(collection.documents[0].terms.is_empty());
    }
}
