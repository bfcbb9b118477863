//! Query-file model and reader.
//!
//! One query per line: the first whitespace-separated token is the query id,
//! the rest are terms. Terms are a set; duplicates collapse to the first
//! occurrence.

use std::io::{self, BufRead};

use rustc_hash::FxHashSet;

/// A parsed query: an identifier and its distinct terms.
#[derive(Debug, Clone)]
pub struct Query {
    /// Query identifier (the first token of the line).
    pub id: String,
    /// Distinct terms, in first-occurrence order.
    pub terms: Vec<String>,
}

/// Read all queries from `input`. Lines without any token are skipped.
pub fn read_queries<R: BufRead>(input: R) -> io::Result<Vec<Query>> {
    let mut queries = Vec::new();
    for line in input.lines() {
        let line = line?;
        let mut tokens = line.split_whitespace();
        let Some(id) = tokens.next() else {
            continue;
        };
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut terms = Vec::new();
        for token in tokens {
            if seen.insert(token) {
                terms.push(token.to_string());
            }
        }
        queries.push(Query { id: id.to_string(), terms });
    }
    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_id_and_terms() {
        let input = "q1 apple banana\nq2 cherry\n";
        let queries = read_queries(input.as_bytes()).unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].id, "q1");
        assert_eq!(queries[0].terms, vec!["apple", "banana"]);
        assert_eq!(queries[1].terms, vec!["cherry"]);
    }

    #[test]
    fn duplicate_terms_collapse() {
        let queries = read_queries("7 the quick the the fox\n".as_bytes()).unwrap();
        assert_eq!(queries[0].terms, vec!["the", "quick", "fox"]);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let queries = read_queries("\n\nq1 a\n\n".as_bytes()).unwrap();
        assert_eq!(queries.len(), 1);
    }

    #[test]
    fn id_only_query_has_no_terms() {
        let queries = read_queries("q9\n".as_bytes()).unwrap();
        assert_eq!(queries[0].id, "q9");
        assert!(queries[0].terms.is_empty());
    }
}
