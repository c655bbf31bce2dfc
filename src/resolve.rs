use crate::template::Template;
use std::collections::HashSet;
use std::ops::Range;

/// The positional placeholder understood by the prepared-statement layer.
const MARKER: &str = "?";

/// An immutable resolved statement: the rewritten positional SQL text and
/// the slot map produced alongside it.
///
/// Slot `i` of the map (1-based, matching the `?` occurrence order in
/// [`sql`](Self::sql)) holds the logical parameter index that slot stands
/// for. Several slots may share one logical index when a declared name
/// repeats in the template body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStatement {
    sql: String,
    slots: Vec<usize>,
}

impl ResolvedStatement {
    /// The single-line, whitespace-collapsed positional SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The slot map: entry `i` is the logical index of positional slot `i + 1`.
    pub fn slots(&self) -> &[usize] {
        &self.slots
    }
}

/// Match cache of one [`Indexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cache {
    Unknown,
    At(usize),
    Exhausted,
}

/// A forward-only substring scanner that remembers its last match so the
/// resolution loop can re-query every candidate each round without
/// re-searching text it has already covered.
struct Indexer<'t> {
    target: &'t str,
    cache: Cache,
}

impl<'t> Indexer<'t> {
    fn new(target: &'t str) -> Self {
        Self {
            target,
            cache: Cache::Unknown,
        }
    }

    /// Byte offset of the next occurrence of the target at or after `from`.
    fn find(&mut self, body: &str, from: usize) -> Option<usize> {
        match self.cache {
            Cache::At(at) if from <= at => return Some(at),
            Cache::Exhausted => return None,
            _ => {}
        }
        match body[from..].find(self.target) {
            Some(relative) => {
                let at = from + relative;
                self.cache = Cache::At(at);
                Some(at)
            }
            None => {
                self.cache = Cache::Exhausted;
                None
            }
        }
    }

    /// Re-aligns the cached offset after `replaced` was spliced out of the
    /// body for a replacement `delta` bytes longer or shorter. A cache
    /// pointing into the replaced span no longer matches anything and is
    /// invalidated instead of shifted.
    fn shift(&mut self, replaced: &Range<usize>, delta: isize) {
        if let Cache::At(at) = self.cache {
            if replaced.contains(&at) {
                self.cache = Cache::Unknown;
            } else if at >= replaced.end {
                self.cache = Cache::At((at as isize + delta) as usize);
            }
        }
    }
}

/// Rewrites a template body into a pure positional statement and builds the
/// slot map.
///
/// A single left-to-right scan picks, at each position, the nearest next
/// occurrence among the literal `?` marker and every declared name. Declared
/// names win ties against the marker; among declared names the
/// first-declared wins. A matched name is spliced over with `?` and every
/// scanner cache is shifted by the length delta, so repeated names stay an
/// amortized single pass.
///
/// Logical indices of declared names come from their declarations. Bare `?`
/// markers are assigned the smallest logical indices no declaration claims,
/// counting up, one per occurrence.
///
/// The rewritten body is collapsed to a single line of SQL: all whitespace
/// runs become single spaces and the ends are trimmed.
pub fn resolve(template: &Template) -> ResolvedStatement {
    let mut body = template.body().to_owned();
    let declarations = template.declarations();

    let mut named: Vec<Indexer<'_>> = declarations
        .iter()
        .map(|declaration| Indexer::new(declaration.name()))
        .collect();
    let mut marker = Indexer::new(MARKER);

    let mut claimed: HashSet<usize> = declarations
        .iter()
        .map(|declaration| declaration.index())
        .collect();
    let mut next_bare = 1;

    let mut slots = Vec::new();
    let mut from = 0;

    loop {
        let mut nearest: Option<(usize, usize)> = None;
        for (declared, indexer) in named.iter_mut().enumerate() {
            if let Some(at) = indexer.find(&body, from) {
                if nearest.map_or(true, |(best, _)| at < best) {
                    nearest = Some((at, declared));
                }
            }
        }
        let marker_at = marker.find(&body, from);

        // The bare marker is only chosen when strictly ahead of every
        // declared name.
        let logical = match (nearest, marker_at) {
            (Some((at, declared)), found) if found.map_or(true, |found| at <= found) => {
                let replaced = at..at + declarations[declared].name().len();
                let delta = MARKER.len() as isize - replaced.len() as isize;
                body.replace_range(replaced.clone(), MARKER);
                for indexer in named.iter_mut() {
                    indexer.shift(&replaced, delta);
                }
                marker.shift(&replaced, delta);
                from = at + 1;
                declarations[declared].index()
            }
            (_, Some(at)) => {
                from = at + 1;
                while claimed.contains(&next_bare) {
                    next_bare += 1;
                }
                claimed.insert(next_bare);
                next_bare
            }
            (None, None) => break,
            // Unreachable: when `marker_at` is `None`, the first arm's guard
            // (`found.map_or(true, ...)`) always holds, so a `Some` nearest is
            // consumed there.
            (Some(_), None) => unreachable!(
                "a declared-name match with no marker is handled by the first arm"
            ),
        };
        slots.push(logical);
    }

    let sql = body.split_whitespace().collect::<Vec<_>>().join(" ");
    debug_assert_eq!(sql.matches(MARKER).count(), slots.len());
    ResolvedStatement { sql, slots }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(raw: &str) -> ResolvedStatement {
        resolve(&Template::parse(raw).unwrap())
    }

    #[test]
    fn test_bare_marker_without_header() {
        let statement = resolved("SELECT * FROM t WHERE id = ?");
        assert_eq!(statement.sql(), "SELECT * FROM t WHERE id = ?");
        assert_eq!(statement.slots(), &[1]);
    }

    #[test]
    fn test_declared_name_and_bare_marker() {
        let statement = resolved("/*\nname=2\n*/\nINSERT INTO t(a,b) VALUES (?, name)");
        assert_eq!(statement.sql(), "INSERT INTO t(a,b) VALUES (?, ?)");
        assert_eq!(statement.slots(), &[1, 2]);
    }

    #[test]
    fn test_repeated_name_shares_logical_index() {
        let statement = resolved("/*\n:id=1\n*/\nSELECT * FROM t WHERE a = :id OR b = :id");
        assert_eq!(statement.sql(), "SELECT * FROM t WHERE a = ? OR b = ?");
        assert_eq!(statement.slots(), &[1, 1]);
    }

    #[test]
    fn test_slot_order_follows_body_not_declarations() {
        let statement = resolved("/*\n:a=1\n:b=2\n*/\nSELECT :b, :a");
        assert_eq!(statement.sql(), "SELECT ?, ?");
        assert_eq!(statement.slots(), &[2, 1]);
    }

    #[test]
    fn test_bare_markers_skip_claimed_indices() {
        let statement = resolved("/*\n:a=1\n:b=2\n*/\nSELECT :a, ?, :b, ?");
        assert_eq!(statement.sql(), "SELECT ?, ?, ?, ?");
        assert_eq!(statement.slots(), &[1, 3, 2, 4]);
    }

    #[test]
    fn test_markers_interleaved_with_names() {
        let statement = resolved("/*\n:name=1\n*/\nSELECT ? FROM t WHERE n = :name AND m = ?");
        assert_eq!(statement.sql(), "SELECT ? FROM t WHERE n = ? AND m = ?");
        assert_eq!(statement.slots(), &[2, 1, 3]);
    }

    #[test]
    fn test_first_declared_name_wins_ties() {
        // Both names match at the same offset; the first-declared one is
        // replaced even though the other is longer.
        let statement = resolved("/*\nabc=1\nabcdef=2\n*/\nabcdef");
        assert_eq!(statement.sql(), "?def");
        assert_eq!(statement.slots(), &[1]);
    }

    #[test]
    fn test_leading_name_resolves_before_marker() {
        let statement = resolved("/*\n:x=2\n*/\n:x ?");
        assert_eq!(statement.sql(), "? ?");
        assert_eq!(statement.slots(), &[2, 1]);
    }

    #[test]
    fn test_whitespace_collapses_to_single_line() {
        let statement = resolved("/*\n:id=1\n*/\nSELECT *\n  FROM t\n\tWHERE id = :id\n");
        assert_eq!(statement.sql(), "SELECT * FROM t WHERE id = ?");
        assert_eq!(statement.slots(), &[1]);
    }

    #[test]
    fn test_marker_after_long_name_replacement() {
        // Replacing a long name shifts the later marker's offset; the cached
        // scan positions have to move with it.
        let statement = resolved("/*\nlongest_name=1\n*/\nlongest_name tail ?");
        assert_eq!(statement.sql(), "? tail ?");
        assert_eq!(statement.slots(), &[1, 2]);
    }

    #[test]
    fn test_declared_name_absent_from_body() {
        let statement = resolved("/*\n:missing=1\n*/\nSELECT ?");
        assert_eq!(statement.sql(), "SELECT ?");
        assert_eq!(statement.slots(), &[2]);
    }

    #[test]
    fn test_no_markers_at_all() {
        let statement = resolved("SELECT 1");
        assert_eq!(statement.sql(), "SELECT 1");
        assert!(statement.slots().is_empty());
    }

    #[test]
    fn test_total_marker_count_matches_slot_map() {
        let statement = resolved("/*\n:a=1\n:b=2\n*/\nSELECT :a, :b, ?, :a, ?");
        assert_eq!(statement.sql().matches('?').count(), statement.slots().len());
        assert_eq!(statement.slots(), &[1, 2, 3, 1, 4]);
    }
}
