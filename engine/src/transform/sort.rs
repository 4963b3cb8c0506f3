//! Multi-key stable sort.
//!
//! Keys are listed most significant first. One stable pass is made per key,
//! least significant first, so the most significant key ends up dominating
//! and ties keep the order left by the earlier passes.
//!
//! Comparison is plain lexicographic on the cell text. Chronological order
//! comes from sorting on `DescDateTimeStamp`.

use std::cmp::Ordering;

use crate::error::Issue;
use crate::logs::RunLog;
use crate::models::{Row, Table};
use crate::settings::{Settings, SortDirection, SortKey};

use super::pipeline::StageStatus;

pub(crate) const SORT_STAGE: &str = "sort";

/// Sort the rows by the configured keys.
pub fn sort_rows(table: &mut Table, settings: &Settings, log: &mut RunLog) -> StageStatus {
    if settings.sort_order.is_empty() {
        log.report(Issue::SettingAbsent {
            stage: SORT_STAGE,
            reason: "no sort order specified".to_string(),
        });
        return StageStatus::Skipped;
    }

    let mut applied = false;
    for key in settings.sort_order.iter().rev() {
        if !table.has_column(&key.column) {
            log.report(Issue::MissingColumn {
                stage: SORT_STAGE,
                column: key.column.clone(),
            });
            continue;
        }

        sort_by_key(table, key);
        log.info_indent(format!("Sorting by {} ({})", key.column, key.direction.as_str()), 1);
        applied = true;
    }

    if applied {
        StageStatus::Applied
    } else {
        StageStatus::Skipped
    }
}

/// One stable pass over a single key. A missing cell sorts as empty text.
pub fn sort_by_key(table: &mut Table, key: &SortKey) {
    table
        .rows_mut()
        .sort_by(|a, b| compare(a, b, &key.column, key.direction));
}

fn compare(a: &Row, b: &Row, column: &str, direction: SortDirection) -> Ordering {
    let left = a.get(column).map_or("", String::as_str);
    let right = b.get(column).map_or("", String::as_str);
    match direction {
        SortDirection::Ascending => left.cmp(right),
        SortDirection::Descending => right.cmp(left),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;

    fn key(column: &str, direction: SortDirection) -> SortKey {
        SortKey {
            column: column.into(),
            direction,
        }
    }

    fn column(table: &Table, name: &str) -> Vec<String> {
        table
            .rows()
            .iter()
            .map(|r| r.get(name).cloned().unwrap_or_default())
            .collect()
    }

    fn with_keys(keys: Vec<SortKey>) -> Settings {
        Settings {
            sort_order: keys,
            ..Settings::default()
        }
    }

    #[test]
    fn test_single_key_ascending_and_descending() {
        let mut table = parse_table("A\nb\nc\na\n").unwrap();
        let mut log = RunLog::new();

        sort_rows(&mut table, &with_keys(vec![key("A", SortDirection::Ascending)]), &mut log);
        assert_eq!(column(&table, "A"), ["a", "b", "c"]);

        sort_rows(&mut table, &with_keys(vec![key("A", SortDirection::Descending)]), &mut log);
        assert_eq!(column(&table, "A"), ["c", "b", "a"]);
    }

    #[test]
    fn test_multi_key_matches_sequential_stable_passes() {
        let input = "A,B,Id\n2,x,1\n1,y,2\n2,z,3\n1,x,4\n2,y,5\n1,z,6\n";
        let settings = with_keys(vec![
            key("A", SortDirection::Ascending),
            key("B", SortDirection::Descending),
        ]);

        let mut table = parse_table(input).unwrap();
        sort_rows(&mut table, &settings, &mut RunLog::new());

        let mut expected = parse_table(input).unwrap();
        sort_by_key(&mut expected, &key("B", SortDirection::Descending));
        sort_by_key(&mut expected, &key("A", SortDirection::Ascending));

        assert_eq!(column(&table, "Id"), column(&expected, "Id"));
        assert_eq!(column(&table, "Id"), ["6", "2", "4", "3", "5", "1"]);
    }

    fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let first = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, first.clone());
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn test_multi_key_over_all_input_orders() {
        // (A, B, Id); the two (1, x) rows tie on both keys
        let rows = [
            ("1", "x", "a"),
            ("1", "x", "b"),
            ("2", "y", "c"),
            ("1", "y", "d"),
            ("2", "x", "e"),
        ];
        let settings = with_keys(vec![
            key("A", SortDirection::Ascending),
            key("B", SortDirection::Descending),
        ]);

        for order in permutations(&rows) {
            let mut csv = String::from("A,B,Id\n");
            for (a, b, id) in &order {
                csv.push_str(&format!("{},{},{}\n", a, b, id));
            }
            let mut table = parse_table(&csv).unwrap();
            sort_rows(&mut table, &settings, &mut RunLog::new());

            let mut expected = order.clone();
            expected.sort_by(|p, q| p.0.cmp(&q.0).then(q.1.cmp(&p.1)));
            let expected: Vec<&str> = expected.iter().map(|r| r.2).collect();

            assert_eq!(column(&table, "Id"), expected, "input order {:?}", order);
        }
    }

    #[test]
    fn test_ties_keep_previous_order() {
        let mut table = parse_table("A,Id\nk,1\nk,2\nk,3\n").unwrap();
        sort_rows(
            &mut table,
            &with_keys(vec![key("A", SortDirection::Descending)]),
            &mut RunLog::new(),
        );
        assert_eq!(column(&table, "Id"), ["1", "2", "3"]);
    }

    #[test]
    fn test_lexicographic_not_numeric() {
        let mut table = parse_table("N\n10\n9\n100\n").unwrap();
        sort_rows(
            &mut table,
            &with_keys(vec![key("N", SortDirection::Ascending)]),
            &mut RunLog::new(),
        );
        assert_eq!(column(&table, "N"), ["10", "100", "9"]);
    }

    #[test]
    fn test_unknown_key_skipped_others_applied() {
        let mut table = parse_table("A\nb\na\n").unwrap();
        let mut log = RunLog::new();
        let settings = with_keys(vec![
            key("Missing", SortDirection::Ascending),
            key("A", SortDirection::Ascending),
        ]);

        assert_eq!(sort_rows(&mut table, &settings, &mut log), StageStatus::Applied);
        assert_eq!(column(&table, "A"), ["a", "b"]);
        assert_eq!(log.issues_of("missing_column").len(), 1);
    }

    #[test]
    fn test_missing_cells_sort_first_ascending() {
        let mut table = parse_table("A,B\n1,z\n2\n").unwrap();
        sort_rows(
            &mut table,
            &with_keys(vec![key("B", SortDirection::Ascending)]),
            &mut RunLog::new(),
        );
        assert_eq!(column(&table, "A"), ["2", "1"]);
    }

    #[test]
    fn test_empty_sort_order_reported() {
        let mut table = parse_table("A\n1\n").unwrap();
        let mut log = RunLog::new();
        assert_eq!(
            sort_rows(&mut table, &Settings::default(), &mut log),
            StageStatus::Skipped
        );
        assert_eq!(log.issues_of("setting_absent").len(), 1);
    }
}
