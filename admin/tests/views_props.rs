//! Property tests for the derived views

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use freekick_admin::record::Record;
use freekick_admin::views::{
    SortDirection, SortKind, SortState, TableFilter, TableQuery, paginate, project_segments,
    total_pages,
};
use proptest::prelude::*;

fn arb_records() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec((-1000i64..1000, "[a-z]{0,6}"), 0..40).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(id, (amount, name))| {
                Record::new(i64::try_from(id).unwrap())
                    .with("amount", amount)
                    .with("name", name)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_chart_percentages_stay_near_one_hundred(count in 1usize..60) {
        let segments = project_segments(count);
        prop_assert_eq!(segments.len(), count);

        // Each share rounds by at most half a point
        let sum: u32 = segments.iter().map(|s| s.percentage).sum();
        let drift = u32::try_from(count).unwrap().div_ceil(2);
        prop_assert!(sum.abs_diff(100) <= drift, "sum {} drifts more than {}", sum, drift);

        for pair in segments.windows(2) {
            prop_assert!(pair[0].rotation <= pair[1].rotation);
            prop_assert!(pair[0].weight >= pair[1].weight);
        }
    }

    #[test]
    fn prop_pages_partition_the_rows(len in 0usize..200, page_size in 1usize..25) {
        let items: Vec<usize> = (0..len).collect();
        let pages = total_pages(len, page_size);

        let joined: Vec<usize> = (1..=pages)
            .flat_map(|page| paginate(&items, page, page_size).iter().copied())
            .collect();
        prop_assert_eq!(joined, items.clone());
        prop_assert!(paginate(&items, pages + 1, page_size).is_empty());

        for page in 1..=pages {
            let rows = paginate(&items, page, page_size);
            prop_assert!(!rows.is_empty());
            prop_assert!(rows.len() <= page_size);
        }
    }

    #[test]
    fn prop_numeric_sort_orders_and_keeps_rows(records in arb_records()) {
        let sort = SortState::by("amount").with_kind(SortKind::Numeric);
        let mut rows: Vec<&Record> = records.iter().collect();
        sort.sort(&mut rows);

        prop_assert_eq!(rows.len(), records.len());
        let amounts: Vec<i64> = rows
            .iter()
            .map(|r| r.field("amount").and_then(serde_json::Value::as_i64).unwrap())
            .collect();
        prop_assert!(amounts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn prop_selecting_the_same_key_twice_restores_direction(key in "[a-z_]{1,12}", clicks in 1usize..6) {
        let mut sort = SortState::default();
        sort.select(&key);
        let before = sort.clone();

        for _ in 0..clicks {
            sort.select(&key);
        }

        let expected = if clicks % 2 == 0 {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        };
        prop_assert_eq!(sort.direction, expected);
        prop_assert_eq!(sort.key, before.key);
    }

    #[test]
    fn prop_query_totals_match_filter(records in arb_records(), term in "[a-z]{0,2}", page in 1usize..6) {
        let filter = TableFilter::new().with_search(&term, ["name"]);
        let matching = records.iter().filter(|r| filter.matches(r)).count();

        let query = TableQuery {
            filter,
            page,
            page_size: 5,
            ..TableQuery::default()
        };
        let result = query.apply(&records);

        prop_assert_eq!(result.total, matching);
        prop_assert_eq!(result.total_pages, total_pages(matching, 5));
        prop_assert!(result.rows.len() <= 5);
    }
}
