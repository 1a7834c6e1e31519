use versa_tools::page_plan::{PagePlan, PageRange, is_valid_expression};

fn pages(plan: &PagePlan) -> Vec<u32> {
    plan.ranges.iter().map(|r| r.start_page).collect()
}

#[test]
fn empty_expression_explodes_every_page() {
    let plan = PagePlan::parse("   ", 4);
    assert_eq!(pages(&plan), vec![1, 2, 3, 4]);
    assert!(plan.ranges.iter().all(|r| r.start_page == r.end_page));
}

#[test]
fn mixed_tokens_expand_in_token_order() {
    let plan = PagePlan::parse("8-10, 1-3,5", 10);
    assert_eq!(pages(&plan), vec![8, 9, 10, 1, 2, 3, 5]);
}

#[test]
fn reversed_range_is_swapped() {
    let plan = PagePlan::parse("5-3", 10);
    assert_eq!(pages(&plan), vec![3, 4, 5]);
}

#[test]
fn range_end_is_clamped_and_out_of_range_tokens_dropped() {
    let plan = PagePlan::parse("8-20,12,0,3,20-30", 10);
    assert_eq!(pages(&plan), vec![8, 9, 10, 3]);
    for r in &plan.ranges {
        assert!(1 <= r.start_page && r.start_page <= r.end_page && r.end_page <= 10);
    }
}

#[test]
fn all_tokens_out_of_range_gives_empty_plan() {
    assert!(PagePlan::parse("11,15-20", 10).is_empty());
}

#[test]
fn expression_charset() {
    assert!(is_valid_expression("1-3, 5,8-10"));
    assert!(is_valid_expression(""));
    assert!(!is_valid_expression("1;2"));
    assert!(!is_valid_expression("first"));
}

#[test]
fn single_range_pages() {
    assert_eq!(PageRange::single(7).pages().collect::<Vec<_>>(), vec![7]);
}
