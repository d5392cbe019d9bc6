use super::*;
use crate::migration_id::MigrationId;

fn sorted(ids: &[&str]) -> Vec<String> {
    let mut ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
    ids.sort_by(|a, b| compare_ids(a, b));
    ids
}

#[test]
fn test_numeric_prefix_compares_by_value() {
    assert_eq!(compare_ids("2_b.sql", "10_a.sql"), Ordering::Less);
    assert_eq!(compare_ids("10_a.sql", "2_b.sql"), Ordering::Greater);
}

#[test]
fn test_zero_padding_does_not_matter() {
    assert_eq!(
        sorted(&["010_c.sql", "2_b.sql", "001_a.sql"]),
        vec!["001_a.sql", "2_b.sql", "010_c.sql"]
    );
}

#[test]
fn test_same_number_falls_back_to_string_order() {
    assert_eq!(compare_ids("1_a.sql", "1_b.sql"), Ordering::Less);
    // Same numeric value, different padding: still a strict order
    assert_eq!(compare_ids("01_a.sql", "1_a.sql"), Ordering::Less);
}

#[test]
fn test_numbered_before_unnumbered() {
    assert_eq!(compare_ids("999_z.sql", "init.sql"), Ordering::Less);
    assert_eq!(compare_ids("init.sql", "1_a.sql"), Ordering::Greater);
}

#[test]
fn test_unnumbered_use_lexicographic_order() {
    assert_eq!(
        sorted(&["users.sql", "accounts.sql", "orders.sql"]),
        vec!["accounts.sql", "orders.sql", "users.sql"]
    );
}

#[test]
fn test_timestamp_prefixes() {
    assert_eq!(
        sorted(&[
            "20240301120000_add_index.sql",
            "20231231235959_init.sql",
            "20240101000000_users.sql",
        ]),
        vec![
            "20231231235959_init.sql",
            "20240101000000_users.sql",
            "20240301120000_add_index.sql",
        ]
    );
}

#[test]
fn test_huge_numbers_do_not_overflow() {
    let big = "123456789012345678901234567890123456789_a.sql";
    let bigger = "923456789012345678901234567890123456789_a.sql";
    assert_eq!(compare_ids(big, bigger), Ordering::Less);
    assert_eq!(compare_ids(bigger, "5_a.sql"), Ordering::Greater);
}

#[test]
fn test_equal_ids_are_equal() {
    assert_eq!(compare_ids("001_init.sql", "001_init.sql"), Ordering::Equal);
}

#[test]
fn test_sort_migrations_by_id() {
    let mut migrations = vec![
        Migration::new(MigrationId::new("3_c.sql"), vec![]),
        Migration::new(MigrationId::new("1_a.sql"), vec![]),
        Migration::new(MigrationId::new("2_b.sql"), vec![]),
    ];
    sort_migrations(&mut migrations);
    let ids: Vec<&str> = migrations.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["1_a.sql", "2_b.sql", "3_c.sql"]);
}
