//! Family storage and search behavior tests.

use crate::db::test_support::setup_temp_db;
use crate::error::AppError;
use crate::models::{Category, Family, UpdateFamilyRequest};
use crate::query::SearchQuery;
use chrono::Duration;

fn family(slug: &str, name: &str, category: Category, description: &str, tags: &[&str]) -> Family {
    let mut family = Family::new(
        slug.to_string(),
        name.to_string(),
        category,
        description.to_string(),
    );
    family.tags = tags.iter().map(|tag| tag.to_string()).collect();
    family.download_url = format!("/files/{}.rfa", slug);
    family.file_size_bytes = 1024;
    family
}

fn query(text: &str, tags: &[&str], page: usize, limit: usize) -> SearchQuery {
    SearchQuery {
        text: text.to_string(),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        page,
        limit,
    }
}

#[test]
fn create_get_delete_lifecycle_keeps_tables_consistent() {
    let (db, _temp) = setup_temp_db();
    let row = family(
        "oak-side-chair",
        "Oak Side Chair",
        Category::Furniture,
        "A parametric oak side chair.",
        &["chair", "oak"],
    );
    db.families.create(&row).expect("create");

    let fetched = db
        .families
        .get("oak-side-chair")
        .expect("get")
        .expect("row");
    assert_eq!(fetched.name, "Oak Side Chair");
    assert_eq!(fetched.category, Category::Furniture);

    let summaries = db.families.list_summaries(None).expect("list");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].slug, "oak-side-chair");

    let deleted = db
        .families
        .delete("oak-side-chair")
        .expect("delete")
        .expect("deleted row");
    assert_eq!(deleted.slug, "oak-side-chair");
    assert!(db.families.get("oak-side-chair").expect("get").is_none());
    assert!(db.families.list_summaries(None).expect("list").is_empty());
}

#[test]
fn duplicate_slug_is_a_conflict() {
    let (db, _temp) = setup_temp_db();
    let row = family("pine-door", "Pine Door", Category::Doors, "", &[]);
    db.families.create(&row).expect("create");

    let again = family("pine-door", "Another Door", Category::Doors, "", &[]);
    let err = db
        .families
        .create(&again)
        .expect_err("duplicate slug must be rejected");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[test]
fn search_total_is_stable_across_pages_and_pages_partition_matches() {
    let (db, _temp) = setup_temp_db();
    let now = chrono::Utc::now();
    for idx in 0..5 {
        let mut row = family(
            &format!("desk-lamp-{}", idx),
            &format!("Desk Lamp {}", idx),
            Category::Lighting,
            "An adjustable desk lamp.",
            &["lamp"],
        );
        row.updated_at = now - Duration::minutes(idx);
        db.families.create(&row).expect("create");
    }
    let unmatched = family("pine-door", "Pine Door", Category::Doors, "", &[]);
    db.families.create(&unmatched).expect("create");

    let mut seen = Vec::new();
    for page in 1..=3 {
        let result = db.families.search(&query("lamp", &[], page, 2)).expect("search");
        assert_eq!(result.total, 5, "total must not depend on page");
        let expected_len = if page == 3 { 1 } else { 2 };
        assert_eq!(result.rows.len(), expected_len);
        seen.extend(result.rows.into_iter().map(|row| row.slug));
    }
    seen.sort();
    let expected: Vec<String> = (0..5).map(|idx| format!("desk-lamp-{}", idx)).collect();
    assert_eq!(seen, expected, "pages must partition the match set");
}

#[test]
fn page_beyond_available_data_yields_empty_rows_with_correct_total() {
    let (db, _temp) = setup_temp_db();
    let row = family(
        "oak-side-chair",
        "Oak Side Chair",
        Category::Furniture,
        "",
        &[],
    );
    db.families.create(&row).expect("create");

    let result = db.families.search(&query("chair", &[], 7, 20)).expect("search");
    assert!(result.rows.is_empty());
    assert_eq!(result.total, 1);
}

#[test]
fn search_is_case_insensitive_over_name_description_and_tags() {
    let (db, _temp) = setup_temp_db();
    let by_name = family(
        "oak-side-chair",
        "Oak CHAIR",
        Category::Furniture,
        "",
        &[],
    );
    let by_description = family(
        "reading-nook",
        "Reading Nook",
        Category::Furniture,
        "Includes a lounge chair.",
        &[],
    );
    let by_tag = family(
        "bar-stool",
        "Bar Stool",
        Category::Furniture,
        "",
        &["Chair"],
    );
    for row in [&by_name, &by_description, &by_tag] {
        db.families.create(row).expect("create");
    }

    let mut baseline: Vec<String> = db
        .families
        .search(&query("chair", &[], 1, 20))
        .expect("search")
        .rows
        .into_iter()
        .map(|row| row.slug)
        .collect();
    baseline.sort();
    assert_eq!(baseline.len(), 3);

    for text in ["CHAIR", "ChAiR"] {
        let mut slugs: Vec<String> = db
            .families
            .search(&query(text, &[], 1, 20))
            .expect("search")
            .rows
            .into_iter()
            .map(|row| row.slug)
            .collect();
        slugs.sort();
        assert_eq!(slugs, baseline, "query text: {}", text);
    }
}

#[test]
fn tag_filter_keeps_rows_sharing_at_least_one_tag() {
    let (db, _temp) = setup_temp_db();
    let shares_one = family(
        "oak-side-chair",
        "Oak Chair",
        Category::Furniture,
        "",
        &["oak", "seating"],
    );
    let shares_none = family(
        "pine-chair",
        "Pine Chair",
        Category::Furniture,
        "",
        &["pine"],
    );
    let also_none = family(
        "steel-chair",
        "Steel Chair",
        Category::Furniture,
        "",
        &[],
    );
    for row in [&shares_one, &shares_none, &also_none] {
        db.families.create(row).expect("create");
    }

    let result = db
        .families
        .search(&query("chair", &["seating", "walnut"], 1, 20))
        .expect("search");
    assert_eq!(result.total, 1);
    assert_eq!(result.rows[0].slug, "oak-side-chair");
}

#[test]
fn search_ordering_is_deterministic_and_prefers_name_matches() {
    let (db, _temp) = setup_temp_db();
    let now = chrono::Utc::now();

    let mut name_hit = family(
        "panel-door",
        "Panel Door",
        Category::Doors,
        "",
        &[],
    );
    name_hit.updated_at = now - Duration::minutes(30);
    let mut tag_hit = family(
        "entry-set",
        "Entry Set",
        Category::Doors,
        "",
        &["door"],
    );
    tag_hit.updated_at = now;
    let mut description_hit = family(
        "hinge-pack",
        "Hinge Pack",
        Category::Doors,
        "Hardware for any door.",
        &[],
    );
    description_hit.updated_at = now;

    for row in [&name_hit, &tag_hit, &description_hit] {
        db.families.create(row).expect("create");
    }

    for _ in 0..3 {
        let slugs: Vec<String> = db
            .families
            .search(&query("door", &[], 1, 20))
            .expect("search")
            .rows
            .into_iter()
            .map(|row| row.slug)
            .collect();
        assert_eq!(slugs, vec!["panel-door", "entry-set", "hinge-pack"]);
    }
}

#[test]
fn two_matches_with_limit_one_paginate_cleanly() {
    let (db, _temp) = setup_temp_db();
    let now = chrono::Utc::now();
    let mut first = family("panel-door", "Panel Door", Category::Doors, "", &[]);
    first.updated_at = now;
    let mut second = family("louver-door", "Louver Door", Category::Doors, "", &[]);
    second.updated_at = now - Duration::minutes(5);
    db.families.create(&first).expect("create");
    db.families.create(&second).expect("create");

    let page_one = db.families.search(&query("door", &[], 1, 1)).expect("search");
    assert_eq!(page_one.total, 2);
    assert_eq!(page_one.rows.len(), 1);
    assert_eq!(page_one.rows[0].slug, "panel-door");

    let page_two = db.families.search(&query("door", &[], 2, 1)).expect("search");
    assert_eq!(page_two.total, 2);
    assert_eq!(page_two.rows.len(), 1);
    assert_eq!(page_two.rows[0].slug, "louver-door");
}

#[test]
fn category_listing_reflects_category_moves() {
    let (db, _temp) = setup_temp_db();
    let row = family("fam-003", "Sliding Panel", Category::Doors, "", &[]);
    db.families.create(&row).expect("create");

    let doors = db
        .families
        .list_summaries(Some(Category::Doors))
        .expect("list doors");
    assert_eq!(doors.len(), 1);

    let update = UpdateFamilyRequest {
        category: Some(Category::Windows),
        ..UpdateFamilyRequest::default()
    };
    let (updated, old_category) = db
        .families
        .update("fam-003", &update)
        .expect("update")
        .expect("row");
    assert_eq!(old_category, Category::Doors);
    assert_eq!(updated.category, Category::Windows);

    let doors_after = db
        .families
        .list_summaries(Some(Category::Doors))
        .expect("list doors");
    assert!(doors_after.is_empty());
    let windows_after = db
        .families
        .list_summaries(Some(Category::Windows))
        .expect("list windows");
    assert_eq!(windows_after.len(), 1);
    assert_eq!(windows_after[0].slug, "fam-003");
}

#[test]
fn listings_order_by_recency_and_updates_move_rows_forward() {
    let (db, _temp) = setup_temp_db();
    let now = chrono::Utc::now();
    let mut older = family("bay-window", "Bay Window", Category::Windows, "", &[]);
    older.updated_at = now - Duration::minutes(10);
    let mut newer = family("casement", "Casement", Category::Windows, "", &[]);
    newer.updated_at = now;
    db.families.create(&older).expect("create");
    db.families.create(&newer).expect("create");

    let summaries = db.families.list_summaries(None).expect("list");
    let slugs: Vec<&str> = summaries.iter().map(|s| s.slug.as_str()).collect();
    assert_eq!(slugs, vec!["casement", "bay-window"]);

    let update = UpdateFamilyRequest {
        description: Some("Refreshed listing copy.".to_string()),
        ..UpdateFamilyRequest::default()
    };
    db.families
        .update("bay-window", &update)
        .expect("update")
        .expect("row");

    let summaries = db.families.list_summaries(None).expect("list");
    let slugs: Vec<&str> = summaries.iter().map(|s| s.slug.as_str()).collect();
    assert_eq!(slugs, vec!["bay-window", "casement"]);
}

#[test]
fn counters_persist_without_reordering_listings() {
    let (db, _temp) = setup_temp_db();
    let now = chrono::Utc::now();
    let mut popular = family("bay-window", "Bay Window", Category::Windows, "", &[]);
    popular.updated_at = now - Duration::minutes(10);
    let mut recent = family("casement", "Casement", Category::Windows, "", &[]);
    recent.updated_at = now;
    db.families.create(&popular).expect("create");
    db.families.create(&recent).expect("create");

    for _ in 0..3 {
        db.families
            .record_download("bay-window")
            .expect("download")
            .expect("row");
    }
    db.families
        .record_view("bay-window")
        .expect("view")
        .expect("row");

    let fetched = db.families.get("bay-window").expect("get").expect("row");
    assert_eq!(fetched.download_count, 3);
    assert_eq!(fetched.view_count, 1);

    let summaries = db.families.list_summaries(None).expect("list");
    let slugs: Vec<&str> = summaries.iter().map(|s| s.slug.as_str()).collect();
    assert_eq!(
        slugs,
        vec!["casement", "bay-window"],
        "counter bumps must not reshuffle recency order"
    );
    assert_eq!(summaries[1].download_count, 3);
}

#[test]
fn missing_rows_surface_as_none_not_errors() {
    let (db, _temp) = setup_temp_db();
    assert!(db.families.get("ghost").expect("get").is_none());
    assert!(db.families.delete("ghost").expect("delete").is_none());
    assert!(db
        .families
        .update("ghost", &UpdateFamilyRequest::default())
        .expect("update")
        .is_none());
    assert!(db.families.record_download("ghost").expect("download").is_none());
}

#[test]
fn first_gallery_image_becomes_the_thumbnail() {
    let (db, _temp) = setup_temp_db();
    let row = family("oak-side-chair", "Oak Chair", Category::Furniture, "", &[]);
    db.families.create(&row).expect("create");

    let (updated, image) = db
        .families
        .add_gallery_image("oak-side-chair", "/media/oak/front.png", None)
        .expect("add image")
        .expect("family");
    assert_eq!(image.position, 0);
    assert_eq!(
        updated.thumbnail_url.as_deref(),
        Some("/media/oak/front.png?w=400&h=300&q=80")
    );

    let (updated, image) = db
        .families
        .add_gallery_image(
            "oak-side-chair",
            "/media/oak/side.png",
            Some("Side view".to_string()),
        )
        .expect("add image")
        .expect("family");
    assert_eq!(image.position, 1);
    assert_eq!(
        updated.thumbnail_url.as_deref(),
        Some("/media/oak/front.png?w=400&h=300&q=80"),
        "later images must not steal the thumbnail"
    );
}

#[test]
fn removing_images_compacts_positions_and_rederives_the_thumbnail() {
    let (db, _temp) = setup_temp_db();
    let row = family("oak-side-chair", "Oak Chair", Category::Furniture, "", &[]);
    db.families.create(&row).expect("create");

    let mut ids = Vec::new();
    for url in ["/media/oak/a.png", "/media/oak/b.png", "/media/oak/c.png"] {
        let (_, image) = db
            .families
            .add_gallery_image("oak-side-chair", url, None)
            .expect("add image")
            .expect("family");
        ids.push(image.id);
    }

    let updated = db
        .families
        .remove_gallery_image("oak-side-chair", &ids[0])
        .expect("remove")
        .expect("family");
    assert_eq!(updated.gallery.len(), 2);
    assert_eq!(updated.gallery[0].url, "/media/oak/b.png");
    assert_eq!(updated.gallery[0].position, 0);
    assert_eq!(updated.gallery[1].position, 1);
    assert_eq!(
        updated.thumbnail_url.as_deref(),
        Some("/media/oak/b.png?w=400&h=300&q=80")
    );

    let err = db
        .families
        .remove_gallery_image("oak-side-chair", "no-such-image")
        .expect_err("unknown image id must be NotFound");
    assert!(matches!(err, AppError::NotFound));

    for id in &ids[1..] {
        db.families
            .remove_gallery_image("oak-side-chair", id)
            .expect("remove")
            .expect("family");
    }
    let emptied = db
        .families
        .get("oak-side-chair")
        .expect("get")
        .expect("row");
    assert!(emptied.gallery.is_empty());
    assert!(emptied.thumbnail_url.is_none());
}
