// Unit tests for cascade reconstruction and structural metrics.
//
// Builds small cascades from post records (star, chain, root-only, no match)
// and checks depth, scale, max breadth and structural virality against
// hand-computed values.

use ripple::cascade::{build, CascadeError, PostRecord};
use ripple::metrics::structural::{depth, layer_sizes, max_breadth, scale, structural_virality};
use ripple::metrics::summarize;

const SOURCE: &str = "Scientists discover water on a distant exoplanet";

fn post(post_id: i64, user: &str, at: i64, parent: Option<i64>) -> PostRecord {
    PostRecord {
        post_id,
        user_id: user.to_string(),
        content: if parent.is_none() {
            SOURCE.to_string()
        } else {
            String::new()
        },
        created_at: at,
        original_post_id: parent,
    }
}

/// Root plus `arms` direct reposts of the root post.
fn star_records(arms: usize) -> Vec<PostRecord> {
    let mut records = vec![post(1, "root", 100, None)];
    for i in 0..arms {
        records.push(post(2 + i as i64, &format!("fan{i}"), 101 + i as i64, Some(1)));
    }
    records
}

/// root -> u1 -> u2 -> ... each reposting the previous repost.
fn chain_records(len: usize) -> Vec<PostRecord> {
    let mut records = vec![post(1, "root", 100, None)];
    for i in 1..len {
        records.push(post(1 + i as i64, &format!("u{i}"), 100 + i as i64, Some(i as i64)));
    }
    records
}

// ============================================================
// Testable properties from the cascade definitions
// ============================================================

#[test]
fn root_only_cascade() {
    let g = build(&[post(1, "root", 5, None)], SOURCE);
    assert!(g.exists());
    assert_eq!(depth(&g).unwrap(), 0);
    assert_eq!(scale(&g).unwrap(), 1);
    assert_eq!(max_breadth(&g).unwrap(), 0);
    assert_eq!(structural_virality(&g).unwrap(), 0.0);
}

#[test]
fn star_cascade() {
    let g = build(&star_records(5), SOURCE);
    assert_eq!(depth(&g).unwrap(), 1);
    assert_eq!(scale(&g).unwrap(), 6);
    assert_eq!(max_breadth(&g).unwrap(), 5);
    // 5 root-leaf pairs at 1, 10 leaf-leaf pairs at 2: 25 / 15
    let sv = structural_virality(&g).unwrap();
    assert!((sv - 25.0 / 15.0).abs() < 1e-9, "got {sv}");
}

#[test]
fn chain_cascade() {
    let g = build(&chain_records(4), SOURCE);
    assert_eq!(depth(&g).unwrap(), 3);
    assert_eq!(scale(&g).unwrap(), 4);
    assert_eq!(max_breadth(&g).unwrap(), 1);
    let sv = structural_virality(&g).unwrap();
    assert!((sv - 10.0 / 6.0).abs() < 1e-9, "got {sv}");
}

#[test]
fn chain_is_more_viral_than_star_of_equal_scale() {
    let chain = build(&chain_records(4), SOURCE);
    let star = build(&star_records(3), SOURCE);
    assert_eq!(scale(&chain).unwrap(), scale(&star).unwrap());
    assert!(structural_virality(&chain).unwrap() > structural_virality(&star).unwrap());
}

#[test]
fn no_matching_root_is_not_found() {
    let records = vec![PostRecord {
        post_id: 1,
        user_id: "x".to_string(),
        content: "Completely unrelated".to_string(),
        created_at: 0,
        original_post_id: None,
    }];
    let g = build(&records, SOURCE);
    assert!(!g.exists());
    let err = depth(&g).unwrap_err();
    assert_eq!(
        err,
        CascadeError::NotFound {
            source_prefix: "Scientists".to_string()
        }
    );
    assert!(summarize(&g).is_err());
}

#[test]
fn empty_input_is_not_found() {
    let g = build(&[], SOURCE);
    assert!(!g.exists());
    assert!(scale(&g).is_err());
    assert!(max_breadth(&g).is_err());
    assert!(structural_virality(&g).is_err());
}

#[test]
fn bounds_hold_for_mixed_cascade() {
    // Two levels: root -> a, b, c; a -> d, e; e -> f
    let records = vec![
        post(1, "root", 0, None),
        post(2, "a", 1, Some(1)),
        post(3, "b", 2, Some(1)),
        post(4, "c", 2, Some(1)),
        post(5, "d", 3, Some(2)),
        post(6, "e", 4, Some(2)),
        post(7, "f", 6, Some(6)),
    ];
    let g = build(&records, SOURCE);
    let m = summarize(&g).unwrap();
    assert_eq!(m.depth, 3);
    assert_eq!(m.scale, 7);
    assert_eq!(m.max_breadth, 3);
    assert!(m.max_breadth <= m.scale - 1);
    assert_eq!(layer_sizes(&g).unwrap(), vec![1, 3, 2, 1]);
    assert!(m.structural_virality.is_some());
}

// ============================================================
// Reconstruction edge cases
// ============================================================

#[test]
fn quote_of_a_quote_links_through_the_intermediate_author() {
    let records = vec![
        post(1, "root", 0, None),
        post(2, "a", 1, Some(1)),
        post(3, "b", 2, Some(2)),
    ];
    let g = build(&records, SOURCE);
    let edges: Vec<(String, String)> = g
        .edges()
        .map(|e| (e.influencer, e.resharer))
        .collect();
    assert_eq!(
        edges,
        vec![
            ("a".to_string(), "b".to_string()),
            ("root".to_string(), "a".to_string()),
        ]
    );
}

#[test]
fn repeated_reposts_between_same_users_count_once() {
    let records = vec![
        post(1, "root", 0, None),
        post(2, "a", 1, Some(1)),
        post(3, "a", 5, Some(1)),
        post(4, "a", 9, Some(1)),
    ];
    let g = build(&records, SOURCE);
    assert_eq!(g.edge_count(), 1);
    assert_eq!(max_breadth(&g).unwrap(), 1);
}

#[test]
fn unrelated_cascade_in_same_snapshot_disconnects_virality() {
    // A second original post (not the source) with its own repost
    let mut records = star_records(2);
    records.push(PostRecord {
        post_id: 50,
        user_id: "other".to_string(),
        content: "Something else entirely".to_string(),
        created_at: 101,
        original_post_id: None,
    });
    records.push(post(51, "other_fan", 102, Some(50)));

    let g = build(&records, SOURCE);
    assert_eq!(scale(&g).unwrap(), 5);
    assert_eq!(depth(&g).unwrap(), 1);
    assert_eq!(
        structural_virality(&g),
        Err(CascadeError::Disconnected {
            cutoff: None,
            components: 2
        })
    );

    let m = summarize(&g).unwrap();
    assert_eq!(m.structural_virality, None);
    assert_eq!(m.max_breadth, 2);
}

#[test]
fn dangling_reposts_are_reported() {
    let mut records = star_records(1);
    records.push(post(9, "lost", 104, Some(404)));
    records.push(post(10, "lost2", 105, Some(405)));
    let g = build(&records, SOURCE);
    assert_eq!(g.skipped_records(), 2);
    assert_eq!(scale(&g).unwrap(), 2);
}
