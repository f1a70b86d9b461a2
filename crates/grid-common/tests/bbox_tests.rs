//! Tests for BoundingBox parsing and containment.

use grid_common::bbox::{BboxParseError, BoundingBox};
use test_utils::extent;

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-180.0, 180.0, -90.0, 90.0);
    assert_eq!(bbox.west, -180.0);
    assert_eq!(bbox.east, 180.0);
    assert_eq!(bbox.south, -90.0);
    assert_eq!(bbox.north, 90.0);
}

#[test]
fn test_bbox_copy() {
    let bbox1 = BoundingBox::new(0.0, 10.0, 0.0, 10.0);
    let bbox2 = bbox1;
    assert_eq!(bbox1, bbox2);
}

#[test]
fn test_from_extent_fixtures() {
    for e in [extent::GLOBAL, extent::PACIFIC, extent::AOD_EXAMPLE, extent::BEYOND_POLE] {
        let bbox = BoundingBox::from_extent(&e).unwrap();
        assert_eq!([bbox.west, bbox.east, bbox.south, bbox.north], e);
    }
}

#[test]
fn test_from_extent_wrong_count() {
    let result = BoundingBox::from_extent(&[0.0, 10.0, 20.0]);
    assert!(matches!(result, Err(BboxParseError::WrongCount(3))));
}

// ============================================================================
// from_extent_string tests
// ============================================================================

#[test]
fn test_parse_extent_integer() {
    let bbox = BoundingBox::from_extent_string("-180,180,-90,90").unwrap();
    assert_eq!(bbox, BoundingBox::new(-180.0, 180.0, -90.0, 90.0));
}

#[test]
fn test_parse_extent_floating() {
    let bbox = BoundingBox::from_extent_string("-125.5,-66.25,24.75,50.125").unwrap();
    assert!((bbox.west - (-125.5)).abs() < 0.001);
    assert!((bbox.east - (-66.25)).abs() < 0.001);
    assert!((bbox.south - 24.75).abs() < 0.001);
    assert!((bbox.north - 50.125).abs() < 0.001);
}

#[test]
fn test_parse_extent_beyond_dateline() {
    let bbox = BoundingBox::from_extent_string("150,240,-30,30").unwrap();
    assert_eq!(bbox.width(), 90.0);
    assert_eq!(bbox.center_lon(), 195.0);
}

#[test]
fn test_parse_extent_invalid_format_too_few() {
    let result = BoundingBox::from_extent_string("0,10,20");
    assert!(matches!(result, Err(BboxParseError::InvalidFormat(_))));
}

#[test]
fn test_parse_extent_invalid_format_too_many() {
    let result = BoundingBox::from_extent_string("0,10,20,30,40");
    assert!(matches!(result, Err(BboxParseError::InvalidFormat(_))));
}

#[test]
fn test_parse_extent_invalid_number() {
    let result = BoundingBox::from_extent_string("0,east,20,30");
    assert!(matches!(result, Err(BboxParseError::InvalidNumber(_))));
}

#[test]
fn test_parse_extent_non_finite() {
    let result = BoundingBox::from_extent_string("0,inf,20,30");
    assert!(matches!(result, Err(BboxParseError::NonFinite)));
}

#[test]
fn test_parse_extent_inverted_longitudes() {
    let result = BoundingBox::from_extent_string("10,0,20,30");
    assert!(matches!(result, Err(BboxParseError::Inverted(_))));
}

// ============================================================================
// Dimension and containment tests
// ============================================================================

#[test]
fn test_dimensions() {
    let bbox = BoundingBox::from_extent(&extent::AOD_EXAMPLE).unwrap();
    assert_eq!(bbox.width(), 360.0);
    assert_eq!(bbox.height(), 160.0);
    assert_eq!(bbox.center_lon(), 60.0);
}

#[test]
fn test_containment_is_inclusive() {
    let bbox = BoundingBox::new(0.0, 10.0, -5.0, 5.0);
    assert!(bbox.contains_point(0.0, -5.0));
    assert!(bbox.contains_point(10.0, 5.0));
    assert!(bbox.contains_point(5.0, 0.0));
    assert!(!bbox.contains_point(10.0001, 0.0));
    assert!(!bbox.contains_point(5.0, 5.0001));
}

#[test]
fn test_containment_does_not_wrap() {
    let bbox = BoundingBox::new(150.0, 240.0, -30.0, 30.0);
    assert!(bbox.contains_lon(200.0));
    // -160 is the same meridian as 200, but matching modulo 360 is the adjuster's job
    assert!(!bbox.contains_lon(-160.0));
}
