use sourcelocation::{
    Diff, FileDiff, FileHunk, FileLine, FileLineSet, FileLocation, FileLocationRange,
    FileLocationRangeSet, Hunk, HunkLine, Location, LocationRange, RelativeLocation,
    SourceLocationError,
};
use std::cmp::Ordering;

fn loc(line: usize, column: usize) -> Location {
    Location::new(line, column).expect("valid location")
}

fn range(start: (usize, usize), stop: (usize, usize)) -> LocationRange {
    LocationRange::new(loc(start.0, start.1), loc(stop.0, stop.1)).expect("valid range")
}

#[test]
fn test_location_construction() {
    for line in 1..5 {
        for column in 0..5 {
            assert!(Location::new(line, column).is_ok());
        }
    }
    assert_eq!(Location::new(0, 0), Err(SourceLocationError::InvalidLine(0)));
}

#[test]
fn test_range_construction() {
    let points = [loc(1, 0), loc(1, 4), loc(2, 0), loc(3, 7)];
    for a in points {
        for b in points {
            assert_eq!(LocationRange::new(a, b).is_ok(), a <= b, "{a} {b}");
        }
    }
}

#[test]
fn test_ordering_is_total() {
    let points = [loc(1, 0), loc(1, 4), loc(2, 0), loc(2, 0), loc(3, 7)];
    for x in points {
        for y in points {
            let relations = [x < y, x == y, x > y];
            assert_eq!(relations.iter().filter(|held| **held).count(), 1);
        }
    }

    let a = FileLocationRange::new("a.py", range((1, 0), (1, 5))).unwrap();
    let b = FileLocationRange::new("a.py", range((1, 0), (1, 6))).unwrap();
    let c = FileLocationRange::new("b.py", range((1, 0), (1, 1))).unwrap();
    assert_eq!(a.cmp(&b), Ordering::Less);
    assert_eq!(c.cmp(&a), Ordering::Greater);

    let mut lines = vec![
        FileLine::new("b.py", 1).unwrap(),
        FileLine::new("a.py", 10).unwrap(),
        FileLine::new("a.py", 2).unwrap(),
    ];
    lines.sort();
    let sorted: Vec<String> = lines.iter().map(ToString::to_string).collect();
    assert_eq!(sorted, vec!["a.py:2", "a.py:10", "b.py:1"]);
}

#[test]
fn test_containment_and_overlap() {
    let r = range((1, 0), (1, 5));
    assert!(r.contains(loc(1, 3)));
    assert!(!r.contains(loc(1, 5)));
    assert!(!r.contains(loc(2, 0)));

    assert!(r.overlaps(&range((1, 3), (1, 8))));
    assert!(!r.overlaps(&range((1, 5), (1, 9))));
}

#[test]
fn test_relative_location() {
    let relative = loc(10, 4).with_relative_location(loc(8, 0)).unwrap();
    assert_eq!((relative.line(), relative.column()), (2, 4));

    let relative = loc(8, 4).with_relative_location(loc(8, 2)).unwrap();
    assert_eq!((relative.line(), relative.column()), (0, 2));

    let file_location = FileLocation::new("a.py", loc(10, 4)).unwrap();
    let relative = file_location.with_relative_location(loc(8, 0)).unwrap();
    assert_eq!(relative.filename(), "a.py");
}

#[test]
fn test_file_line_set_to_dict_is_sorted() {
    let mut set = FileLineSet::new();
    for line in [5, 1, 3] {
        set.add(FileLine::new("a.py", line).unwrap());
    }
    assert_eq!(
        serde_json::to_value(&set).unwrap(),
        serde_json::json!({ "a.py": [1, 3, 5] })
    );

    let decoded: FileLineSet =
        serde_json::from_value(serde_json::json!({ "a.py": [3, 1, 3] })).unwrap();
    assert_eq!(decoded.to_dict()["a.py"], vec![1, 3]);
    assert!(serde_json::from_value::<FileLineSet>(serde_json::json!({ "a.py": [0] })).is_err());
}

#[test]
fn test_hunk_count_mismatch() {
    let lines = vec![
        HunkLine::Deleted("old".to_string()),
        HunkLine::Inserted("new".to_string()),
    ];
    assert!(matches!(
        Hunk::new(1, 1, 1, 2, lines),
        Err(SourceLocationError::HunkLineCount { declared: 2, actual: 1, .. })
    ));
}

#[test]
fn test_file_diff_from_hunks_orders_by_old_start() {
    let hunks = [10, 3].map(|start| {
        let hunk = Hunk::from_sides(start, ["x"], start, ["y"]).unwrap();
        FileHunk::new("a.py", hunk).unwrap()
    });
    let diff = FileDiff::from_hunks(hunks).unwrap();
    let starts: Vec<usize> = diff.hunks().iter().map(Hunk::old_start_line).collect();
    assert_eq!(starts, vec![3, 10]);
}

#[test]
fn test_diff_from_hunks_keeps_first_occurrence_order() {
    let hunks = [("b.py", 30), ("a.py", 5), ("b.py", 7)].map(|(filename, start)| {
        let hunk = Hunk::from_sides(start, ["x"], start, ["y"]).unwrap();
        FileHunk::new(filename, hunk).unwrap()
    });
    let diff = Diff::from_hunks(hunks).unwrap();

    assert_eq!(diff.files(), vec!["b.py", "a.py"]);
    let b_starts: Vec<usize> = diff.file_diffs()[0]
        .hunks()
        .iter()
        .map(Hunk::old_start_line)
        .collect();
    assert_eq!(b_starts, vec![7, 30]);
}

#[test]
fn test_range_set_add_is_idempotent() {
    let x = FileLocationRange::new("a.py", range((2, 0), (2, 4))).unwrap();
    let mut twice = FileLocationRangeSet::new();
    twice.add(x.clone());
    twice.add(x.clone());

    let mut once = FileLocationRangeSet::new();
    once.add(x.clone());

    assert_eq!(twice, once);
    assert_eq!(twice.iter().filter(|r| *r == x).count(), 1);
}

#[test]
fn test_textual_encodings_roundtrip() {
    let location = loc(12, 3);
    assert_eq!(location.to_string().parse::<Location>(), Ok(location));

    let r = range((1, 2), (4, 0));
    assert_eq!(r.to_string().parse::<LocationRange>(), Ok(r));

    let line = FileLine::new("dir/a.py", 9).unwrap();
    assert_eq!(line.to_string().parse::<FileLine>(), Ok(line));

    let file_location = FileLocation::new("dir/a.py", location).unwrap();
    assert_eq!(file_location.to_string().parse::<FileLocation>(), Ok(file_location));

    let file_range = FileLocationRange::new("dir/a.py", r).unwrap();
    let json = serde_json::to_string(&file_range).unwrap();
    assert_eq!(serde_json::from_str::<FileLocationRange>(&json).unwrap(), file_range);
}
