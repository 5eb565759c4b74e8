use super::*;

#[test]
fn test_line_map_simple() {
    let source = "line1\nline2\nline3";
    let map = LineMap::build(source);

    assert_eq!(map.line_count(), 3);
    assert_eq!(map.offset_to_position(0, source), Position::new(0, 0));
    assert_eq!(map.offset_to_position(4, source), Position::new(0, 4));
    assert_eq!(map.offset_to_position(6, source), Position::new(1, 0));
    assert_eq!(map.offset_to_position(12, source), Position::new(2, 0));
}

#[test]
fn test_line_map_windows_and_old_mac_line_endings() {
    let source = "a\r\nb\rc";
    let map = LineMap::build(source);

    assert_eq!(map.line_count(), 3);
    assert_eq!(map.line_start(1), Some(3));
    assert_eq!(map.line_start(2), Some(5));
    assert_eq!(map.offset_to_position(5, source), Position::new(2, 0));
}

#[test]
fn test_position_to_offset_roundtrip() {
    let source = "x = 1\ny = x\n";
    let map = LineMap::build(source);

    for offset in [0u32, 2, 4, 6, 10] {
        let pos = map.offset_to_position(offset, source);
        assert_eq!(map.position_to_offset(pos, source), Some(offset));
    }
    assert_eq!(map.position_to_offset(Position::new(9, 0), source), None);
}

#[test]
fn test_position_past_line_end_clamps_to_line() {
    let source = "ab\ncd";
    let map = LineMap::build(source);
    assert_eq!(map.position_to_offset(Position::new(0, 40), source), Some(2));
}

#[test]
fn test_text_span_touches_end() {
    let span = TextSpan::new(4, 7);
    assert!(span.contains(4));
    assert!(!span.contains(7));
    assert!(span.touches(7));
    assert_eq!(span.len(), 3);
    assert_eq!(span.cover(TextSpan::new(1, 5)), TextSpan::new(1, 7));
}
