use super::*;

#[test]
fn empty_quadrant_stays_put() {
    let mut scroller = QuadrantScroller::new();
    assert_eq!(scroller.advance(0, |_| false), None);
    assert_eq!(scroller.index(), 0);
}

#[test]
fn picks_first_hidden_card_after_current() {
    let mut scroller = QuadrantScroller::new();
    // Cards 0..=2 on screen, 3 and 4 below the fold.
    assert_eq!(scroller.advance(5, |idx| idx < 3), Some(3));
    assert_eq!(scroller.advance(5, |idx| idx == 3 || idx == 2), Some(4));
}

#[test]
fn wraps_around_to_hidden_card_before_current() {
    let mut scroller = QuadrantScroller::new();
    scroller.advance(4, |idx| idx != 3);
    assert_eq!(scroller.index(), 3);
    assert_eq!(scroller.advance(4, |idx| idx != 0), Some(0));
}

#[test]
fn steps_to_next_when_everything_visible() {
    let mut scroller = QuadrantScroller::new();
    assert_eq!(scroller.advance(3, |_| true), Some(1));
    assert_eq!(scroller.advance(3, |_| true), Some(2));
    assert_eq!(scroller.advance(3, |_| true), Some(0));
}

#[test]
fn shrinking_quadrant_keeps_index_in_range() {
    let mut scroller = QuadrantScroller::new();
    scroller.advance(10, |idx| idx != 8);
    assert_eq!(scroller.index(), 8);
    let next = scroller.advance(3, |_| true).expect("non-empty");
    assert!(next < 3);
}

#[test]
fn reset_returns_to_top() {
    let mut scroller = QuadrantScroller::new();
    scroller.advance(3, |_| true);
    scroller.reset();
    assert_eq!(scroller.index(), 0);
}
